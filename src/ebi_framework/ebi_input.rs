use anyhow::{Context, Result, anyhow};
use clap::{ArgMatches, builder::ValueParser, value_parser};
use std::{fmt::Display, fs::File, io::BufRead, path::PathBuf};
use strum_macros::EnumIter;

use super::{
    ebi_file_handler::{EBI_FILE_HANDLERS, EbiFileHandler},
    ebi_trait::{EbiTrait, FromEbiTraitObject},
    ebi_trait_object::EbiTraitObject,
};
use crate::{
    ebi_objects::{
        accepting_petri_net::AcceptingPetriNet,
        event_log_csv::{DEFAULT_ACTIVITY_COLUMN, DEFAULT_CASE_COLUMN},
    },
    ebi_traits::ebi_trait_event_log::EbiTraitEventLog,
    multiple_reader::MultipleReader,
};

pub const ARG_ID_CASE_COLUMN: &str = "case-column";
pub const ARG_ID_ACTIVITY_COLUMN: &str = "activity-column";

pub enum EbiInput {
    Trait(EbiTraitObject, &'static EbiFileHandler),
    File(MultipleReader),
    Strings(Vec<String>),
}

impl EbiInput {
    pub fn to_type<T: FromEbiTraitObject + ?Sized>(self) -> Result<Box<T>> {
        FromEbiTraitObject::from_trait_object(self)
    }

    pub fn get_type(&self) -> EbiInputType {
        match self {
            EbiInput::Trait(t, _) => EbiInputType::Trait(t.get_trait()),
            EbiInput::File(_) => EbiInputType::AnyFile,
            EbiInput::Strings(_) => EbiInputType::Strings,
        }
    }
}

#[derive(PartialEq, Eq, EnumIter, Clone, Copy, Debug)]
pub enum EbiInputType {
    Trait(EbiTrait),

    /// A file that is not parsed, such that the command can decide how to read it.
    AnyFile,

    /// Zero or more texts.
    Strings,
}

impl EbiInputType {
    pub fn get_article(&self) -> &str {
        match self {
            EbiInputType::Trait(t) => t.get_article(),
            EbiInputType::AnyFile => "a",
            EbiInputType::Strings => "",
        }
    }

    pub fn get_parser_of_list(input_types: &[&EbiInputType]) -> ValueParser {
        match input_types[0] {
            EbiInputType::Trait(_) | EbiInputType::AnyFile => value_parser!(PathBuf),
            EbiInputType::Strings => value_parser!(String).into(),
        }
    }

    pub fn takes_multiple_values(input_types: &[&EbiInputType]) -> bool {
        input_types
            .iter()
            .any(|input_type| input_type == &&EbiInputType::Strings)
    }

    pub fn get_possible_inputs(input_types: &[&EbiInputType]) -> Vec<String> {
        let mut result = vec![];
        for input_type in input_types {
            match input_type {
                EbiInputType::Trait(t) => {
                    result.extend(Self::show_file_handlers(t.get_file_handlers()))
                }
                EbiInputType::AnyFile => {
                    result.extend(Self::show_file_handlers(EBI_FILE_HANDLERS.iter().collect()))
                }
                EbiInputType::Strings => result.push("any number of texts".to_string()),
            }
        }
        result.dedup();
        result
    }

    pub fn possible_inputs_as_strings_with_articles(
        input_types: &[&EbiInputType],
        last_connector: &str,
    ) -> String {
        let mut list = Self::get_possible_inputs(input_types);
        match list.len() {
            0 => String::new(),
            1 => list.remove(0),
            _ => {
                let last = list.remove(list.len() - 1);
                format!("{} {} {}", list.join(", "), last_connector, last)
            }
        }
    }

    pub fn show_file_handlers(file_handlers: Vec<&'static EbiFileHandler>) -> Vec<String> {
        file_handlers
            .iter()
            .map(|file_handler| format!("{} {}", file_handler.get_article(), file_handler))
            .collect()
    }
}

impl Display for EbiInputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EbiInputType::Trait(t) => write!(f, "{}", t),
            EbiInputType::AnyFile => write!(f, "file"),
            EbiInputType::Strings => write!(f, "texts"),
        }
    }
}

/// Settings for importers that cannot be derived from the file itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImporterParameters {
    pub case_column: String,
    pub activity_column: String,
}

impl ImporterParameters {
    /// Gets the parameters from the command line, appended with defaults.
    pub fn from_cli(cli_matches: Option<&ArgMatches>) -> Self {
        let mut result = Self::default();
        if let Some(cli_matches) = cli_matches {
            if let Some(case_column) = cli_matches
                .try_get_one::<String>(ARG_ID_CASE_COLUMN)
                .ok()
                .flatten()
            {
                result.case_column = case_column.clone();
            }
            if let Some(activity_column) = cli_matches
                .try_get_one::<String>(ARG_ID_ACTIVITY_COLUMN)
                .ok()
                .flatten()
            {
                result.activity_column = activity_column.clone();
            }
        }
        result
    }
}

impl Default for ImporterParameters {
    fn default() -> Self {
        Self {
            case_column: DEFAULT_CASE_COLUMN.to_string(),
            activity_column: DEFAULT_ACTIVITY_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum EbiTraitImporter {
    AcceptingPetriNet(fn(&mut dyn BufRead, &ImporterParameters) -> Result<AcceptingPetriNet>),
    EventLog(fn(&mut dyn BufRead, &ImporterParameters) -> Result<Box<dyn EbiTraitEventLog>>),
}

impl EbiTraitImporter {
    pub fn get_trait(&self) -> EbiTrait {
        match self {
            EbiTraitImporter::AcceptingPetriNet(_) => EbiTrait::AcceptingPetriNet,
            EbiTraitImporter::EventLog(_) => EbiTrait::EventLog,
        }
    }

    pub fn import(
        &self,
        reader: &mut dyn BufRead,
        parameters: &ImporterParameters,
    ) -> Result<EbiTraitObject> {
        Ok(match self {
            EbiTraitImporter::AcceptingPetriNet(f) => {
                EbiTraitObject::AcceptingPetriNet((f)(reader, parameters)?)
            }
            EbiTraitImporter::EventLog(f) => EbiTraitObject::EventLog((f)(reader, parameters)?),
        })
    }
}

impl Display for EbiTraitImporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get_trait())
    }
}

pub fn get_reader_file(from_file: &PathBuf) -> Result<MultipleReader> {
    if from_file.as_os_str() == "-" {
        MultipleReader::from_stdin()
    } else {
        let file = File::open(from_file)
            .with_context(|| format!("could not read file `{}`", from_file.display()))?;
        Ok(MultipleReader::from_file(file))
    }
}

pub fn get_reader(cli_matches: &ArgMatches, cli_id: &str) -> Result<MultipleReader> {
    match cli_matches.try_get_one::<PathBuf>(cli_id)? {
        Some(from_file) => get_reader_file(from_file),
        None => Err(anyhow!(
            "no argument given, or it could not be parsed as a path"
        )),
    }
}

/**
 * Attempts every importer of every file handler that yields the requested trait, in order.
 * Returns the error of the last attempt if none succeeds.
 */
pub fn read_as_trait(
    etrait: &EbiTrait,
    reader: &mut MultipleReader,
    parameters: &ImporterParameters,
) -> Result<(EbiTraitObject, &'static EbiFileHandler)> {
    let mut error = None;
    for file_handler in EBI_FILE_HANDLERS {
        for importer in file_handler.trait_importers {
            if &importer.get_trait() == etrait {
                log::debug!("attempting to read as {}", file_handler);
                match importer
                    .import(reader.get()?.as_mut(), parameters)
                    .with_context(|| format!("the last attempted importer was {}", file_handler))
                {
                    Ok(object) => return Ok((object, file_handler)),
                    Err(err) => error = Some(err),
                }
            }
        }
    }
    Err(error
        .unwrap_or_else(|| anyhow!("no importer is available for {}", etrait))
        .context(format!(
            "attempting to parse file as either {}; if you know the type of your file, use `validate` to check it",
            EbiInputType::show_file_handlers(etrait.get_file_handlers()).join(", ")
        )))
}

pub fn validate_object_of(
    reader: &mut MultipleReader,
    file_handler: &EbiFileHandler,
) -> Result<()> {
    (file_handler.validator)(reader.get()?.as_mut())
}

#[cfg(test)]
mod tests {
    use std::{
        fs::{self, File},
        path::PathBuf,
    };

    use strum::IntoEnumIterator;

    use super::{
        EbiInputType, ImporterParameters, get_reader_file, read_as_trait, validate_object_of,
    };
    use crate::{
        ebi_framework::{
            ebi_file_handler::EBI_FILE_HANDLERS, ebi_trait::EbiTrait,
            ebi_trait_object::EbiTraitObject,
        },
        multiple_reader::MultipleReader,
    };

    #[test]
    fn input_types() {
        for input_type in EbiInputType::iter() {
            let list = vec![&input_type];
            input_type.get_article();
            EbiInputType::get_parser_of_list(&list);
            input_type.to_string();
            assert!(!EbiInputType::get_possible_inputs(&list).is_empty());
            EbiInputType::possible_inputs_as_strings_with_articles(&list, "or");
        }
    }

    #[test]
    fn validators() {
        for file_handler in EBI_FILE_HANDLERS {
            let files = fs::read_dir("./testfiles").unwrap();
            for path in files {
                let file = path.unwrap();
                let name = file.file_name().into_string().unwrap();
                println!("file {} with file handler {}", name, file_handler);

                let mut reader = MultipleReader::from_file(File::open(file.path()).unwrap());

                if !name.contains("malformed")
                    && name.ends_with(&(".".to_string() + file_handler.file_extension))
                {
                    //file handler should be able to accept this file
                    assert!(validate_object_of(&mut reader, file_handler).is_ok());
                } else {
                    //file handler should not accept this file
                    assert!(validate_object_of(&mut reader, file_handler).is_err());
                }
            }
        }
    }

    #[test]
    fn read_log_as_trait() {
        let mut reader = get_reader_file(&PathBuf::from("testfiles/log.csv")).unwrap();
        let (object, file_handler) = read_as_trait(
            &EbiTrait::EventLog,
            &mut reader,
            &ImporterParameters::default(),
        )
        .unwrap();

        assert_eq!(file_handler.file_extension, "csv");
        match object {
            EbiTraitObject::EventLog(log) => assert_eq!(log.get_number_of_traces(), 3),
            _ => panic!("not an event log"),
        }
    }

    #[test]
    fn read_net_as_log_fails() {
        let mut reader = get_reader_file(&PathBuf::from("testfiles/a.apnet")).unwrap();
        assert!(
            read_as_trait(
                &EbiTrait::EventLog,
                &mut reader,
                &ImporterParameters::default()
            )
            .is_err()
        );
    }
}
