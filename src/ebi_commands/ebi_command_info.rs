use anyhow::anyhow;
use std::io::Write;

use crate::ebi_framework::{
    ebi_command::EbiCommand,
    ebi_input::{EbiInput, EbiInputType},
    ebi_output::{EbiOutput, EbiOutputType},
    ebi_trait::EbiTrait,
    infoable::Infoable,
};

pub const EBI_INFO: EbiCommand = EbiCommand::Command {
    name_short: "info",
    name_long: Some("information"),
    explanation_short: "Show information about a model or an event log.",
    explanation_long: None,
    cli_command: None,
    input_types: &[&[
        &EbiInputType::Trait(EbiTrait::AcceptingPetriNet),
        &EbiInputType::Trait(EbiTrait::EventLog),
    ]],
    input_names: &["FILE"],
    input_helps: &["A model or an event log."],
    execute: |mut inputs, _| {
        if let EbiInput::Trait(object, file_handler) = inputs.remove(0) {
            let mut f = vec![];

            writeln!(
                f,
                "File was recognised as {} {} (.{}).",
                file_handler.get_article(),
                file_handler.name,
                file_handler.file_extension
            )?;

            //object-specific info
            object.info(&mut f)?;

            //show applicable commands
            let etrait = object.get_trait();
            let paths = etrait
                .get_applicable_commands()
                .iter()
                .map(|path| EbiCommand::path_to_string(path))
                .collect::<Vec<_>>();
            writeln!(f, "As {} {}, it can be used in:", etrait.get_article(), etrait)?;
            writeln!(f, "\t{}", paths.join("\n\t"))?;

            return Ok(EbiOutput::String(String::from_utf8(f)?));
        }

        Err(anyhow!("input is not a model or an event log"))
    },
    output_type: &EbiOutputType::String,
};

#[cfg(test)]
mod tests {
    use std::fs::File;

    use crate::{
        ebi_framework::{
            ebi_command::EbiCommand,
            ebi_input::{self, EbiInput, ImporterParameters},
            ebi_output::EbiOutput,
            ebi_trait::EbiTrait,
        },
        multiple_reader::MultipleReader,
    };

    use super::EBI_INFO;

    fn info_of(file: &str, etrait: EbiTrait) -> String {
        let mut reader = MultipleReader::from_file(File::open(file).unwrap());
        let (object, file_handler) =
            ebi_input::read_as_trait(&etrait, &mut reader, &ImporterParameters::default()).unwrap();

        if let EbiCommand::Command { execute, .. } = EBI_INFO {
            match (execute)(vec![EbiInput::Trait(object, file_handler)], None).unwrap() {
                EbiOutput::String(s) => s,
                _ => panic!("info should return text"),
            }
        } else {
            panic!("info is a command")
        }
    }

    #[test]
    fn info_net() {
        let info = info_of("testfiles/a-b-tau.apnet", EbiTrait::AcceptingPetriNet);
        assert!(info.contains("accepting Petri net (.apnet)"));
        assert!(info.contains("ebi-align align log"));
    }

    #[test]
    fn info_log() {
        let info = info_of("testfiles/log.csv", EbiTrait::EventLog);
        assert!(info.contains("(.csv)"));
        assert!(info.contains("Number of traces"));
    }
}
