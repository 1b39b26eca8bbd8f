use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    collections::BTreeSet,
    fmt::{Debug, Display},
    hash::Hash,
    path::PathBuf,
};

use crate::ebi_commands::{ebi_command_align, ebi_command_info, ebi_command_validate};

use super::{
    ebi_input::{self, EbiInput, EbiInputType, ImporterParameters},
    ebi_output::{self, EbiExporter, EbiOutput, EbiOutputType},
};

pub const EBI_COMMANDS: EbiCommand = EbiCommand::Group {
    name_short: "ebi-align",
    name_long: None,
    explanation_short: "Optimal alignments of traces against accepting Petri nets.",
    explanation_long: Some(
        "Computes optimal alignments of traces against accepting Petri nets, using A* search on the synchronous product of trace and model, guided by the marking equation.",
    ),
    children: &[
        &ebi_command_align::EBI_ALIGN,
        &ebi_command_info::EBI_INFO,
        &ebi_command_validate::EBI_VALIDATE,
    ],
};

pub const ARG_SHORT_OUTPUT: char = 'o';
pub const ARG_ID_OUTPUT: &str = "output";
pub const ARG_ID_JSON: &str = "json";

pub enum EbiCommand {
    Group {
        name_short: &'static str,
        name_long: Option<&'static str>,
        explanation_short: &'static str,
        explanation_long: Option<&'static str>,
        children: &'static [&'static EbiCommand],
    },
    Command {
        name_short: &'static str,
        name_long: Option<&'static str>,
        explanation_short: &'static str,
        explanation_long: Option<&'static str>,
        cli_command: Option<fn(command: Command) -> Command>, //create the cli command. An output -o argument is always added

        input_types: &'static [&'static [&'static EbiInputType]], //for each fixed-position input parameter, the input types that are accepted
        input_names: &'static [&'static str],
        input_helps: &'static [&'static str],

        execute: fn(inputs: Vec<EbiInput>, cli_matches: Option<&ArgMatches>) -> Result<EbiOutput>,
        output_type: &'static EbiOutputType,
    },
}

impl EbiCommand {
    pub fn build_cli(&self) -> Command {
        let mut command;
        match self {
            EbiCommand::Group {
                name_short,
                name_long,
                explanation_short,
                explanation_long,
                children,
            } => {
                command = Command::new(self.long_name())
                    .about(explanation_short)
                    .subcommand_required(true)
                    .allow_external_subcommands(false);

                if name_long.is_some() {
                    command = command.alias(name_short);
                }

                if let Some(l) = explanation_long {
                    command = command.long_about(l);
                }

                for child in children.iter() {
                    command = command.subcommand(child.build_cli());
                }
            }
            EbiCommand::Command {
                name_short,
                name_long,
                explanation_short,
                explanation_long,
                cli_command,
                input_types,
                input_names,
                input_helps,
                ..
            } => {
                command = Command::new(self.long_name()).about(explanation_short);

                if name_long.is_some() {
                    command = command.alias(name_short);
                }

                if let Some(l) = explanation_long {
                    command = command.long_about(l);
                }

                for (i, (input_name, (input_type, input_help))) in input_names
                    .iter()
                    .zip(input_types.iter().zip(input_helps.iter()))
                    .enumerate()
                {
                    let mut arg = Arg::new(format!("{}x{}", input_name, i))
                        .value_name(input_name)
                        .help(input_help)
                        .value_parser(EbiInputType::get_parser_of_list(input_type))
                        .long_help(format!(
                            "{}. Accepted: {}.",
                            input_help,
                            EbiInputType::possible_inputs_as_strings_with_articles(
                                input_type, "or"
                            )
                        ));

                    arg = if EbiInputType::takes_multiple_values(input_type) {
                        arg.action(ArgAction::Append).num_args(0..).required(false)
                    } else {
                        arg.action(ArgAction::Set).required(true)
                    };

                    command = command.arg(arg);
                }

                if let Some(f) = cli_command {
                    command = (f)(command);
                }

                command = command
                    .arg(
                        Arg::new(ARG_ID_OUTPUT)
                            .short(ARG_SHORT_OUTPUT)
                            .long(ARG_ID_OUTPUT)
                            .action(ArgAction::Set)
                            .value_name("FILE")
                            .help("Saves the result to a file.")
                            .required(false)
                            .value_parser(value_parser!(PathBuf)),
                    )
                    .arg(
                        Arg::new(ARG_ID_JSON)
                            .long(ARG_ID_JSON)
                            .action(ArgAction::SetTrue)
                            .help("Writes the result as JSON, if the result supports it.")
                            .required(false),
                    );
            }
        };
        command
    }

    pub fn long_name(&self) -> &'static str {
        match self {
            EbiCommand::Group {
                name_short,
                name_long,
                ..
            }
            | EbiCommand::Command {
                name_short,
                name_long,
                ..
            } => name_long.unwrap_or(*name_short),
        }
    }

    pub fn explanation_long(&self) -> &str {
        match self {
            EbiCommand::Group {
                explanation_short,
                explanation_long,
                ..
            }
            | EbiCommand::Command {
                explanation_short,
                explanation_long,
                ..
            } => explanation_long.unwrap_or(*explanation_short),
        }
    }

    pub fn get_progress_bar(total_ticks: usize) -> ProgressBar {
        let pb = ProgressBar::new(total_ticks as u64);
        pb.set_style(
            ProgressStyle::with_template("[{wide_bar:.cyan/blue}] {pos:>7}/{len:7}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_position(0);
        pb
    }

    pub fn execute(&self, cli_matches: &ArgMatches) -> Result<()> {
        match self {
            EbiCommand::Group { children, .. } => {
                for child in children.iter() {
                    if let Some(sub_matches) = cli_matches.subcommand_matches(child.long_name()) {
                        return child.execute(sub_matches);
                    }
                }
            }
            EbiCommand::Command {
                input_types: input_typess,
                execute,
                output_type,
                input_names,
                ..
            } => {
                //read the inputs
                let mut inputs = vec![];
                for (i, (input_types, input_name)) in
                    input_typess.iter().zip(input_names.iter()).enumerate()
                {
                    let cli_id = format!("{}x{}", input_name, i);

                    log::info!("reading {}", input_name);
                    let input = Self::attempt_parse(input_types, cli_matches, &cli_id)
                        .with_context(|| format!("reading parameter {}", input_name))?;
                    inputs.push(input);
                }

                log::info!("starting {}", self.long_name());

                let result = (execute)(inputs, Some(cli_matches))?;

                if &&result.get_type() != output_type {
                    return Err(anyhow!(
                        "output type {} does not match the declared output of {}",
                        result.get_type(),
                        output_type
                    ));
                }

                let to_file = cli_matches.get_one::<PathBuf>(ARG_ID_OUTPUT);
                let exporter =
                    Self::select_exporter(output_type, to_file, cli_matches.get_flag(ARG_ID_JSON));
                if let Some(to_file) = to_file {
                    log::info!(
                        "writing result to {:?} as {} {}",
                        to_file,
                        exporter.get_article(),
                        exporter
                    );
                    ebi_output::export_object(to_file, result, exporter)?;
                } else {
                    log::info!("writing result as {} {}", exporter.get_article(), exporter);
                    print!("{}", ebi_output::export_to_string(result, exporter)?);
                }

                return Ok(());
            }
        }
        Err(anyhow!("command not recognised"))
    }

    /**
     * JSON is chosen if asked for, or if the output file has a .json extension, and the output type supports it.
     * Otherwise, the first exporter of the output type is used.
     */
    pub fn select_exporter(
        output_type: &EbiOutputType,
        to_file: Option<&PathBuf>,
        json: bool,
    ) -> EbiExporter {
        let exporters = output_type.get_exporters();

        let wants_json = json
            || to_file.is_some_and(|to_file| {
                to_file
                    .extension()
                    .is_some_and(|extension| extension == EbiExporter::Json.get_file_extension())
            });

        if wants_json && exporters.contains(&EbiExporter::Json) {
            EbiExporter::Json
        } else {
            exporters.into_iter().next().unwrap_or(EbiExporter::Text)
        }
    }

    /**
     * Attempt to parse an input as any of the given input types. Returns the last error if unsuccessful.
     */
    pub fn attempt_parse(
        input_types: &[&EbiInputType],
        cli_matches: &ArgMatches,
        cli_id: &str,
    ) -> Result<EbiInput> {
        let parameters = ImporterParameters::from_cli(Some(cli_matches));

        //an input may be of several types; go through each of them
        let mut error = None;
        for input_type in input_types.iter() {
            match input_type {
                EbiInputType::Trait(etrait) => {
                    match ebi_input::get_reader(cli_matches, cli_id).context("getting reader") {
                        Ok(mut reader) => {
                            match ebi_input::read_as_trait(etrait, &mut reader, &parameters)
                                .with_context(|| format!("parsing as the trait `{}`", etrait))
                            {
                                Ok((object, file_handler)) => {
                                    log::info!("read {} {}", file_handler.get_article(), file_handler);
                                    return Ok(EbiInput::Trait(object, file_handler));
                                }
                                Err(e) => error = Some(e),
                            }
                        }
                        Err(e) => error = Some(e),
                    }
                }
                EbiInputType::AnyFile => {
                    match ebi_input::get_reader(cli_matches, cli_id).context("getting reader") {
                        Ok(reader) => return Ok(EbiInput::File(reader)),
                        Err(e) => error = Some(e),
                    }
                }
                EbiInputType::Strings => {
                    let values = match cli_matches.try_get_many::<String>(cli_id)? {
                        Some(values) => values.cloned().collect(),
                        None => vec![],
                    };
                    return Ok(EbiInput::Strings(values));
                }
            }
        }

        match error {
            Some(e) => Err(e),
            None => Err(anyhow!("argument was not given")),
        }
    }

    pub fn path_to_string(path: &[&EbiCommand]) -> String {
        path.iter()
            .map(|command| command.long_name())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn get_command_paths(&self) -> BTreeSet<Vec<&'static EbiCommand>> {
        let mut result = BTreeSet::new();
        Self::get_paths_recursive(&EBI_COMMANDS, &mut result, vec![]);
        result
    }

    fn get_paths_recursive(
        command: &'static EbiCommand,
        result: &mut BTreeSet<Vec<&'static EbiCommand>>,
        mut prefix: Vec<&'static EbiCommand>,
    ) {
        prefix.push(command);
        match command {
            EbiCommand::Group { children, .. } => {
                for child in children.iter() {
                    Self::get_paths_recursive(child, result, prefix.clone());
                }
            }
            EbiCommand::Command { .. } => {
                result.insert(prefix);
            }
        }
    }
}

impl Ord for EbiCommand {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.long_name().cmp(other.long_name())
    }
}

impl PartialOrd for EbiCommand {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for EbiCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.long_name())
    }
}

impl Debug for EbiCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Group {
                name_short,
                name_long,
                ..
            } => f
                .debug_struct("Group")
                .field("name_short", name_short)
                .field("name_long", name_long)
                .finish(),
            Self::Command {
                name_short,
                name_long,
                ..
            } => f
                .debug_struct("Command")
                .field("name_short", name_short)
                .field("name_long", name_long)
                .finish(),
        }
    }
}

impl Eq for EbiCommand {}

impl PartialEq for EbiCommand {
    fn eq(&self, other: &Self) -> bool {
        self.long_name() == other.long_name()
    }
}

impl Hash for EbiCommand {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.long_name().hash(state)
    }
}
