use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command, builder::PossibleValuesParser, value_parser};
use std::{collections::HashMap, fs::File, io::BufReader, path::PathBuf, time::Duration};
use strum::VariantNames;

use crate::{
    ebi_framework::{
        ebi_command::EbiCommand,
        ebi_input::{ARG_ID_ACTIVITY_COLUMN, ARG_ID_CASE_COLUMN, EbiInputType},
        ebi_output::{EbiOutput, EbiOutputType},
        ebi_trait::EbiTrait,
        infoable::Infoable,
    },
    ebi_objects::{
        accepting_petri_net::AcceptingPetriNet,
        alignments::Alignments,
        event_log_csv::{DEFAULT_ACTIVITY_COLUMN, DEFAULT_CASE_COLUMN},
    },
    ebi_traits::ebi_trait_event_log::EbiTraitEventLog,
    techniques::{
        align::{AlignmentConfig, Heuristic, align, align_log},
        cost_function::{CostFunction, check_cost},
    },
};

pub const ARG_ID_HEURISTIC: &str = "heuristic";
pub const ARG_ID_TIMEOUT: &str = "timeout";
pub const ARG_ID_COSTS: &str = "costs";
pub const ARG_ID_TIERED: &str = "tiered";

pub const EBI_ALIGN: EbiCommand = EbiCommand::Group {
    name_short: "ali",
    name_long: Some("align"),
    explanation_short: "Compute optimal alignments.",
    explanation_long: Some(
        "Compute optimal alignments of traces against an accepting Petri net. An alignment explains a trace by a run of the model, using synchronous moves, moves on the log only and moves on the model only.",
    ),
    children: &[&EBI_ALIGN_LOG, &EBI_ALIGN_TRACE],
};

pub const EBI_ALIGN_LOG: EbiCommand = EbiCommand::Command {
    name_short: "log",
    name_long: None,
    explanation_short: "Compute an optimal alignment for every trace of an event log.",
    explanation_long: Some(
        "Compute an optimal alignment for every trace of an event log. Traces are aligned in parallel; a trace that cannot be aligned is reported with its error, and does not affect the other traces.",
    ),
    cli_command: Some(|command| {
        alignment_options(command)
            .arg(
                Arg::new(ARG_ID_CASE_COLUMN)
                    .long(ARG_ID_CASE_COLUMN)
                    .action(ArgAction::Set)
                    .value_name("COLUMN")
                    .help(format!(
                        "The column of a CSV event log that holds the trace identity [default: {}].",
                        DEFAULT_CASE_COLUMN
                    ))
                    .required(false)
                    .value_parser(value_parser!(String)),
            )
            .arg(
                Arg::new(ARG_ID_ACTIVITY_COLUMN)
                    .long(ARG_ID_ACTIVITY_COLUMN)
                    .action(ArgAction::Set)
                    .value_name("COLUMN")
                    .help(format!(
                        "The column of a CSV event log that holds the activity [default: {}].",
                        DEFAULT_ACTIVITY_COLUMN
                    ))
                    .required(false)
                    .value_parser(value_parser!(String)),
            )
    }),
    input_types: &[
        &[&EbiInputType::Trait(EbiTrait::AcceptingPetriNet)],
        &[&EbiInputType::Trait(EbiTrait::EventLog)],
    ],
    input_names: &["MODEL", "LOG"],
    input_helps: &["The model to align against.", "The traces to align."],
    execute: |mut inputs, cli_matches| {
        let net = inputs.remove(0).to_type::<AcceptingPetriNet>()?;
        let log = inputs.remove(0).to_type::<dyn EbiTraitEventLog>()?;
        let config = alignment_config(cli_matches)?;

        let alignments = align_log(log.as_ref(), &net, &config);

        let mut f = vec![];
        alignments.info(&mut f)?;
        log::info!("alignments computed\n{}", String::from_utf8_lossy(&f));

        Ok(EbiOutput::Alignments(alignments))
    },
    output_type: &EbiOutputType::Alignments,
};

pub const EBI_ALIGN_TRACE: EbiCommand = EbiCommand::Command {
    name_short: "trace",
    name_long: None,
    explanation_short: "Compute an optimal alignment for a single trace.",
    explanation_long: None,
    cli_command: Some(alignment_options),
    input_types: &[
        &[&EbiInputType::Trait(EbiTrait::AcceptingPetriNet)],
        &[&EbiInputType::Strings],
    ],
    input_names: &["MODEL", "ACTIVITY"],
    input_helps: &[
        "The model to align against.",
        "The activities of the trace, in order.",
    ],
    execute: |mut inputs, cli_matches| {
        let net = inputs.remove(0).to_type::<AcceptingPetriNet>()?;
        let trace = inputs.remove(0).to_type::<Vec<String>>()?;
        let config = alignment_config(cli_matches)?;

        let alignment = align(trace.as_slice(), &net, &config).context("aligning the trace")?;

        let mut alignments = Alignments::new();
        alignments.push("trace".to_string(), Ok(alignment));
        Ok(EbiOutput::Alignments(alignments))
    },
    output_type: &EbiOutputType::Alignments,
};

fn alignment_options(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ID_HEURISTIC)
                .long(ARG_ID_HEURISTIC)
                .action(ArgAction::Set)
                .value_name("HEURISTIC")
                .help("The lower bound that guides the search.")
                .required(false)
                .default_value(<&'static str>::from(Heuristic::default()))
                .value_parser(PossibleValuesParser::new(Heuristic::VARIANTS)),
        )
        .arg(
            Arg::new(ARG_ID_TIMEOUT)
                .long(ARG_ID_TIMEOUT)
                .action(ArgAction::Set)
                .value_name("SECONDS")
                .help("Give up on a trace after this many seconds.")
                .required(false)
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new(ARG_ID_COSTS)
                .long(ARG_ID_COSTS)
                .action(ArgAction::Set)
                .value_name("FILE")
                .help("A JSON object that maps activities to the cost of a log or model move on them.")
                .required(false)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_ID_TIERED)
                .long(ARG_ID_TIERED)
                .action(ArgAction::Set)
                .num_args(0..=1)
                .require_equals(true)
                .value_name("DEVIATION,SILENT")
                .help(format!(
                    "Price log and visible model moves at DEVIATION and silent moves at SILENT, instead of 1 and 0 [default: {},{}].",
                    CostFunction::TIERED_DEVIATION,
                    CostFunction::TIERED_SILENT
                ))
                .required(false)
                .value_parser(value_parser!(String)),
        )
}

/// Builds the configuration of the search from the command line.
pub fn alignment_config(cli_matches: Option<&ArgMatches>) -> Result<AlignmentConfig> {
    let mut config = AlignmentConfig::default();
    let Some(cli_matches) = cli_matches else {
        return Ok(config);
    };

    if let Some(heuristic) = cli_matches.try_get_one::<String>(ARG_ID_HEURISTIC)? {
        config.heuristic = heuristic
            .parse::<Heuristic>()
            .with_context(|| format!("unknown heuristic `{}`", heuristic))?;
    }

    if let Some(timeout) = cli_matches.try_get_one::<f64>(ARG_ID_TIMEOUT)? {
        config.timeout = Some(
            Duration::try_from_secs_f64(*timeout)
                .with_context(|| format!("`{}` is not a valid timeout", timeout))?,
        );
    }

    if let Some(costs) = cli_matches.try_get_one::<PathBuf>(ARG_ID_COSTS)? {
        config.cost_overrides = read_cost_overrides(costs)?;
    }

    if cli_matches.contains_id(ARG_ID_TIERED) {
        config.cost_function = match cli_matches.try_get_one::<String>(ARG_ID_TIERED)? {
            Some(value) => parse_tiered(value)?,
            None => CostFunction::tiered(),
        };
    }

    log::info!(
        "align using the {} heuristic and the {} cost function",
        config.heuristic,
        config.cost_function
    );

    Ok(config)
}

pub fn read_cost_overrides(path: &PathBuf) -> Result<HashMap<String, usize>> {
    let file = File::open(path)
        .with_context(|| format!("could not read cost file `{}`", path.display()))?;
    let overrides: HashMap<String, usize> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| {
            format!(
                "cost file `{}` should be a JSON object that maps activities to natural numbers",
                path.display()
            )
        })?;
    for (activity, cost) in &overrides {
        check_cost(*cost, &format!("activity `{}`", activity))
            .with_context(|| format!("cost file `{}`", path.display()))?;
    }
    Ok(overrides)
}

fn parse_tiered(value: &str) -> Result<CostFunction> {
    let (deviation, silent) = value
        .split_once(',')
        .ok_or_else(|| anyhow!("`{}` should have the form DEVIATION,SILENT", value))?;
    let cost_function = CostFunction::Tiered {
        deviation: deviation
            .trim()
            .parse()
            .with_context(|| format!("could not read deviation cost `{}`", deviation))?,
        silent: silent
            .trim()
            .parse()
            .with_context(|| format!("could not read silent cost `{}`", silent))?,
    };
    cost_function.validate()?;
    Ok(cost_function)
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, time::Duration};

    use crate::{
        ebi_framework::ebi_command::EBI_COMMANDS,
        techniques::{
            align::Heuristic,
            cost_function::{CostFunction, MAX_COST},
        },
    };

    use super::{alignment_config, parse_tiered, read_cost_overrides};

    fn config_of(args: &[&str]) -> super::AlignmentConfig {
        let cli_matches = EBI_COMMANDS
            .build_cli()
            .try_get_matches_from(args)
            .unwrap();
        let (_, align_matches) = cli_matches.subcommand().unwrap();
        let (_, trace_matches) = align_matches.subcommand().unwrap();
        alignment_config(Some(trace_matches)).unwrap()
    }

    #[test]
    fn default_config() {
        let config = config_of(&["ebi-align", "align", "trace", "testfiles/a.apnet", "a"]);

        assert_eq!(config.heuristic, Heuristic::MarkingEquation);
        assert_eq!(config.cost_function, CostFunction::Standard);
        assert_eq!(config.timeout, None);
        assert!(config.cost_overrides.is_empty());
    }

    #[test]
    fn config_from_options() {
        let config = config_of(&[
            "ebi-align",
            "align",
            "trace",
            "testfiles/a.apnet",
            "a",
            "b",
            "--heuristic",
            "none",
            "--timeout",
            "1.5",
            "--costs",
            "testfiles/costs.json",
            "--tiered=10,2",
        ]);

        assert_eq!(config.heuristic, Heuristic::None);
        assert_eq!(config.timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.cost_overrides.get("a"), Some(&5));
        assert_eq!(
            config.cost_function,
            CostFunction::Tiered {
                deviation: 10,
                silent: 2
            }
        );
    }

    #[test]
    fn tiered_defaults() {
        let config = config_of(&[
            "ebi-align",
            "align",
            "trace",
            "testfiles/a.apnet",
            "--tiered",
        ]);
        assert_eq!(config.cost_function, CostFunction::tiered());
    }

    #[test]
    fn tiered_parsing() {
        assert!(parse_tiered("1000").is_err());
        assert!(parse_tiered("x,1").is_err());
        assert_eq!(
            parse_tiered("5, 1").unwrap(),
            CostFunction::Tiered {
                deviation: 5,
                silent: 1
            }
        );

        assert!(parse_tiered(&format!("{},1", MAX_COST)).is_ok());
        assert!(parse_tiered(&format!("{},1", MAX_COST + 1)).is_err());
        assert!(parse_tiered("18446744073709551615,1").is_err());
    }

    #[test]
    fn cost_file_must_map_to_naturals() {
        assert!(read_cost_overrides(&PathBuf::from("testfiles/costs.json")).is_ok());
        assert!(read_cost_overrides(&PathBuf::from("testfiles/a.apnet")).is_err());
        assert!(read_cost_overrides(&PathBuf::from("testfiles/costs-out-of-range.json")).is_err());
    }
}
