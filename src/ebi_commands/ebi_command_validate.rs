use anyhow::anyhow;
use std::io::Write;

use crate::ebi_framework::{
    ebi_command::EbiCommand,
    ebi_file_handler::EBI_FILE_HANDLERS,
    ebi_input::{self, EbiInput, EbiInputType},
    ebi_output::{EbiOutput, EbiOutputType},
};

pub const EBI_VALIDATE: EbiCommand = EbiCommand::Command {
    name_short: "vali",
    name_long: Some("validate"),
    explanation_short: "Attempt to parse a file as every supported file type, and report the parsing errors.",
    explanation_long: Some(
        "Attempt to parse a file as every supported file type, and report the parsing errors. An accepting Petri net is also checked for structural well-formedness: its markings must cover all places, every transition must have input and output places, and the final marking may only be empty if there are no places.",
    ),
    cli_command: None,
    input_types: &[&[&EbiInputType::AnyFile]],
    input_names: &["FILE"],
    input_helps: &["The file to be parsed."],
    execute: |mut inputs, _| {
        if let EbiInput::File(mut reader) = inputs.remove(0) {
            let mut f = vec![];
            let mut valid = 0;

            for file_handler in EBI_FILE_HANDLERS {
                match ebi_input::validate_object_of(&mut reader, file_handler) {
                    Ok(()) => {
                        valid += 1;
                        writeln!(f, "File is a valid {}.", file_handler.name)?;
                    }
                    Err(err) => {
                        log::info!("not {} {}: {:#}", file_handler.get_article(), file_handler, err);
                        writeln!(f, "File is not a valid {}: {:#}", file_handler.name, err)?;
                    }
                }
            }

            if valid == 0 {
                return Err(anyhow!(
                    "file could not be parsed as any supported file type\n{}",
                    String::from_utf8(f)?
                ));
            }

            return Ok(EbiOutput::String(String::from_utf8(f)?));
        }

        Err(anyhow!("no input file given"))
    },
    output_type: &EbiOutputType::String,
};

#[cfg(test)]
mod tests {
    use std::fs::File;

    use crate::{
        ebi_framework::{ebi_command::EbiCommand, ebi_input::EbiInput, ebi_output::EbiOutput},
        multiple_reader::MultipleReader,
    };

    use super::EBI_VALIDATE;

    fn validate(file: &str) -> anyhow::Result<String> {
        let reader = MultipleReader::from_file(File::open(file).unwrap());
        if let EbiCommand::Command { execute, .. } = EBI_VALIDATE {
            match (execute)(vec![EbiInput::File(reader)], None)? {
                EbiOutput::String(s) => Ok(s),
                _ => panic!("validate should return text"),
            }
        } else {
            panic!("validate is a command")
        }
    }

    #[test]
    fn validate_net() {
        let report = validate("testfiles/parallel.apnet").unwrap();
        assert!(report.contains("File is a valid accepting Petri net."));
        assert!(report.contains("File is not a valid event log"));
    }

    #[test]
    fn validate_malformed_net() {
        let err = validate("testfiles/malformed.apnet").unwrap_err();
        assert!(format!("{:#}", err).contains("not a valid accepting Petri net"));
    }
}
