use anyhow::{Context, Result};
use std::{
    fmt::{self, Display},
    fs::File,
    io::Write,
    path::PathBuf,
};

use crate::ebi_objects::alignments::Alignments;

use super::exportable::Exportable;

pub enum EbiOutput {
    Alignments(Alignments),
    String(String),
}

impl EbiOutput {
    pub fn get_type(&self) -> EbiOutputType {
        match self {
            EbiOutput::Alignments(_) => EbiOutputType::Alignments,
            EbiOutput::String(_) => EbiOutputType::String,
        }
    }
}

#[derive(PartialEq, Eq, Debug)]
pub enum EbiOutputType {
    Alignments,
    String,
}

impl EbiOutputType {
    /**
     * Returns all exporters that can handle this output type. The first one is the default.
     */
    pub fn get_exporters(&self) -> Vec<EbiExporter> {
        match self {
            EbiOutputType::Alignments => vec![EbiExporter::Text, EbiExporter::Json],
            EbiOutputType::String => vec![EbiExporter::Text],
        }
    }
}

impl Display for EbiOutputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EbiOutputType::Alignments => Display::fmt(&"alignments", f),
            EbiOutputType::String => Display::fmt(&"text", f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EbiExporter {
    Text,
    Json,
}

impl EbiExporter {
    pub fn export_from_object(&self, output: EbiOutput, f: &mut dyn std::io::Write) -> Result<()> {
        match (self, output) {
            (EbiExporter::Text, EbiOutput::Alignments(object)) => object.export(f),
            (EbiExporter::Json, EbiOutput::Alignments(object)) => object.export_json(f),
            (EbiExporter::Text, EbiOutput::String(object)) => object.export(f),
            (EbiExporter::Json, EbiOutput::String(object)) => {
                serde_json::to_writer(&mut *f, &object)?;
                Ok(writeln!(f)?)
            }
        }
    }

    pub fn get_article(&self) -> &str {
        "a"
    }

    pub fn get_file_extension(&self) -> &str {
        match self {
            EbiExporter::Text => "txt",
            EbiExporter::Json => "json",
        }
    }
}

impl Display for EbiExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EbiExporter::Text => Display::fmt(&"text", f),
            EbiExporter::Json => Display::fmt(&"JSON", f),
        }
    }
}

pub fn export_object(to_file: &PathBuf, object: EbiOutput, exporter: EbiExporter) -> Result<()> {
    let file = File::create(to_file)
        .with_context(|| format!("could not create file {:?}", to_file))?;
    let mut writer = std::io::BufWriter::new(&file);
    exporter
        .export_from_object(object, &mut writer)
        .with_context(|| format!("writing result to file {:?}", to_file))?;
    writer
        .flush()
        .with_context(|| format!("writing result to file {:?}", to_file))
}

pub fn export_to_string(object: EbiOutput, exporter: EbiExporter) -> Result<String> {
    let mut f = vec![];
    exporter.export_from_object(object, &mut f)?;
    Ok(String::from_utf8(f)?)
}

#[cfg(test)]
mod tests {
    use super::{EbiExporter, EbiOutput, EbiOutputType, export_to_string};

    #[test]
    fn export_text() {
        let result =
            export_to_string(EbiOutput::String("ok".to_string()), EbiExporter::Text).unwrap();
        assert_eq!(result, "ok\n");

        let result =
            export_to_string(EbiOutput::String("ok".to_string()), EbiExporter::Json).unwrap();
        assert_eq!(result, "\"ok\"\n");
    }

    #[test]
    fn exporters() {
        assert_eq!(
            EbiOutputType::Alignments.get_exporters(),
            vec![EbiExporter::Text, EbiExporter::Json]
        );
        assert_eq!(EbiOutputType::String.get_exporters(), vec![EbiExporter::Text]);
    }
}
