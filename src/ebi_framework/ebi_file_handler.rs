use anyhow::{Error, Result, anyhow};
use std::{fmt::Display, io::BufRead, str::FromStr};

use crate::ebi_objects::{
    accepting_petri_net::EBI_ACCEPTING_PETRI_NET, event_log::EBI_EVENT_LOG,
    event_log_csv::EBI_EVENT_LOG_CSV,
};

use super::ebi_input::EbiTraitImporter;

/**
 * The order of this list is important: trait importers are attempted in order.
 * Thus, the more restrictive formats should come first.
 */
pub const EBI_FILE_HANDLERS: &[EbiFileHandler] =
    &[EBI_ACCEPTING_PETRI_NET, EBI_EVENT_LOG, EBI_EVENT_LOG_CSV];

#[derive(Clone, Debug)]
pub struct EbiFileHandler {
    pub name: &'static str,
    pub article: &'static str, //a or an
    pub file_extension: &'static str,
    pub format_specification: &'static str,
    pub validator: fn(&mut dyn BufRead) -> Result<()>,
    pub trait_importers: &'static [EbiTraitImporter],
}

impl EbiFileHandler {
    pub fn get_article(&self) -> &str {
        self.article
    }
}

impl FromStr for EbiFileHandler {
    type Err = Error;

    /// Finds a file handler by its name or by its file extension.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_start_matches('.');
        for file_handler in EBI_FILE_HANDLERS {
            if file_handler.name.eq_ignore_ascii_case(s) || file_handler.file_extension == s {
                return Ok(file_handler.clone());
            }
        }
        Err(anyhow!(
            "`{}` is not a known file type; use one of {}",
            s,
            EBI_FILE_HANDLERS
                .iter()
                .map(|file_handler| format!("`{}`", file_handler.file_extension))
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }
}

impl Display for EbiFileHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (.{})", self.name, self.file_extension)
    }
}

impl PartialEq for EbiFileHandler {
    fn eq(&self, other: &Self) -> bool {
        self.file_extension == other.file_extension
    }
}

impl Eq for EbiFileHandler {}

#[cfg(test)]
mod tests {
    use super::EbiFileHandler;

    #[test]
    fn file_handler_lookup() {
        assert_eq!(
            "apnet".parse::<EbiFileHandler>().unwrap().name,
            "accepting Petri net"
        );
        assert_eq!(
            ".csv".parse::<EbiFileHandler>().unwrap().file_extension,
            "csv"
        );
        assert_eq!(
            "Event Log".parse::<EbiFileHandler>().unwrap().file_extension,
            "elog"
        );
        assert!("xes".parse::<EbiFileHandler>().is_err());
    }
}
