use anyhow::{Context, Error, Result, anyhow};
use derive_activity_key::ActivityKey;
use indexmap::IndexMap;
use std::{
    io::{self, BufRead},
    str::FromStr,
};

use crate::{
    ebi_framework::{
        activity_key::{Activity, ActivityKey},
        ebi_file_handler::EbiFileHandler,
        ebi_input::{EbiTraitImporter, ImporterParameters},
        exportable::Exportable,
        importable::Importable,
        infoable::Infoable,
        validate::Validate,
    },
    ebi_traits::ebi_trait_event_log::EbiTraitEventLog,
};

pub const DEFAULT_CASE_COLUMN: &str = "case:concept:name";
pub const DEFAULT_ACTIVITY_COLUMN: &str = "concept:name";

pub const FORMAT_SPECIFICATION: &str = "A CSV event log is a comma-separated table with a header row.
Each row is an event. One column holds the identity of the trace the event belongs to (by default `case:concept:name'),
and another column holds its activity (by default `concept:name'). Other columns are ignored.
Events of a trace are taken in the order of the rows; traces are ordered by their first event.";

pub const EBI_EVENT_LOG_CSV: EbiFileHandler = EbiFileHandler {
    name: "CSV event log",
    article: "a",
    file_extension: "csv",
    format_specification: FORMAT_SPECIFICATION,
    validator: EventLogCsv::validate,
    trait_importers: &[EbiTraitImporter::EventLog(EventLogCsv::read_as_event_log)],
};

/// An event log read from a table of events.
#[derive(ActivityKey, Clone, Debug)]
pub struct EventLogCsv {
    pub(crate) activity_key: ActivityKey,
    pub(crate) case_column: String,
    pub(crate) activity_column: String,
    pub(crate) traces: IndexMap<String, Vec<Activity>>,
}

impl EventLogCsv {
    pub fn import_with_columns(
        reader: &mut dyn BufRead,
        case_column: &str,
        activity_column: &str,
    ) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers().context("failed to read the header row")?.clone();
        let case_index = find_column(&headers, case_column)?;
        let activity_index = find_column(&headers, activity_column)?;

        let mut result = Self {
            activity_key: ActivityKey::new(),
            case_column: case_column.to_string(),
            activity_column: activity_column.to_string(),
            traces: IndexMap::new(),
        };

        for (row, record) in rdr.records().enumerate() {
            let record = record.with_context(|| format!("failed to read row {}", row + 1))?;
            let case = record.get(case_index).with_context(|| {
                format!("row {} has no value in column `{}`", row + 1, case_column)
            })?;
            let activity = record.get(activity_index).with_context(|| {
                format!("row {} has no value in column `{}`", row + 1, activity_column)
            })?;

            let activity = result.activity_key.process_activity(activity);
            result
                .traces
                .entry(case.to_string())
                .or_default()
                .push(activity);
        }

        log::debug!(
            "read {} traces from a table with columns {:?}",
            result.traces.len(),
            headers
        );

        Ok(result)
    }

    pub fn read_as_event_log(
        reader: &mut dyn BufRead,
        parameters: &ImporterParameters,
    ) -> Result<Box<dyn EbiTraitEventLog>> {
        Ok(Box::new(Self::import_with_columns(
            reader,
            &parameters.case_column,
            &parameters.activity_column,
        )?))
    }
}

fn find_column(headers: &csv::StringRecord, column: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header == column)
        .ok_or_else(|| {
            anyhow!(
                "column `{}` not found; the available columns are {}",
                column,
                headers
                    .iter()
                    .map(|header| format!("`{}`", header))
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })
}

impl EbiTraitEventLog for EventLogCsv {
    fn get_number_of_traces(&self) -> usize {
        self.traces.len()
    }

    fn get_trace_id(&self, trace_index: usize) -> Option<&str> {
        self.traces
            .get_index(trace_index)
            .map(|(trace_id, _)| trace_id.as_str())
    }

    fn get_trace(&self, trace_index: usize) -> Option<&Vec<Activity>> {
        self.traces.get_index(trace_index).map(|(_, trace)| trace)
    }
}

impl Importable for EventLogCsv {
    fn import(reader: &mut dyn BufRead) -> Result<Self> {
        Self::import_with_columns(reader, DEFAULT_CASE_COLUMN, DEFAULT_ACTIVITY_COLUMN)
    }
}

impl FromStr for EventLogCsv {
    type Err = Error;

    fn from_str(s: &str) -> std::prelude::v1::Result<Self, Self::Err> {
        let mut reader = io::Cursor::new(s);
        Self::import(&mut reader)
    }
}

impl Exportable for EventLogCsv {
    fn export(&self, f: &mut dyn std::io::Write) -> Result<()> {
        let mut writer = csv::Writer::from_writer(f);
        writer.write_record([&self.case_column, &self.activity_column])?;
        for (trace_id, trace) in &self.traces {
            for activity in trace {
                writer.write_record([
                    trace_id.as_str(),
                    self.activity_key.get_activity_label(activity),
                ])?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

impl Infoable for EventLogCsv {
    fn info(&self, f: &mut dyn std::io::Write) -> Result<()> {
        writeln!(f, "Number of traces\t{}", self.traces.len())?;
        writeln!(
            f,
            "Number of events\t{}",
            self.traces.values().map(Vec::len).sum::<usize>()
        )?;
        writeln!(
            f,
            "Number of activities\t{}",
            self.activity_key.get_number_of_activities()
        )?;
        writeln!(f, "Case column\t\t{}", self.case_column)?;
        writeln!(f, "Activity column\t\t{}", self.activity_column)?;

        Ok(write!(f, "")?)
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, io::Cursor};

    use crate::{
        ebi_framework::exportable::Exportable, ebi_traits::ebi_trait_event_log::EbiTraitEventLog,
    };

    use super::EventLogCsv;

    #[test]
    fn csv_import() {
        let fin = fs::read_to_string("testfiles/log.csv").unwrap();
        let log = fin.parse::<EventLogCsv>().unwrap();

        assert_eq!(log.get_number_of_traces(), 3);
        assert_eq!(log.get_trace_id(0), Some("case 1"));
        assert_eq!(log.get_trace_id(1), Some("case 2"));

        let log: Box<dyn EbiTraitEventLog> = Box::new(log);
        assert_eq!(log.get_trace_labels(0), Some(vec!["a", "b"]));
        assert_eq!(log.get_trace_labels(2), Some(vec!["b", "a", "c"]));
    }

    #[test]
    fn csv_custom_columns() {
        let mut reader = Cursor::new("id,task\nx,a\ny,b\nx,c\n");
        let log = EventLogCsv::import_with_columns(&mut reader, "id", "task").unwrap();

        let log: Box<dyn EbiTraitEventLog> = Box::new(log);
        assert_eq!(log.get_trace_labels(0), Some(vec!["a", "c"]));
    }

    #[test]
    fn csv_missing_column() {
        assert!("case,activity\n1,a\n".parse::<EventLogCsv>().is_err());
    }

    #[test]
    fn csv_export() {
        let log = "case:concept:name,concept:name\n1,a\n1,b\n"
            .parse::<EventLogCsv>()
            .unwrap();
        let mut out = vec![];
        log.export(&mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "case:concept:name,concept:name\n1,a\n1,b\n"
        );
    }
}
