use anyhow::{Context, Error, Result, anyhow};
use derive_activity_key::ActivityKey;
use indexmap::{IndexMap, map::Entry};
use std::{
    fmt,
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
    line_reader::LineReader,
};

pub const HEADER: &str = "event log";

pub const FORMAT_SPECIFICATION: &str = "An event log is a line-based structure. Lines starting with a # are ignored.
The first line is exactly `event log'.
The second line is the number of traces in the log.
For each trace, the first line is the identity of the trace, which must be unique within the log.
Then, the number of events of the trace follows, and then one line per event with its activity.";

pub const EBI_EVENT_LOG: EbiFileHandler = EbiFileHandler {
    name: "event log",
    article: "an",
    file_extension: "elog",
    format_specification: FORMAT_SPECIFICATION,
    validator: EventLog::validate,
    trait_importers: &[EbiTraitImporter::EventLog(EventLog::read_as_event_log)],
};

#[derive(ActivityKey, Clone, Debug, Default)]
pub struct EventLog {
    pub(crate) activity_key: ActivityKey,
    pub(crate) traces: IndexMap<String, Vec<Activity>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a trace; fails if a trace with the same identity is already present.
    pub fn push<S: AsRef<str>>(&mut self, trace_id: String, trace: &[S]) -> Result<()> {
        let trace = self.activity_key.process_trace(trace);
        match self.traces.entry(trace_id) {
            Entry::Occupied(e) => Err(anyhow!("trace `{}` occurs more than once", e.key())),
            Entry::Vacant(e) => {
                e.insert(trace);
                Ok(())
            }
        }
    }

    pub fn read_as_event_log(
        reader: &mut dyn BufRead,
        _parameters: &ImporterParameters,
    ) -> Result<Box<dyn EbiTraitEventLog>> {
        Ok(Box::new(Self::import(reader)?))
    }
}

impl EbiTraitEventLog for EventLog {
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

impl Importable for EventLog {
    fn import(reader: &mut dyn BufRead) -> Result<Self> {
        let mut lreader = LineReader::new(reader);

        let head = lreader
            .next_line_string()
            .with_context(|| format!("failed to read header, which should be {}", HEADER))?;
        if head != HEADER {
            return Err(anyhow!(
                "first line should be exactly `{}`, but found `{}` on line `{}`",
                HEADER,
                lreader.get_last_line(),
                lreader.get_last_line_number()
            ));
        }

        let number_of_traces = lreader
            .next_line_index()
            .context("failed to read number of traces")?;

        let mut result = EventLog::new();
        for trace_index in 0..number_of_traces {
            let trace_id = lreader
                .next_line_string()
                .with_context(|| format!("failed to read identity of trace {}", trace_index))?;

            let number_of_events = lreader.next_line_index().with_context(|| {
                format!("failed to read number of events of trace {}", trace_index)
            })?;

            let mut trace = Vec::with_capacity(number_of_events);
            for event in 0..number_of_events {
                trace.push(lreader.next_line_string().with_context(|| {
                    format!("failed to read event {} of trace {}", event, trace_index)
                })?);
            }

            result.push(trace_id, &trace).with_context(|| {
                format!(
                    "trace {} ending at line {}",
                    trace_index,
                    lreader.get_last_line_number()
                )
            })?;
        }

        Ok(result)
    }
}

impl FromStr for EventLog {
    type Err = Error;

    fn from_str(s: &str) -> std::prelude::v1::Result<Self, Self::Err> {
        let mut reader = io::Cursor::new(s);
        Self::import(&mut reader)
    }
}

impl Exportable for EventLog {
    fn export(&self, f: &mut dyn std::io::Write) -> Result<()> {
        Ok(write!(f, "{}", self)?)
    }
}

impl Infoable for EventLog {
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

        Ok(write!(f, "")?)
    }
}

impl fmt::Display for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", HEADER)?;
        writeln!(f, "# number of traces\n{}", self.traces.len())?;

        for (i, (trace_id, trace)) in self.traces.iter().enumerate() {
            writeln!(f, "# trace {}", i)?;
            writeln!(f, "{}", trace_id)?;
            writeln!(f, "# number of events\n{}", trace.len())?;
            for activity in trace {
                writeln!(f, "{}", self.activity_key.get_activity_label(activity))?;
            }
        }

        write!(f, "")
    }
}
