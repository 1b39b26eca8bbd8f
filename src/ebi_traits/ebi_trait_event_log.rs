use crate::ebi_framework::{
    activity_key::{Activity, HasActivityKey},
    infoable::Infoable,
};

/// A log of traces, each with an identity and a sequence of activities, regardless of how the log was stored.
pub trait EbiTraitEventLog: HasActivityKey + Infoable + Send + Sync {
    fn get_number_of_traces(&self) -> usize;

    fn get_trace_id(&self, trace_index: usize) -> Option<&str>;

    /// The activities of the trace, in the activity key of the log.
    fn get_trace(&self, trace_index: usize) -> Option<&Vec<Activity>>;
}

impl dyn EbiTraitEventLog + '_ {
    pub fn get_trace_labels(&self, trace_index: usize) -> Option<Vec<&str>> {
        self.get_trace(trace_index)
            .map(|trace| self.get_activity_key().deprocess_trace(trace))
    }

    pub fn get_number_of_events(&self) -> usize {
        (0..self.get_number_of_traces())
            .filter_map(|trace_index| self.get_trace(trace_index))
            .map(Vec::len)
            .sum()
    }
}
