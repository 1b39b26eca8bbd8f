use std::{
    collections::HashMap,
    fmt::{Debug, Display},
    hash::Hash,
};

use serde::{Serialize, Serializer};

#[derive(Clone, Copy)]
pub struct Activity {
    id: usize,
}

impl PartialEq for Activity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Activity {}

impl Hash for Activity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ac{}", self.id)
    }
}

impl Debug for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ac{}", self.id)
    }
}

impl PartialOrd for Activity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Activity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl Serialize for Activity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.id as u64)
    }
}

/// Interns activity labels, so that traces and models can compare activities by index.
#[derive(Clone, Debug, Default)]
pub struct ActivityKey {
    name2activity: HashMap<String, Activity>,
    activity2name: Vec<String>,
}

impl ActivityKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_number_of_activities(&self) -> usize {
        self.activity2name.len()
    }

    pub fn process_activity(&mut self, activity: &str) -> Activity {
        match self.name2activity.get(activity) {
            Some(index) => *index,
            None => {
                let result = Activity {
                    id: self.activity2name.len(),
                };
                self.activity2name.push(activity.to_string());
                self.name2activity.insert(activity.to_string(), result);
                result
            }
        }
    }

    pub fn process_trace<S: AsRef<str>>(&mut self, trace: &[S]) -> Vec<Activity> {
        trace
            .iter()
            .map(|activity| self.process_activity(activity.as_ref()))
            .collect()
    }

    /// Looks up an activity without registering it.
    pub fn get_activity(&self, label: &str) -> Option<Activity> {
        self.name2activity.get(label).copied()
    }

    pub fn get_activity_label(&self, activity: &Activity) -> &str {
        &self.activity2name[activity.id]
    }

    pub fn deprocess_trace(&self, trace: &[Activity]) -> Vec<&str> {
        trace
            .iter()
            .map(|activity| self.get_activity_label(activity))
            .collect()
    }
}

pub trait HasActivityKey {
    fn get_activity_key(&self) -> &ActivityKey;

    fn get_activity_key_mut(&mut self) -> &mut ActivityKey;
}

impl Display for ActivityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, label) in self.activity2name.iter().enumerate() {
            write!(f, "ac{}: {}, ", i, label)?;
        }
        write!(f, "")
    }
}
