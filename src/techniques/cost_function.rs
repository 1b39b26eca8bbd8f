use std::{collections::HashMap, fmt};

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::{
    ebi_framework::activity_key::{Activity, ActivityKey},
    techniques::alignment_error::{AlignmentError, AlignmentResult},
};

pub const SKIP: &str = ">>";
pub const TAU: &str = "tau";

/// The largest cost of a single move.
pub const MAX_COST: usize = u32::MAX as usize;

pub fn check_cost(cost: usize, what: &str) -> AlignmentResult<usize> {
    if cost > MAX_COST {
        Err(AlignmentError::CostOutOfRange(format!(
            "{} has cost {}, which exceeds the maximum of {}",
            what, cost, MAX_COST
        )))
    } else {
        Ok(cost)
    }
}

/// One side of a move in an alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Label {
    Activity(Activity),
    /// The side does not move.
    Skip,
    /// The model side fires a transition without a label.
    Silent,
}

impl Label {
    pub fn get_activity(&self) -> Option<Activity> {
        match self {
            Self::Activity(activity) => Some(*activity),
            _ => None,
        }
    }

    pub fn to_string(&self, activity_key: &ActivityKey) -> String {
        match self {
            Self::Activity(activity) => activity_key.get_activity_label(activity).to_string(),
            Self::Skip => SKIP.to_string(),
            Self::Silent => TAU.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct LabelPair {
    pub log: Label,
    pub model: Label,
}

impl LabelPair {
    pub fn new(log: Label, model: Label) -> Self {
        Self { log, model }
    }

    pub fn to_string(&self, activity_key: &ActivityKey) -> String {
        format!(
            "({}, {})",
            self.log.to_string(activity_key),
            self.model.to_string(activity_key)
        )
    }
}

/// How moves are priced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Default)]
pub enum CostFunction {
    /// Log moves and visible model moves cost 1; synchronous and silent moves are free.
    #[default]
    Standard,

    /// Log moves and visible model moves cost `deviation`, silent moves cost `silent`, synchronous moves are free.
    Tiered { deviation: usize, silent: usize },
}

impl CostFunction {
    pub const TIERED_DEVIATION: usize = 1000;
    pub const TIERED_SILENT: usize = 1;

    pub fn tiered() -> Self {
        Self::Tiered {
            deviation: Self::TIERED_DEVIATION,
            silent: Self::TIERED_SILENT,
        }
    }

    pub fn validate(&self) -> AlignmentResult<()> {
        if let Self::Tiered { deviation, silent } = self {
            check_cost(*deviation, "a deviation")?;
            check_cost(*silent, "a silent move")?;
        }
        Ok(())
    }

    pub fn cost(&self, label_pair: &LabelPair) -> usize {
        match (self, label_pair.log, label_pair.model) {
            (Self::Standard, Label::Activity(_), Label::Skip)
            | (Self::Standard, Label::Skip, Label::Activity(_)) => 1,
            (Self::Standard, _, _) => 0,
            (Self::Tiered { deviation, .. }, Label::Activity(_), Label::Skip)
            | (Self::Tiered { deviation, .. }, Label::Skip, Label::Activity(_)) => *deviation,
            (Self::Tiered { silent, .. }, Label::Skip, Label::Silent) => *silent,
            (Self::Tiered { .. }, _, _) => 0,
        }
    }
}

impl fmt::Display for CostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostFunction::Standard => write!(f, "standard"),
            CostFunction::Tiered { deviation, silent } => {
                write!(f, "tiered (deviation {}, silent {})", deviation, silent)
            }
        }
    }
}

/// A cost function with per-activity deviation costs, resolved against an activity key.
#[derive(Clone, Debug)]
pub struct CostModel {
    cost_function: CostFunction,
    overrides: FxHashMap<Activity, usize>,
}

impl CostModel {
    pub fn new(cost_function: CostFunction) -> Self {
        Self {
            cost_function,
            overrides: FxHashMap::default(),
        }
    }

    /// Overrides naming activities that the key does not know cannot occur in any move and are ignored.
    /// Every cost, including those of unknown activities, must be at most `MAX_COST`.
    pub fn with_overrides(
        cost_function: CostFunction,
        overrides: &HashMap<String, usize>,
        activity_key: &ActivityKey,
    ) -> AlignmentResult<Self> {
        cost_function.validate()?;

        let mut result = Self::new(cost_function);
        for (label, cost) in overrides {
            check_cost(*cost, &format!("activity `{}`", label))?;
            if let Some(activity) = activity_key.get_activity(label) {
                result.overrides.insert(activity, *cost);
            }
        }
        Ok(result)
    }

    pub fn cost(&self, label_pair: &LabelPair) -> usize {
        match (label_pair.log, label_pair.model) {
            (Label::Activity(activity), Label::Skip) | (Label::Skip, Label::Activity(activity)) => {
                if let Some(cost) = self.overrides.get(&activity) {
                    return *cost;
                }
            }
            _ => {}
        }
        self.cost_function.cost(label_pair)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::{
        ebi_framework::activity_key::ActivityKey, techniques::alignment_error::AlignmentError,
    };

    use super::{CostFunction, CostModel, Label, LabelPair, MAX_COST};

    #[test]
    fn standard_costs() {
        let mut activity_key = ActivityKey::new();
        let a = Label::Activity(activity_key.process_activity("a"));
        let standard = CostFunction::Standard;

        assert_eq!(standard.cost(&LabelPair::new(a, a)), 0);
        assert_eq!(standard.cost(&LabelPair::new(a, Label::Skip)), 1);
        assert_eq!(standard.cost(&LabelPair::new(Label::Skip, a)), 1);
        assert_eq!(standard.cost(&LabelPair::new(Label::Skip, Label::Silent)), 0);
    }

    #[test]
    fn tiered_costs() {
        let mut activity_key = ActivityKey::new();
        let a = Label::Activity(activity_key.process_activity("a"));
        let tiered = CostFunction::tiered();

        assert_eq!(tiered.cost(&LabelPair::new(a, a)), 0);
        assert_eq!(tiered.cost(&LabelPair::new(a, Label::Skip)), 1000);
        assert_eq!(tiered.cost(&LabelPair::new(Label::Skip, a)), 1000);
        assert_eq!(tiered.cost(&LabelPair::new(Label::Skip, Label::Silent)), 1);
    }

    #[test]
    fn override_costs() {
        let mut activity_key = ActivityKey::new();
        let a = Label::Activity(activity_key.process_activity("a"));
        let b = Label::Activity(activity_key.process_activity("b"));

        let mut overrides = HashMap::new();
        overrides.insert("a".to_string(), 7);
        overrides.insert("unknown".to_string(), 3);
        let model =
            CostModel::with_overrides(CostFunction::Standard, &overrides, &activity_key).unwrap();

        assert_eq!(model.cost(&LabelPair::new(a, Label::Skip)), 7);
        assert_eq!(model.cost(&LabelPair::new(Label::Skip, a)), 7);
        assert_eq!(model.cost(&LabelPair::new(a, a)), 0);
        assert_eq!(model.cost(&LabelPair::new(b, Label::Skip)), 1);
    }

    #[test]
    fn costs_are_bounded() {
        let activity_key = ActivityKey::new();
        let no_overrides = HashMap::new();

        let at_bound = CostFunction::Tiered {
            deviation: MAX_COST,
            silent: 1,
        };
        assert!(CostModel::with_overrides(at_bound, &no_overrides, &activity_key).is_ok());

        let too_large = CostFunction::Tiered {
            deviation: usize::MAX,
            silent: 1,
        };
        assert!(matches!(
            CostModel::with_overrides(too_large, &no_overrides, &activity_key),
            Err(AlignmentError::CostOutOfRange(_))
        ));

        let mut overrides = HashMap::new();
        overrides.insert("unknown".to_string(), MAX_COST + 1);
        assert!(matches!(
            CostModel::with_overrides(CostFunction::Standard, &overrides, &activity_key),
            Err(AlignmentError::CostOutOfRange(_))
        ));
    }

    #[test]
    fn label_pair_display() {
        let mut activity_key = ActivityKey::new();
        let a = Label::Activity(activity_key.process_activity("a"));

        assert_eq!(
            LabelPair::new(a, Label::Skip).to_string(&activity_key),
            "(a, >>)"
        );
        assert_eq!(
            LabelPair::new(Label::Skip, Label::Silent).to_string(&activity_key),
            "(>>, tau)"
        );
    }
}
