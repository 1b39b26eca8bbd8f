use anyhow::Result;
use indexmap::IndexMap;
use serde::{
    Serialize, Serializer,
    ser::{SerializeMap, SerializeStruct},
};
use std::{fmt::Display, sync::Arc};

use crate::{
    ebi_framework::{
        activity_key::{Activity, ActivityKey},
        exportable::Exportable,
        infoable::Infoable,
    },
    ebi_objects::accepting_petri_net::TransitionIndex,
    techniques::{
        alignment_error::{AlignmentError, AlignmentResult},
        cost_function::{Label, LabelPair},
        synchronous_product::{ProductMove, SynchronousProduct},
    },
};

pub const HEADER: &str = "alignments";

/// A step of an alignment. Transition indices refer to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    LogMove(Activity),
    ModelMove(Activity, TransitionIndex),
    SynchronousMove(Activity, TransitionIndex),
    SilentMove(TransitionIndex),
}

impl Move {
    pub fn label_pair(&self) -> LabelPair {
        match self {
            Move::LogMove(activity) => LabelPair::new(Label::Activity(*activity), Label::Skip),
            Move::ModelMove(activity, _) => {
                LabelPair::new(Label::Skip, Label::Activity(*activity))
            }
            Move::SynchronousMove(activity, _) => {
                LabelPair::new(Label::Activity(*activity), Label::Activity(*activity))
            }
            Move::SilentMove(_) => LabelPair::new(Label::Skip, Label::Silent),
        }
    }

    pub fn get_transition(&self) -> Option<TransitionIndex> {
        match self {
            Move::LogMove(_) => None,
            Move::ModelMove(_, transition)
            | Move::SynchronousMove(_, transition)
            | Move::SilentMove(transition) => Some(*transition),
        }
    }

    pub fn get_type(&self) -> &'static str {
        match self {
            Move::LogMove(_) => "log move",
            Move::ModelMove(_, _) => "model move",
            Move::SynchronousMove(_, _) => "synchronous move",
            Move::SilentMove(_) => "silent move",
        }
    }
}

impl From<&ProductMove> for Move {
    fn from(value: &ProductMove) -> Self {
        match value {
            ProductMove::LogMove { activity, .. } => Move::LogMove(*activity),
            ProductMove::ModelMove {
                transition,
                activity: Some(activity),
            } => Move::ModelMove(*activity, *transition),
            ProductMove::ModelMove {
                transition,
                activity: None,
            } => Move::SilentMove(*transition),
            ProductMove::SynchronousMove {
                activity,
                transition,
                ..
            } => Move::SynchronousMove(*activity, *transition),
        }
    }
}

/// An optimal alignment of one trace.
#[derive(Debug, Clone)]
pub struct Alignment {
    activity_key: Arc<ActivityKey>,
    moves: Vec<Move>,
    move_costs: Vec<usize>,
    cost: usize,
    worst_case_cost: usize,
    states_visited: usize,
}

impl Alignment {
    /// Turns a firing sequence of `product` into an alignment.
    ///
    /// `costs` holds the cost of each product transition; `worst_case_cost` is the cost of explaining
    /// the trace without any synchronisation, which normalises the fitness.
    pub fn from_firing_sequence(
        product: &SynchronousProduct,
        sequence: &[TransitionIndex],
        costs: &[usize],
        worst_case_cost: usize,
        activity_key: Arc<ActivityKey>,
    ) -> Self {
        let moves = sequence
            .iter()
            .map(|transition| Move::from(product.get_move(*transition)))
            .collect();
        let move_costs = sequence
            .iter()
            .map(|transition| costs[*transition])
            .collect::<Vec<_>>();
        let cost = move_costs.iter().sum();

        Self {
            activity_key,
            moves,
            move_costs,
            cost,
            worst_case_cost,
            states_visited: 0,
        }
    }

    pub fn with_states_visited(mut self, states_visited: usize) -> Self {
        self.states_visited = states_visited;
        self
    }

    pub fn get_activity_key(&self) -> &ActivityKey {
        &self.activity_key
    }

    pub fn get_moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn get_cost(&self) -> usize {
        self.cost
    }

    pub fn get_worst_case_cost(&self) -> usize {
        self.worst_case_cost
    }

    /// 1 minus the cost relative to the worst case; 1 if even the worst case is free.
    pub fn get_fitness(&self) -> f64 {
        if self.worst_case_cost == 0 {
            1.0
        } else {
            (1.0 - self.cost as f64 / self.worst_case_cost as f64).max(0.0)
        }
    }

    pub fn get_states_visited(&self) -> usize {
        self.states_visited
    }

    pub fn get_label_pairs(&self) -> Vec<LabelPair> {
        self.moves.iter().map(Move::label_pair).collect()
    }

    pub fn get_number_of_synchronous_moves(&self) -> usize {
        self.count(|movee| matches!(movee, Move::SynchronousMove(_, _)))
    }

    pub fn get_number_of_log_moves(&self) -> usize {
        self.count(|movee| matches!(movee, Move::LogMove(_)))
    }

    pub fn get_number_of_model_moves(&self) -> usize {
        self.count(|movee| matches!(movee, Move::ModelMove(_, _)))
    }

    pub fn get_number_of_silent_moves(&self) -> usize {
        self.count(|movee| matches!(movee, Move::SilentMove(_)))
    }

    /// The trace that this alignment explains.
    pub fn get_log_projection(&self) -> Vec<Activity> {
        self.moves
            .iter()
            .filter_map(|movee| movee.label_pair().log.get_activity())
            .collect()
    }

    /// The model transitions that this alignment fires, in order.
    pub fn get_model_projection(&self) -> Vec<TransitionIndex> {
        self.moves.iter().filter_map(Move::get_transition).collect()
    }

    fn count(&self, f: impl Fn(&Move) -> bool) -> usize {
        self.moves.iter().filter(|movee| f(movee)).count()
    }

    fn write_moves(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "# number of moves\n{}", self.moves.len())?;

        for (j, (movee, cost)) in self.moves.iter().zip(self.move_costs.iter()).enumerate() {
            writeln!(f, "# move {} (cost {})", j, cost)?;
            writeln!(f, "{}", movee.get_type())?;

            match movee {
                Move::LogMove(activity) => {
                    writeln!(f, "label {}", self.activity_key.get_activity_label(activity))?;
                }
                Move::ModelMove(activity, transition)
                | Move::SynchronousMove(activity, transition) => {
                    writeln!(f, "label {}", self.activity_key.get_activity_label(activity))?;
                    writeln!(f, "{}", transition)?;
                }
                Move::SilentMove(transition) => {
                    writeln!(f, "{}", transition)?;
                }
            }
        }
        Ok(())
    }
}

impl Display for Alignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "# cost\n{}", self.cost)?;
        writeln!(f, "# fitness\n{}", self.get_fitness())?;
        self.write_moves(f)
    }
}

struct MoveView<'a> {
    movee: &'a Move,
    cost: usize,
    activity_key: &'a ActivityKey,
}

impl Serialize for MoveView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let label_pair = self.movee.label_pair();
        let mut state = serializer.serialize_struct("Move", 5)?;
        state.serialize_field("type", self.movee.get_type())?;
        state.serialize_field("log", &label_pair.log.to_string(self.activity_key))?;
        state.serialize_field("model", &label_pair.model.to_string(self.activity_key))?;
        state.serialize_field("transition", &self.movee.get_transition())?;
        state.serialize_field("cost", &self.cost)?;
        state.end()
    }
}

impl Serialize for Alignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let moves = self
            .moves
            .iter()
            .zip(self.move_costs.iter())
            .map(|(movee, cost)| MoveView {
                movee,
                cost: *cost,
                activity_key: &self.activity_key,
            })
            .collect::<Vec<_>>();

        let mut state = serializer.serialize_struct("Alignment", 4)?;
        state.serialize_field("cost", &self.cost)?;
        state.serialize_field("fitness", &self.get_fitness())?;
        state.serialize_field("states_visited", &self.states_visited)?;
        state.serialize_field("moves", &moves)?;
        state.end()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum Outcome<'a> {
    Alignment(&'a Alignment),
    Error(String),
}

/// The alignments of a batch of traces, in the order of the traces.
#[derive(Debug, Clone, Default)]
pub struct Alignments {
    alignments: IndexMap<String, AlignmentResult<Alignment>>,
}

impl Alignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, trace_id: String, alignment: AlignmentResult<Alignment>) {
        self.alignments.insert(trace_id, alignment);
    }

    pub fn len(&self) -> usize {
        self.alignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alignments.is_empty()
    }

    pub fn get(&self, trace_id: &str) -> Option<&AlignmentResult<Alignment>> {
        self.alignments.get(trace_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AlignmentResult<Alignment>)> {
        self.alignments.iter()
    }

    pub fn get_number_of_failures(&self) -> usize {
        self.alignments
            .values()
            .filter(|alignment| alignment.is_err())
            .count()
    }

    /// The mean fitness over the traces that could be aligned.
    pub fn get_average_fitness(&self) -> Option<f64> {
        let fitnesses = self
            .alignments
            .values()
            .filter_map(|alignment| alignment.as_ref().ok())
            .map(Alignment::get_fitness)
            .collect::<Vec<_>>();
        if fitnesses.is_empty() {
            None
        } else {
            Some(fitnesses.iter().sum::<f64>() / fitnesses.len() as f64)
        }
    }

    pub fn get_total_cost(&self) -> usize {
        self.alignments
            .values()
            .filter_map(|alignment| alignment.as_ref().ok())
            .map(Alignment::get_cost)
            .fold(0, usize::saturating_add)
    }

    /// The number of search states expanded over all aligned traces.
    pub fn get_states_visited(&self) -> usize {
        self.alignments
            .values()
            .filter_map(|alignment| alignment.as_ref().ok())
            .map(Alignment::get_states_visited)
            .sum()
    }
}

impl FromIterator<(String, AlignmentResult<Alignment>)> for Alignments {
    fn from_iter<T: IntoIterator<Item = (String, AlignmentResult<Alignment>)>>(iter: T) -> Self {
        Self {
            alignments: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Alignments {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.alignments.len()))?;
        for (trace_id, alignment) in &self.alignments {
            match alignment {
                Ok(alignment) => map.serialize_entry(trace_id, &Outcome::Alignment(alignment))?,
                Err(err) => map.serialize_entry(trace_id, &Outcome::Error(err.to_string()))?,
            }
        }
        map.end()
    }
}

impl Exportable for Alignments {
    fn export(&self, f: &mut dyn std::io::Write) -> Result<()> {
        Ok(write!(f, "{}", self)?)
    }
}

impl Infoable for Alignments {
    fn info(&self, f: &mut dyn std::io::Write) -> Result<()> {
        writeln!(f, "Number of traces\t{}", self.len())?;
        writeln!(f, "Number of failures\t{}", self.get_number_of_failures())?;
        writeln!(f, "Total cost\t\t{}", self.get_total_cost())?;
        if let Some(fitness) = self.get_average_fitness() {
            writeln!(f, "Average fitness\t\t{:.4}", fitness)?;
        }
        writeln!(f, "States visited\t\t{}", self.get_states_visited())?;

        let mut timeouts = 0;
        let mut unreachable = 0;
        for alignment in self.alignments.values() {
            match alignment {
                Err(AlignmentError::Timeout { .. }) => timeouts += 1,
                Err(AlignmentError::NoAlignmentFound) => unreachable += 1,
                _ => {}
            }
        }
        if timeouts > 0 {
            writeln!(f, "Timeouts\t\t{}", timeouts)?;
        }
        if unreachable > 0 {
            writeln!(f, "Unreachable\t\t{}", unreachable)?;
        }

        Ok(write!(f, "")?)
    }
}

impl Display for Alignments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", HEADER)?;
        writeln!(f, "# number of alignments\n{}", self.alignments.len())?;

        for (i, (trace_id, alignment)) in self.alignments.iter().enumerate() {
            writeln!(f, "# alignment {}", i)?;
            writeln!(f, "trace {}", trace_id)?;
            match alignment {
                Ok(alignment) => write!(f, "{}", alignment)?,
                Err(err) => writeln!(f, "error {}", err)?,
            }
        }

        write!(f, "")
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Arc};

    use crate::{
        ebi_framework::{activity_key::HasActivityKey, infoable::Infoable},
        ebi_objects::accepting_petri_net::AcceptingPetriNet,
        techniques::{
            alignment_error::AlignmentError,
            cost_function::{CostFunction, CostModel, Label},
            synchronous_product::SynchronousProduct,
        },
    };

    use super::{Alignment, Alignments, Move};

    fn alignment_of_b_against_a() -> Alignment {
        let fin = fs::read_to_string("testfiles/a.apnet").unwrap();
        let net = fin.parse::<AcceptingPetriNet>().unwrap();
        let mut activity_key = net.get_activity_key().clone();
        let trace = activity_key.process_trace(&["b"]);
        let product = SynchronousProduct::build(&trace, &net, activity_key.clone()).unwrap();
        let costs = product.costs(&CostModel::new(CostFunction::Standard));

        //transition 0 is the log move on b, transition 1 the model move on a
        Alignment::from_firing_sequence(&product, &[0, 1], &costs, 2, Arc::new(activity_key))
    }

    #[test]
    fn alignment_moves() {
        let alignment = alignment_of_b_against_a();
        let a = alignment.get_activity_key().get_activity("a").unwrap();
        let b = alignment.get_activity_key().get_activity("b").unwrap();

        assert_eq!(
            alignment.get_moves(),
            &[Move::LogMove(b), Move::ModelMove(a, 0)]
        );
        assert_eq!(alignment.get_cost(), 2);
        assert_eq!(alignment.get_fitness(), 0.0);
        assert_eq!(alignment.get_number_of_log_moves(), 1);
        assert_eq!(alignment.get_number_of_model_moves(), 1);
        assert_eq!(alignment.get_log_projection(), vec![b]);
        assert_eq!(alignment.get_model_projection(), vec![0]);
        assert_eq!(alignment.get_label_pairs()[0].model, Label::Skip);
    }

    #[test]
    fn alignments_export() {
        let mut alignments = Alignments::new();
        alignments.push("case 1".to_string(), Ok(alignment_of_b_against_a()));
        alignments.push(
            "case 2".to_string(),
            Err(AlignmentError::Timeout {
                lower_bound: Some(1),
            }),
        );

        let text = alignments.to_string();
        assert!(text.starts_with("alignments\n"));
        assert!(text.contains("trace case 1\n"));
        assert!(text.contains("log move\nlabel b\n"));
        assert!(text.contains("error timeout"));

        let json = serde_json::to_value(&alignments).unwrap();
        assert_eq!(json["case 1"]["alignment"]["cost"], 2);
        assert_eq!(json["case 1"]["alignment"]["moves"][0]["model"], ">>");
        assert_eq!(json["case 1"]["alignment"]["moves"][1]["transition"], 0);
        assert!(json["case 2"]["error"].as_str().unwrap().starts_with("timeout"));

        assert_eq!(alignments.get_number_of_failures(), 1);
        assert_eq!(alignments.get_average_fitness(), Some(0.0));
    }

    #[test]
    fn alignments_info() {
        let mut alignments = Alignments::new();
        alignments.push(
            "case 1".to_string(),
            Ok(alignment_of_b_against_a().with_states_visited(4)),
        );
        alignments.push(
            "case 2".to_string(),
            Ok(alignment_of_b_against_a().with_states_visited(3)),
        );
        alignments.push("case 3".to_string(), Err(AlignmentError::NoAlignmentFound));

        let mut f = vec![];
        alignments.info(&mut f).unwrap();
        let info = String::from_utf8(f).unwrap();

        assert!(info.contains("Number of traces\t3\n"));
        assert!(info.contains("Total cost\t\t4\n"));
        assert!(info.contains("States visited\t\t7\n"));
        assert!(info.contains("Unreachable\t\t1\n"));
    }
}
