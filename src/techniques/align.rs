use rayon::prelude::*;
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

use crate::{
    ebi_framework::{
        activity_key::{Activity, ActivityKey, HasActivityKey},
        ebi_command::EbiCommand,
    },
    ebi_objects::{
        accepting_petri_net::{AcceptingPetriNet, TransitionIndex},
        alignments::{Alignment, Alignments},
    },
    ebi_traits::ebi_trait_event_log::EbiTraitEventLog,
    math::astar::{SearchFailure, SearchOutcome, astar},
    semantics::semantics::Semantics,
    techniques::{
        alignment_error::{AlignmentError, AlignmentResult},
        cost_function::{CostFunction, CostModel},
        marking_equation::MarkingEquation,
        synchronous_product::{ProductMove, SynchronousProduct},
    },
};

/// The lower bound that guides the search towards the final marking.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, EnumString, IntoStaticStr, VariantNames, Display,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Heuristic {
    /// No guidance: the search is Dijkstra's algorithm.
    None,
    #[default]
    MarkingEquation,
}

#[derive(Clone, Debug, Default)]
pub struct AlignmentConfig {
    pub cost_function: CostFunction,
    /// Deviation costs per activity label, replacing those of the cost function.
    pub cost_overrides: HashMap<String, usize>,
    pub heuristic: Heuristic,
    /// Per trace.
    pub timeout: Option<Duration>,
}

impl AlignmentConfig {
    pub fn cost_model(&self, activity_key: &ActivityKey) -> AlignmentResult<CostModel> {
        CostModel::with_overrides(self.cost_function, &self.cost_overrides, activity_key)
    }

    fn deadline(&self) -> Option<Instant> {
        self.timeout.map(|timeout| Instant::now() + timeout)
    }
}

/// Computes an optimal alignment of a trace, given as activity labels, against an accepting Petri net.
pub fn align<S: AsRef<str>>(
    trace: &[S],
    net: &AcceptingPetriNet,
    config: &AlignmentConfig,
) -> AlignmentResult<Alignment> {
    let mut activity_key = net.get_activity_key().clone();
    let trace = activity_key.process_trace(trace);
    align_trace_activities(&trace, net, &Arc::new(activity_key), config)
}

/// Computes an optimal alignment of a trace that is expressed in `activity_key`,
/// which must extend the activity key of `net`.
///
/// The timeout covers all the work for the trace, including the cheapest run of the model.
pub fn align_trace_activities(
    trace: &[Activity],
    net: &AcceptingPetriNet,
    activity_key: &Arc<ActivityKey>,
    config: &AlignmentConfig,
) -> AlignmentResult<Alignment> {
    align_trace_until(trace, net, activity_key, config, config.deadline())
}

fn align_trace_until(
    trace: &[Activity],
    net: &AcceptingPetriNet,
    activity_key: &Arc<ActivityKey>,
    config: &AlignmentConfig,
    deadline: Option<Instant>,
) -> AlignmentResult<Alignment> {
    let cost_model = config.cost_model(activity_key)?;
    let model_cost = model_run_cost(net, activity_key, &cost_model, config.heuristic, deadline)?;
    align_with_model_cost(
        trace,
        net,
        activity_key,
        &cost_model,
        model_cost,
        config.heuristic,
        deadline,
    )
}

/// Aligns every trace of the log against the net, in parallel.
/// A trace that cannot be aligned gets its error; the other traces are not affected.
pub fn align_log(
    log: &dyn EbiTraitEventLog,
    net: &AcceptingPetriNet,
    config: &AlignmentConfig,
) -> Alignments {
    //bring the traces into one activity key that extends the one of the net
    let mut activity_key = net.get_activity_key().clone();
    let traces = (0..log.get_number_of_traces())
        .filter_map(|trace_index| {
            let trace_id = log.get_trace_id(trace_index)?.to_string();
            let trace = activity_key.process_trace(&log.get_trace_labels(trace_index)?);
            Some((trace_id, trace))
        })
        .collect::<Vec<_>>();
    let activity_key = Arc::new(activity_key);

    log::info!(
        "align {} traces with the {} cost function",
        traces.len(),
        config.cost_function
    );

    //shared by all traces; the model run gets a timeout of its own
    let model = config.cost_model(&activity_key).and_then(|cost_model| {
        let model_cost = model_run_cost(
            net,
            &activity_key,
            &cost_model,
            config.heuristic,
            config.deadline(),
        )?;
        Ok((cost_model, model_cost))
    });

    let progress_bar = EbiCommand::get_progress_bar(traces.len());
    let result = traces
        .par_iter()
        .map(|(trace_id, trace)| {
            let deadline = config.deadline();
            let alignment = match &model {
                Ok((cost_model, model_cost)) => align_with_model_cost(
                    trace,
                    net,
                    &activity_key,
                    cost_model,
                    *model_cost,
                    config.heuristic,
                    deadline,
                ),
                Err(err) => Err(err.clone()),
            };
            progress_bar.inc(1);
            (trace_id.clone(), alignment)
        })
        .collect::<Vec<_>>();
    progress_bar.finish_and_clear();

    result.into_iter().collect()
}

/// The cost of the cheapest run of the model, that is, of aligning the empty trace.
pub fn model_run_cost(
    net: &AcceptingPetriNet,
    activity_key: &ActivityKey,
    cost_model: &CostModel,
    heuristic: Heuristic,
    deadline: Option<Instant>,
) -> AlignmentResult<usize> {
    let product = SynchronousProduct::build(&[], net, activity_key.clone())?;
    let costs = product.costs(cost_model);
    match search(&product, &costs, heuristic, deadline) {
        Ok(outcome) => Ok(outcome.cost),
        //a bound on the model run says nothing about the trace
        Err(AlignmentError::Timeout { .. }) => Err(AlignmentError::Timeout { lower_bound: None }),
        Err(err) => Err(err),
    }
}

fn align_with_model_cost(
    trace: &[Activity],
    net: &AcceptingPetriNet,
    activity_key: &Arc<ActivityKey>,
    cost_model: &CostModel,
    model_cost: usize,
    heuristic: Heuristic,
    deadline: Option<Instant>,
) -> AlignmentResult<Alignment> {
    let product = SynchronousProduct::build(trace, net, activity_key.as_ref().clone())?;
    let costs = product.costs(cost_model);

    let worst_case_cost = product
        .get_moves()
        .iter()
        .zip(costs.iter())
        .filter(|(movee, _)| matches!(movee, ProductMove::LogMove { .. }))
        .try_fold(model_cost, |total, (_, cost)| total.checked_add(*cost))
        .ok_or_else(|| {
            AlignmentError::CostOutOfRange(
                "the cost of the worst-case alignment does not fit".to_string(),
            )
        })?;

    let outcome = search(&product, &costs, heuristic, deadline)?;

    Ok(Alignment::from_firing_sequence(
        &product,
        &outcome.edges,
        &costs,
        worst_case_cost,
        Arc::clone(activity_key),
    )
    .with_states_visited(outcome.states_visited))
}

/// Finds a cheapest firing sequence from the initial to the final marking of the product.
fn search(
    product: &SynchronousProduct,
    costs: &[usize],
    heuristic: Heuristic,
    deadline: Option<Instant>,
) -> AlignmentResult<SearchOutcome<TransitionIndex, usize>> {
    let net = product.get_net();
    let mut equation = match heuristic {
        Heuristic::None => None,
        Heuristic::MarkingEquation => Some(MarkingEquation::new(net, costs)),
    };

    let result = astar(
        &net.get_initial_state(),
        |state| {
            net.get_enabled_transitions(state)
                .into_iter()
                .filter_map(|transition| {
                    let mut successor = state.clone();
                    net.execute_transition(&mut successor, transition).ok()?;
                    Some((successor, transition, costs[transition]))
                })
                .collect::<Vec<_>>()
        },
        |state| match equation.as_mut() {
            Some(equation) => equation.estimate(state.get_marking()),
            None => Some(0),
        },
        |state, transition| {
            //prefer synchronous moves, then progress in the trace
            (
                product.get_move(*transition).is_synchronous(),
                product.trace_position(state.get_marking()).unwrap_or(0),
            )
        },
        |state| net.is_final_state(state),
        deadline,
    );

    let solved = equation
        .as_ref()
        .map_or(0, MarkingEquation::get_number_of_solved);

    match result {
        Ok(outcome) => {
            log::debug!(
                "aligned a trace of length {} with cost {}; {} states visited, {} reached, {} linear programs solved",
                product.get_trace_length(),
                outcome.cost,
                outcome.states_visited,
                outcome.states_reached,
                solved
            );
            Ok(outcome)
        }
        Err(SearchFailure::Exhausted { states_visited }) => {
            log::debug!(
                "no alignment for a trace of length {}; {} states visited",
                product.get_trace_length(),
                states_visited
            );
            Err(AlignmentError::NoAlignmentFound)
        }
        Err(SearchFailure::Overflow { states_visited }) => {
            log::debug!(
                "cost overflow for a trace of length {}; {} states visited",
                product.get_trace_length(),
                states_visited
            );
            Err(AlignmentError::CostOutOfRange(
                "the cost of a partial alignment does not fit".to_string(),
            ))
        }
        Err(SearchFailure::Timeout {
            lower_bound,
            states_visited,
        }) => {
            log::debug!(
                "timeout for a trace of length {} with lower bound {}; {} states visited",
                product.get_trace_length(),
                lower_bound,
                states_visited
            );
            Err(AlignmentError::Timeout {
                lower_bound: Some(lower_bound),
            })
        }
    }
}
