use serde::Serialize;

use crate::{
    ebi_framework::activity_key::{Activity, ActivityKey},
    ebi_objects::accepting_petri_net::{AcceptingPetriNet, TransitionIndex},
    marking::Marking,
    techniques::{
        alignment_error::{AlignmentError, AlignmentResult},
        cost_function::{CostModel, Label, LabelPair},
    },
};

/// What a transition of the synchronous product stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ProductMove {
    /// The event at `position` of the trace is not explained by the model.
    LogMove { position: usize, activity: Activity },

    /// The model fires `transition` without a corresponding event; `activity` is `None` for silent transitions.
    ModelMove {
        transition: TransitionIndex,
        activity: Option<Activity>,
    },

    /// The event at `position` is explained by firing `transition`.
    SynchronousMove {
        position: usize,
        activity: Activity,
        transition: TransitionIndex,
    },
}

impl ProductMove {
    pub fn label_pair(&self) -> LabelPair {
        match self {
            ProductMove::LogMove { activity, .. } => {
                LabelPair::new(Label::Activity(*activity), Label::Skip)
            }
            ProductMove::ModelMove {
                activity: Some(activity),
                ..
            } => LabelPair::new(Label::Skip, Label::Activity(*activity)),
            ProductMove::ModelMove { activity: None, .. } => {
                LabelPair::new(Label::Skip, Label::Silent)
            }
            ProductMove::SynchronousMove { activity, .. } => {
                LabelPair::new(Label::Activity(*activity), Label::Activity(*activity))
            }
        }
    }

    pub fn is_synchronous(&self) -> bool {
        matches!(self, ProductMove::SynchronousMove { .. })
    }
}

/// The synchronous product of a trace and an accepting Petri net.
///
/// Places `0..=|trace|` form the trace chain: a token in place `i` means that the first `i` events have been explained.
/// The places of the model follow, shifted by `|trace| + 1`.
#[derive(Clone, Debug)]
pub struct SynchronousProduct {
    net: AcceptingPetriNet,
    moves: Vec<ProductMove>,
    trace_length: usize,
    model_places: usize,
}

impl SynchronousProduct {
    /// Builds the product. The trace must be expressed in `activity_key`, which must extend the activity key of `model`.
    pub fn build(
        trace: &[Activity],
        model: &AcceptingPetriNet,
        activity_key: ActivityKey,
    ) -> AlignmentResult<Self> {
        model.validate_structure()?;

        let trace_length = trace.len();
        let offset = trace_length + 1;
        let mut net = AcceptingPetriNet::new();
        net.activity_key = activity_key;
        let mut moves = vec![];

        for _ in 0..offset + model.get_number_of_places() {
            net.add_place();
        }

        //markings
        increase(net.get_initial_marking_mut(), 0, 1)?;
        increase(net.get_final_marking_mut(), trace_length, 1)?;
        for place in 0..model.get_number_of_places() {
            increase(
                net.get_initial_marking_mut(),
                offset + place,
                model.get_initial_marking().get_tokens(place),
            )?;
            increase(
                net.get_final_marking_mut(),
                offset + place,
                model.get_final_marking().get_tokens(place),
            )?;
        }

        //log moves
        for (position, activity) in trace.iter().enumerate() {
            let transition = net.add_transition(Some(*activity));
            add_trace_step(&mut net, transition, position)?;
            moves.push(ProductMove::LogMove {
                position,
                activity: *activity,
            });
        }

        //model moves
        for model_transition in 0..model.get_number_of_transitions() {
            let activity = model.get_transition_label(model_transition);
            let transition = net.add_transition(activity);
            mirror_model_arcs(&mut net, model, model_transition, transition, offset)?;
            moves.push(ProductMove::ModelMove {
                transition: model_transition,
                activity,
            });
        }

        //synchronous moves
        for (position, activity) in trace.iter().enumerate() {
            for model_transition in 0..model.get_number_of_transitions() {
                if model.get_transition_label(model_transition) == Some(*activity) {
                    let transition = net.add_transition(Some(*activity));
                    add_trace_step(&mut net, transition, position)?;
                    mirror_model_arcs(&mut net, model, model_transition, transition, offset)?;
                    moves.push(ProductMove::SynchronousMove {
                        position,
                        activity: *activity,
                        transition: model_transition,
                    });
                }
            }
        }

        log::trace!(
            "synchronous product with {} places and {} transitions",
            net.get_number_of_places(),
            net.get_number_of_transitions()
        );

        Ok(Self {
            net,
            moves,
            trace_length,
            model_places: model.get_number_of_places(),
        })
    }

    pub fn get_net(&self) -> &AcceptingPetriNet {
        &self.net
    }

    pub fn get_activity_key(&self) -> &ActivityKey {
        &self.net.activity_key
    }

    pub fn get_move(&self, transition: TransitionIndex) -> &ProductMove {
        &self.moves[transition]
    }

    pub fn get_moves(&self) -> &[ProductMove] {
        &self.moves
    }

    pub fn get_trace_length(&self) -> usize {
        self.trace_length
    }

    /// The cost of every product transition, indexed by transition.
    pub fn costs(&self, cost_model: &CostModel) -> Vec<usize> {
        self.moves
            .iter()
            .map(|movee| cost_model.cost(&movee.label_pair()))
            .collect()
    }

    /// Returns the number of events that have been explained in a product marking.
    pub fn trace_position(&self, marking: &Marking) -> Option<usize> {
        (0..=self.trace_length).find(|place| marking.get_tokens(*place) > 0)
    }

    /// Returns the part of a product marking that concerns the model.
    pub fn model_marking(&self, marking: &Marking) -> Marking {
        let offset = self.trace_length + 1;
        marking.get_place2token()[offset..offset + self.model_places]
            .to_vec()
            .into()
    }
}

fn increase(marking: &mut Marking, place: usize, tokens: u64) -> AlignmentResult<()> {
    marking
        .increase(place, tokens)
        .map_err(|err| AlignmentError::MalformedModel(err.to_string()))
}

fn add_trace_step(
    net: &mut AcceptingPetriNet,
    transition: TransitionIndex,
    position: usize,
) -> AlignmentResult<()> {
    net.add_place_transition_arc(position, transition, 1)
        .and_then(|_| net.add_transition_place_arc(transition, position + 1, 1))
        .map_err(|err| AlignmentError::MalformedModel(err.to_string()))
}

fn mirror_model_arcs(
    net: &mut AcceptingPetriNet,
    model: &AcceptingPetriNet,
    model_transition: TransitionIndex,
    transition: TransitionIndex,
    offset: usize,
) -> AlignmentResult<()> {
    for (place, cardinality) in model
        .get_input_places(model_transition)
        .iter()
        .zip(model.get_input_places_cardinality(model_transition))
    {
        net.add_place_transition_arc(offset + place, transition, *cardinality)
            .map_err(|err| AlignmentError::MalformedModel(err.to_string()))?;
    }
    for (place, cardinality) in model
        .get_output_places(model_transition)
        .iter()
        .zip(model.get_output_places_cardinality(model_transition))
    {
        net.add_transition_place_arc(transition, offset + place, *cardinality)
            .map_err(|err| AlignmentError::MalformedModel(err.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::{
        ebi_framework::activity_key::HasActivityKey,
        ebi_objects::accepting_petri_net::AcceptingPetriNet,
        marking::Marking,
        techniques::{
            alignment_error::AlignmentError,
            cost_function::{CostFunction, CostModel},
        },
    };

    use super::{ProductMove, SynchronousProduct};

    #[test]
    fn product_structure() {
        let fin = fs::read_to_string("testfiles/a-b-tau.apnet").unwrap();
        let net = fin.parse::<AcceptingPetriNet>().unwrap();
        let mut activity_key = net.get_activity_key().clone();
        let trace = activity_key.process_trace(&["a", "b"]);

        let product = SynchronousProduct::build(&trace, &net, activity_key).unwrap();

        assert_eq!(product.get_net().get_number_of_places(), 6);
        //2 log moves, 3 model moves, 2 synchronous moves
        assert_eq!(product.get_net().get_number_of_transitions(), 7);
        assert_eq!(
            product.get_net().get_initial_marking(),
            &Marking::from(vec![1, 0, 0, 1, 0, 0])
        );
        assert_eq!(
            product.get_net().get_final_marking(),
            &Marking::from(vec![0, 0, 1, 0, 0, 1])
        );
        assert_eq!(
            product
                .get_moves()
                .iter()
                .filter(|movee| movee.is_synchronous())
                .count(),
            2
        );
        assert_eq!(
            product.get_move(6),
            &ProductMove::SynchronousMove {
                position: 1,
                activity: trace[1],
                transition: 1
            }
        );

        assert_eq!(
            product.trace_position(product.get_net().get_final_marking()),
            Some(2)
        );
        assert_eq!(
            product.model_marking(product.get_net().get_initial_marking()),
            Marking::from(vec![1, 0, 0])
        );

        let costs = product.costs(&CostModel::new(CostFunction::Standard));
        assert_eq!(costs, vec![1, 1, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn product_unknown_activity_does_not_synchronise() {
        let fin = fs::read_to_string("testfiles/a.apnet").unwrap();
        let net = fin.parse::<AcceptingPetriNet>().unwrap();
        let mut activity_key = net.get_activity_key().clone();
        let trace = activity_key.process_trace(&["z"]);

        let product = SynchronousProduct::build(&trace, &net, activity_key).unwrap();

        assert!(!product.get_moves().iter().any(|movee| movee.is_synchronous()));
    }

    #[test]
    fn product_of_malformed_model() {
        let fin = fs::read_to_string("testfiles/malformed.apnet").unwrap();
        let net = fin.parse::<AcceptingPetriNet>().unwrap();
        let activity_key = net.get_activity_key().clone();

        assert!(matches!(
            SynchronousProduct::build(&[], &net, activity_key),
            Err(AlignmentError::MalformedModel(_))
        ));
    }
}
