use std::{
    fmt::{Debug, Display, Formatter},
    hash::Hasher,
};

use anyhow::Context;
use bitvec::{bitvec, vec::BitVec};

use crate::{
    ebi_framework::{activity_key::Activity, displayable::Displayable},
    ebi_objects::accepting_petri_net::{AcceptingPetriNet, TransitionIndex},
    marking::Marking,
    semantics::semantics::Semantics,
};

fn compute_enabled_transition(
    net: &AcceptingPetriNet,
    state: &mut APNMarking,
    transition: TransitionIndex,
) -> bool {
    for (in_place_pos, in_place) in net.transition2input_places[transition].iter().enumerate() {
        if state.marking.place2token[*in_place]
            < net.transition2input_places_cardinality[transition][in_place_pos]
        {
            if state.enabled_transitions[transition] {
                state.enabled_transitions.set(transition, false);
                state.number_of_enabled_transitions -= 1;
            }
            return false;
        }
    }

    if !state.enabled_transitions[transition] {
        state.enabled_transitions.set(transition, true);
        state.number_of_enabled_transitions += 1;
    }

    true
}

pub(crate) fn compute_enabled_transitions(net: &AcceptingPetriNet, state: &mut APNMarking) {
    state.number_of_enabled_transitions = 0;
    state.enabled_transitions.fill(false);
    for transition in 0..net.get_number_of_transitions() {
        compute_enabled_transition(net, state, transition);
    }
}

impl Semantics for AcceptingPetriNet {
    type SemState = APNMarking;

    fn get_initial_state(&self) -> APNMarking {
        let mut result = APNMarking {
            marking: self.initial_marking.clone(),
            enabled_transitions: bitvec![0; self.get_number_of_transitions()],
            number_of_enabled_transitions: 0,
        };
        compute_enabled_transitions(self, &mut result);
        result
    }

    fn execute_transition(
        &self,
        state: &mut APNMarking,
        transition: TransitionIndex,
    ) -> anyhow::Result<()> {
        for (place_pos, place) in self.transition2input_places[transition].iter().enumerate() {
            let arc_weight = self.transition2input_places_cardinality[transition][place_pos];
            state
                .marking
                .decrease(*place, arc_weight)
                .with_context(|| format!("transition {} is not enabled", transition))?;

            //some transitions might be disabled by this execution
            for transition_t in &self.place2output_transitions[*place] {
                compute_enabled_transition(self, state, *transition_t);
            }
        }

        for (place_pos, place) in self.transition2output_places[transition].iter().enumerate() {
            let arc_weight = self.transition2output_places_cardinality[transition][place_pos];
            state
                .marking
                .increase(*place, arc_weight)
                .with_context(|| format!("when firing transition {}", transition))?;

            //some transitions might be enabled by this execution
            for transition_t in &self.place2output_transitions[*place] {
                compute_enabled_transition(self, state, *transition_t);
            }
        }

        Ok(())
    }

    fn is_final_state(&self, state: &APNMarking) -> bool {
        state.marking == self.final_marking
    }

    fn is_transition_silent(&self, transition: TransitionIndex) -> bool {
        self.labels[transition].is_none()
    }

    fn get_transition_activity(&self, transition: TransitionIndex) -> Option<Activity> {
        self.labels[transition]
    }

    fn get_enabled_transitions(&self, state: &APNMarking) -> Vec<TransitionIndex> {
        let mut result = Vec::with_capacity(state.number_of_enabled_transitions);
        result.extend(state.enabled_transitions.iter_ones());
        result
    }

    fn get_number_of_transitions(&self) -> usize {
        self.transition2input_places.len()
    }
}

/// A marking together with the set of transitions it enables.
/// Equality and hashing only consider the marking.
#[derive(Clone)]
pub struct APNMarking {
    pub(crate) marking: Marking,
    pub(crate) enabled_transitions: BitVec,
    pub(crate) number_of_enabled_transitions: usize,
}

impl APNMarking {
    pub fn get_marking(&self) -> &Marking {
        &self.marking
    }
}

impl Displayable for APNMarking {}

impl Eq for APNMarking {}

impl std::hash::Hash for APNMarking {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.marking.hash(state);
    }
}

impl PartialEq for APNMarking {
    fn eq(&self, other: &Self) -> bool {
        self.marking == other.marking
    }
}

impl Display for APNMarking {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.marking)
    }
}

impl Debug for APNMarking {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.marking)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::{
        ebi_objects::accepting_petri_net::AcceptingPetriNet, semantics::semantics::Semantics,
    };

    #[test]
    fn apnet_walk_to_final_marking() {
        let fin = fs::read_to_string("testfiles/a-b-tau.apnet").unwrap();
        let net = fin.parse::<AcceptingPetriNet>().unwrap();

        let mut state = net.get_initial_state();
        assert!(!net.is_final_state(&state));
        assert_eq!(net.get_enabled_transitions(&state), vec![0]);

        net.execute_transition(&mut state, 0).unwrap();
        assert_eq!(net.get_enabled_transitions(&state), vec![1, 2]);

        net.execute_transition(&mut state, 2).unwrap();
        assert!(net.is_final_state(&state));
        assert!(net.get_enabled_transitions(&state).is_empty());
    }

    #[test]
    fn apnet_disabled_transition() {
        let fin = fs::read_to_string("testfiles/a-b-tau.apnet").unwrap();
        let net = fin.parse::<AcceptingPetriNet>().unwrap();

        let mut state = net.get_initial_state();
        assert!(net.execute_transition(&mut state, 1).is_err());
    }
}
