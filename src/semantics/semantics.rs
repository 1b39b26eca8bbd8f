use anyhow::Result;
use std::fmt::Debug;

use crate::{
    ebi_framework::{
        activity_key::{Activity, HasActivityKey},
        displayable::Displayable,
    },
    ebi_objects::accepting_petri_net::TransitionIndex,
};

pub trait Semantics: Debug + Send + Sync + HasActivityKey {
    type SemState: Displayable;

    /// Returns the initial state.
    fn get_initial_state(&self) -> <Self as Semantics>::SemState;

    /// Update the state to reflect execution of `transition`.
    /// Returns an error when `transition` is not enabled, or when the marking cannot be represented.
    /// This alters the state to avoid repeated memory allocations in simple walkthroughs.
    fn execute_transition(
        &self,
        state: &mut <Self as Semantics>::SemState,
        transition: TransitionIndex,
    ) -> Result<()>;

    /// Returns whether the current state is an accepting state.
    /// Unlike deadlocks, an accepting state may still have enabled transitions.
    fn is_final_state(&self, state: &<Self as Semantics>::SemState) -> bool;

    fn is_transition_silent(&self, transition: TransitionIndex) -> bool;

    fn get_transition_activity(&self, transition: TransitionIndex) -> Option<Activity>;

    /// Returns the enabled transitions in `state`, in increasing order.
    fn get_enabled_transitions(
        &self,
        state: &<Self as Semantics>::SemState,
    ) -> Vec<TransitionIndex>;

    fn get_number_of_transitions(&self) -> usize;
}
