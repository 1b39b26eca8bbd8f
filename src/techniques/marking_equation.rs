use microlp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem};
use rustc_hash::FxHashMap;

use crate::{ebi_objects::accepting_petri_net::AcceptingPetriNet, marking::Marking};

const EPSILON: f64 = 1e-6;

/// Lower bound on the remaining cost to reach the final marking, by the linear relaxation of the marking equation:
/// minimise `costs · x` such that `m + C · x = m_final` and `x ≥ 0`, where `C` is the incidence matrix.
///
/// An infeasible equation proves that the final marking is unreachable from `m`.
/// Estimates are cached per marking.
pub struct MarkingEquation {
    place2incidence: Vec<Vec<(usize, f64)>>,
    costs: Vec<f64>,
    final_marking: Marking,
    cache: FxHashMap<Marking, Option<usize>>,
    solved: usize,
}

impl MarkingEquation {
    pub fn new(net: &AcceptingPetriNet, costs: &[usize]) -> Self {
        let mut place2incidence = vec![vec![]; net.get_number_of_places()];

        for transition in 0..net.get_number_of_transitions() {
            let mut effect: FxHashMap<usize, i64> = FxHashMap::default();
            for (place, cardinality) in net
                .get_input_places(transition)
                .iter()
                .zip(net.get_input_places_cardinality(transition))
            {
                *effect.entry(*place).or_default() -= *cardinality as i64;
            }
            for (place, cardinality) in net
                .get_output_places(transition)
                .iter()
                .zip(net.get_output_places_cardinality(transition))
            {
                *effect.entry(*place).or_default() += *cardinality as i64;
            }

            let mut effect = effect.into_iter().collect::<Vec<_>>();
            effect.sort_unstable();
            for (place, coefficient) in effect {
                if coefficient != 0 {
                    place2incidence[place].push((transition, coefficient as f64));
                }
            }
        }

        Self {
            place2incidence,
            costs: costs.iter().map(|cost| *cost as f64).collect(),
            final_marking: net.get_final_marking().clone(),
            cache: FxHashMap::default(),
            solved: 0,
        }
    }

    /// Returns `None` if the final marking cannot be reached from `marking`.
    pub fn estimate(&mut self, marking: &Marking) -> Option<usize> {
        if let Some(result) = self.cache.get(marking) {
            return *result;
        }

        let result = self.solve(marking);
        self.cache.insert(marking.clone(), result);
        result
    }

    /// The number of linear programs that have been solved so far.
    pub fn get_number_of_solved(&self) -> usize {
        self.solved
    }

    fn solve(&mut self, marking: &Marking) -> Option<usize> {
        self.solved += 1;

        let mut problem = Problem::new(OptimizationDirection::Minimize);
        let variables = self
            .costs
            .iter()
            .map(|cost| problem.add_var(*cost, (0.0, f64::INFINITY)))
            .collect::<Vec<_>>();

        for (place, incidence) in self.place2incidence.iter().enumerate() {
            let rhs = self.final_marking.get_tokens(place) as f64 - marking.get_tokens(place) as f64;

            if incidence.is_empty() {
                if rhs != 0.0 {
                    //no transition can change this place
                    return None;
                }
                continue;
            }

            let mut expr = LinearExpr::empty();
            for (transition, coefficient) in incidence {
                expr.add(variables[*transition], *coefficient);
            }
            problem.add_constraint(expr, ComparisonOp::Eq, rhs);
        }

        match problem.solve() {
            Ok(solution) => Some((solution.objective() - EPSILON).ceil().max(0.0) as usize),
            Err(microlp::Error::Infeasible) => None,
            Err(err) => {
                //zero is always a lower bound
                log::debug!("marking equation could not be solved for {}: {}", marking, err);
                Some(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::{
        ebi_framework::activity_key::HasActivityKey,
        ebi_objects::accepting_petri_net::AcceptingPetriNet,
        techniques::{
            cost_function::{CostFunction, CostModel},
            synchronous_product::SynchronousProduct,
        },
    };

    use super::MarkingEquation;

    fn build_equation(model: &str, trace: &[&str]) -> (SynchronousProduct, MarkingEquation) {
        let fin = fs::read_to_string(model).unwrap();
        let net = fin.parse::<AcceptingPetriNet>().unwrap();
        let mut activity_key = net.get_activity_key().clone();
        let trace = activity_key.process_trace(trace);
        let product = SynchronousProduct::build(&trace, &net, activity_key).unwrap();
        let costs = product.costs(&CostModel::new(CostFunction::Standard));
        let equation = MarkingEquation::new(product.get_net(), &costs);
        (product, equation)
    }

    #[test]
    fn marking_equation_perfect_trace() {
        let (product, mut equation) = build_equation("testfiles/a-b-tau.apnet", &["a", "b"]);
        let initial = product.get_net().get_initial_marking().clone();

        assert_eq!(equation.estimate(&initial), Some(0));
    }

    #[test]
    fn marking_equation_deviating_trace() {
        let (product, mut equation) = build_equation("testfiles/a.apnet", &["b"]);
        let initial = product.get_net().get_initial_marking().clone();

        assert_eq!(equation.estimate(&initial), Some(2));
        assert_eq!(equation.estimate(&initial), Some(2));
        assert_eq!(equation.get_number_of_solved(), 1);
    }

    #[test]
    fn marking_equation_unreachable() {
        let (product, mut equation) = build_equation("testfiles/unreachable.apnet", &["a"]);
        let initial = product.get_net().get_initial_marking().clone();

        assert_eq!(equation.estimate(&initial), None);
    }
}
