// This file contains code derived from pathfinding,
// which is dual-licensed under Apache 2.0 and MIT licenses.
// The original code has been modified to support dead ends, tie-breaking priorities and deadlines.
// For more information, see https://github.com/evenfurther/pathfinding?tab=readme-ov-file#license

use indexmap::IndexMap;
use indexmap::map::Entry::{Occupied, Vacant};
use num_traits::{CheckedAdd, Zero};
use rustc_hash::FxHasher;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::hash::BuildHasherDefault;
use std::hash::Hash;
use std::time::Instant;

type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome<E, C> {
    /// The edges of the path, from the start node to the goal.
    pub edges: Vec<E>,
    pub cost: C,
    /// The number of nodes that were expanded.
    pub states_visited: usize,
    /// The number of distinct nodes that were reached.
    pub states_reached: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFailure<C> {
    /// Every reachable node has been expanded without reaching the goal.
    Exhausted { states_visited: usize },

    /// The deadline passed. `lower_bound` is the estimated cost of the last node taken from the frontier.
    Timeout { lower_bound: C, states_visited: usize },

    /// The cost of a path, or its estimate, does not fit in `C`.
    Overflow { states_visited: usize },
}

struct ArenaEntry<E, C> {
    parent: usize,
    edge: Option<E>,
    cost: C,
    heuristic: Option<C>,
}

fn reverse_edges<N, E: Clone, C>(arena: &FxIndexMap<N, ArenaEntry<E, C>>, start: usize) -> Vec<E> {
    let mut i = start;
    let edges = std::iter::from_fn(|| {
        arena.get_index(i).and_then(|(_, entry)| {
            i = entry.parent;
            entry.edge.as_ref()
        })
    })
    .collect::<Vec<&E>>();
    // The iterator walks from the goal to the start and is not double-ended.
    edges.into_iter().rev().cloned().collect()
}

/// Compute a shortest path using the [A* search
/// algorithm](https://en.wikipedia.org/wiki/A*_search_algorithm).
///
/// - `start` is the starting node.
/// - `successors` returns the successors of a node, along with the edge that leads to the successor and the cost of
///   taking that edge. This cost must be non-negative.
/// - `heuristic` returns an approximation of the cost from a given node to the goal, which must not exceed the real
///   cost. A node for which it returns `None` cannot reach the goal and is never expanded.
/// - `priority` ranks nodes with equal estimated total cost: the highest priority is expanded first. Remaining ties
///   are broken in the order in which the nodes were put on the frontier, which keeps the search deterministic.
/// - `success` checks whether the goal has been reached.
/// - `deadline` is checked every time a node is taken from the frontier.
///
/// A node that is reached again with a strictly lower cost is updated and put on the frontier again.
pub fn astar<N, E, C, P, FN, IN, FH, FP, FS>(
    start: &N,
    mut successors: FN,
    mut heuristic: FH,
    mut priority: FP,
    mut success: FS,
    deadline: Option<Instant>,
) -> Result<SearchOutcome<E, C>, SearchFailure<C>>
where
    N: Eq + Hash + Clone,
    E: Clone,
    C: Zero + Ord + Clone + CheckedAdd,
    P: Ord + Default,
    FN: FnMut(&N) -> IN,
    IN: IntoIterator<Item = (N, E, C)>,
    FH: FnMut(&N) -> Option<C>,
    FP: FnMut(&N, &E) -> P,
    FS: FnMut(&N) -> bool,
{
    let mut arena: FxIndexMap<N, ArenaEntry<E, C>> = FxIndexMap::default();
    let start_heuristic = heuristic(start);
    arena.insert(
        start.clone(),
        ArenaEntry {
            parent: usize::MAX,
            edge: None,
            cost: Zero::zero(),
            heuristic: start_heuristic.clone(),
        },
    );

    let mut to_see = BinaryHeap::new();
    let mut sequence = 0;
    if let Some(h) = start_heuristic {
        to_see.push(SmallestCostHolder {
            estimated_cost: h,
            cost: Zero::zero(),
            priority: P::default(),
            sequence,
            index: 0,
        });
    }

    let mut states_visited = 0;
    while let Some(SmallestCostHolder {
        estimated_cost,
        cost,
        index,
        ..
    }) = to_see.pop()
    {
        let successors = {
            let (node, entry) = match arena.get_index(index) {
                Some(x) => x,
                None => continue,
            };

            // A node may be on the frontier several times if a better way to reach it was found.
            // Only the entry with the best cost is expanded.
            if cost > entry.cost {
                continue;
            }
            states_visited += 1;

            if success(node) {
                return Ok(SearchOutcome {
                    edges: reverse_edges(&arena, index),
                    cost,
                    states_visited,
                    states_reached: arena.len(),
                });
            }

            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Err(SearchFailure::Timeout {
                        lower_bound: estimated_cost,
                        states_visited,
                    });
                }
            }

            successors(node)
        };

        for (successor, edge, move_cost) in successors {
            let Some(new_cost) = cost.checked_add(&move_cost) else {
                return Err(SearchFailure::Overflow { states_visited });
            };
            let successor_priority = priority(&successor, &edge);
            let h; // heuristic(&successor)
            let n; // index for successor
            match arena.entry(successor) {
                Vacant(e) => {
                    h = heuristic(e.key());
                    n = e.index();
                    e.insert(ArenaEntry {
                        parent: index,
                        edge: Some(edge),
                        cost: new_cost.clone(),
                        heuristic: h.clone(),
                    });
                }
                Occupied(mut e) => {
                    if e.get().cost > new_cost && e.get().heuristic.is_some() {
                        h = e.get().heuristic.clone();
                        n = e.index();
                        let entry = e.get_mut();
                        entry.parent = index;
                        entry.edge = Some(edge);
                        entry.cost = new_cost.clone();
                    } else {
                        continue;
                    }
                }
            }

            //dead ends are recorded, but never put on the frontier
            if let Some(h) = h {
                let Some(estimated_cost) = new_cost.checked_add(&h) else {
                    return Err(SearchFailure::Overflow { states_visited });
                };
                sequence += 1;
                to_see.push(SmallestCostHolder {
                    estimated_cost,
                    cost: new_cost,
                    priority: successor_priority,
                    sequence,
                    index: n,
                });
            }
        }
    }

    Err(SearchFailure::Exhausted { states_visited })
}

/// This structure is used to implement Rust's max-heap as a min-heap
/// version for A*. The smallest `estimated_cost` (which is the sum of
/// the `cost` and the heuristic) is preferred. For the same
/// `estimated_cost`, the highest `priority` is favoured, and then the
/// entry that was pushed first.
struct SmallestCostHolder<K, P> {
    estimated_cost: K,
    cost: K,
    priority: P,
    sequence: usize,
    index: usize,
}

impl<K: Ord, P: Ord> PartialEq for SmallestCostHolder<K, P> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: Ord, P: Ord> Eq for SmallestCostHolder<K, P> {}

impl<K: Ord, P: Ord> PartialOrd for SmallestCostHolder<K, P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord, P: Ord> Ord for SmallestCostHolder<K, P> {
    fn cmp(&self, other: &Self) -> Ordering {
        match other.estimated_cost.cmp(&self.estimated_cost) {
            Ordering::Equal => match self.priority.cmp(&other.priority) {
                Ordering::Equal => other.sequence.cmp(&self.sequence),
                s => s,
            },
            s => s,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::{SearchFailure, astar};

    /// (from, to, edge, cost)
    type Graph = Vec<(usize, usize, &'static str, usize)>;

    fn successors(graph: &Graph, node: usize) -> Vec<(usize, &'static str, usize)> {
        graph
            .iter()
            .filter(|(from, _, _, _)| *from == node)
            .map(|(_, to, edge, cost)| (*to, *edge, *cost))
            .collect()
    }

    #[test]
    fn astar_reopens_cheaper_path() {
        let graph: Graph = vec![
            (0, 1, "expensive", 5),
            (0, 2, "detour", 1),
            (2, 1, "back", 1),
            (1, 3, "goal", 1),
        ];

        let result = astar(
            &0,
            |node| successors(&graph, *node),
            |_| Some(0),
            |_, _| 0,
            |node| *node == 3,
            None,
        )
        .unwrap();

        assert_eq!(result.cost, 3);
        assert_eq!(result.edges, vec!["detour", "back", "goal"]);
    }

    #[test]
    fn astar_ties_are_first_in_first_out() {
        let graph: Graph = vec![(0, 1, "a", 1), (0, 2, "b", 1), (1, 3, "c", 1), (2, 3, "d", 1)];

        let result = astar(
            &0,
            |node| successors(&graph, *node),
            |_| Some(0),
            |_, _| 0,
            |node| *node == 3,
            None,
        )
        .unwrap();

        assert_eq!(result.edges, vec!["a", "c"]);
    }

    #[test]
    fn astar_ties_follow_priority() {
        let graph: Graph = vec![(0, 1, "a", 1), (0, 2, "b", 1), (1, 3, "c", 1), (2, 3, "d", 1)];

        let result = astar(
            &0,
            |node| successors(&graph, *node),
            |_| Some(0),
            |node, _| *node,
            |node| *node == 3,
            None,
        )
        .unwrap();

        assert_eq!(result.edges, vec!["b", "d"]);
    }

    #[test]
    fn astar_dead_ends() {
        let graph: Graph = vec![(0, 1, "a", 1), (1, 2, "b", 1)];

        let result = astar(
            &0,
            |node| successors(&graph, *node),
            |node| if *node == 1 { None } else { Some(0) },
            |_, _| 0,
            |node| *node == 2,
            None,
        );

        assert_eq!(result, Err(SearchFailure::Exhausted { states_visited: 1 }));
    }

    #[test]
    fn astar_overflow() {
        let graph: Graph = vec![(0, 1, "a", usize::MAX), (1, 2, "b", 1)];

        let result = astar(
            &0,
            |node| successors(&graph, *node),
            |_| Some(0),
            |_, _| 0,
            |node| *node == 2,
            None,
        );

        assert_eq!(result, Err(SearchFailure::Overflow { states_visited: 2 }));
    }

    #[test]
    fn astar_deadline() {
        let graph: Graph = vec![(0, 1, "a", 1), (1, 2, "b", 1)];

        let result = astar(
            &0,
            |node| successors(&graph, *node),
            |node| Some(2 - *node),
            |_, _| 0,
            |node| *node == 2,
            Some(Instant::now()),
        );

        assert_eq!(
            result,
            Err(SearchFailure::Timeout {
                lower_bound: 2,
                states_visited: 1
            })
        );
    }
}
