//! Suspendable A* search over a [`GridGraph`].
use bevy::{log, math::IVec2};
use indexmap::map::Entry::{Occupied, Vacant};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::collections::BinaryHeap;

use crate::{
    graph::GridGraph,
    jps,
    neighbor::Neighborhood,
    path::Path,
    request::{PathArgs, SearchStrategy},
    tile::{GridId, TileMap},
    traverse::steps_from,
    FxIndexMap, SmallestCostHolder,
};

/// What a single [`AstarSearch::step`] did.
#[derive(Debug)]
pub(crate) enum Step {
    /// A node was expanded and the search can continue.
    Expanded,
    /// The goal was popped from the open set.
    Found(Path),
    /// The open set is empty.
    Exhausted,
}

/// A* state that can be paused between any two expansions.
///
/// The open set is ordered by lowest `f = g + h`, then highest `g`, then lowest insertion
/// index, so a search over the same graph always expands nodes in the same order.
///
/// With jump points the visited positions are the turning points of the route only, and the
/// tiles between them are filled back in when the path is built.
#[derive(Debug)]
pub(crate) struct AstarSearch {
    neighborhood: &'static dyn Neighborhood,
    jump_points: bool,
    goal: IVec2,
    to_visit: BinaryHeap<SmallestCostHolder<u32>>,
    /// Position -> (parent index, best known g).
    visited: FxIndexMap<IVec2, (usize, u32)>,
    closed: FxHashSet<usize>,
    last_expanded: Option<usize>,
}

impl AstarSearch {
    pub(crate) fn new(
        neighborhood: &'static dyn Neighborhood,
        strategy: SearchStrategy,
        start: IVec2,
        goal: IVec2,
    ) -> Self {
        let mut to_visit = BinaryHeap::new();
        to_visit.push(SmallestCostHolder {
            estimated_cost: neighborhood.heuristic(start, goal),
            cost: 0,
            index: 0,
        });

        let mut visited: FxIndexMap<IVec2, (usize, u32)> = FxIndexMap::default();
        visited.insert(start, (usize::MAX, 0));

        AstarSearch {
            neighborhood,
            jump_points: strategy == SearchStrategy::JumpPoint && neighborhood.is_ordinal(),
            goal,
            to_visit,
            visited,
            closed: FxHashSet::default(),
            last_expanded: None,
        }
    }

    pub(crate) fn goal(&self) -> IVec2 {
        self.goal
    }

    /// Expands the next open node.
    pub(crate) fn step<M: TileMap + ?Sized>(
        &mut self,
        graph: &mut GridGraph,
        map: &M,
        args: &PathArgs,
    ) -> Step {
        let (index, cost) = loop {
            let Some(SmallestCostHolder { cost, index, .. }) = self.to_visit.pop() else {
                return Step::Exhausted;
            };

            // Skip entries superseded by a cheaper route found later.
            let Some((_, &(_, best))) = self.visited.get_index(index) else {
                log::error!("Open set references unknown index {}", index);
                continue;
            };
            if cost > best || self.closed.contains(&index) {
                continue;
            }

            break (index, cost);
        };

        let Some((&current, &(parent, _))) = self.visited.get_index(index) else {
            return Step::Exhausted;
        };

        if current == self.goal {
            return Step::Found(self.reconstruct(graph.grid(), index, cost));
        }

        self.closed.insert(index);
        self.last_expanded = Some(index);

        let successors: SmallVec<[(IVec2, u32); 8]> = if self.jump_points {
            let parent = self.visited.get_index(parent).map(|(pos, _)| *pos);
            jps::successors(graph, map, args, parent, current, self.goal)
        } else {
            steps_from(graph, map, args, current, self.neighborhood.directions())
        };

        for (neighbor, step) in successors {
            let new_cost = cost + step;
            let n;
            match self.visited.entry(neighbor) {
                Vacant(e) => {
                    n = e.index();
                    e.insert((index, new_cost));
                }
                Occupied(mut e) => {
                    if e.get().1 > new_cost && !self.closed.contains(&e.index()) {
                        n = e.index();
                        e.insert((index, new_cost));
                    } else {
                        continue;
                    }
                }
            }

            self.to_visit.push(SmallestCostHolder {
                estimated_cost: new_cost + self.neighborhood.heuristic(neighbor, self.goal),
                cost: new_cost,
                index: n,
            });
        }

        Step::Expanded
    }

    fn reconstruct(&self, grid: GridId, index: usize, cost: u32) -> Path {
        let mut steps = self.route_to(index);
        steps.reverse();
        Path::new(grid, steps, cost)
    }

    // Positions from `index` back to the start, with straight runs between jump points filled in.
    fn route_to(&self, mut current: usize) -> Vec<IVec2> {
        let mut steps: Vec<IVec2> = vec![];

        while let Some((&pos, &(parent, _))) = self.visited.get_index(current) {
            if let Some(&last) = steps.last() {
                let step = (pos - last).signum();
                let mut between = last + step;
                while between != pos {
                    steps.push(between);
                    between += step;
                }
            }
            steps.push(pos);
            current = parent;
        }

        steps
    }

    /// Positions waiting in the open set.
    pub(crate) fn open(&self) -> Vec<IVec2> {
        let mut open: Vec<IVec2> = self
            .to_visit
            .iter()
            .filter(|holder| !self.closed.contains(&holder.index))
            .filter_map(|holder| self.visited.get_index(holder.index).map(|(pos, _)| *pos))
            .collect();
        open.sort_by_key(|pos| (pos.x, pos.y));
        open.dedup();
        open
    }

    /// Positions that have been expanded.
    pub(crate) fn closed(&self) -> Vec<IVec2> {
        self.visited
            .iter()
            .enumerate()
            .filter(|(index, _)| self.closed.contains(index))
            .map(|(_, (pos, _))| *pos)
            .collect()
    }

    /// Best known cost from the start for every visited position.
    pub(crate) fn g_scores(&self) -> FxHashMap<IVec2, u32> {
        self.visited
            .iter()
            .map(|(pos, &(_, cost))| (*pos, cost))
            .collect()
    }

    /// The route to the most recently expanded node, start first.
    pub(crate) fn current_route(&self) -> Vec<IVec2> {
        let Some(last) = self.last_expanded else {
            return Vec::new();
        };
        let mut steps = self.route_to(last);
        steps.reverse();
        steps
    }
}
