//! Movement rules shared by the search and one-shot queries.
use std::collections::VecDeque;

use bevy::math::IVec2;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::{
    dir::Dir,
    graph::GridGraph,
    neighbor::{CARDINAL_COST, DIAGONAL_COST},
    node::TileNode,
    request::PathArgs,
    tile::TileMap,
};

/// Can the mover described by `args` stand on this node?
pub fn enterable(node: &TileNode, args: &PathArgs) -> bool {
    (args.flags.no_clip || node.is_traversable(args.collision_mask, &args.access))
        && (args.flags.allow_space || !node.tile().is_empty())
}

/// Returns the cost of stepping from `from` in `dir`, or `None` if the step isn't allowed.
///
/// A diagonal step also needs both orthogonal tiles it squeezes between to be enterable,
/// so solid corners can't be cut.
pub(crate) fn step_cost<M: TileMap + ?Sized>(
    graph: &mut GridGraph,
    map: &M,
    args: &PathArgs,
    from: IVec2,
    dir: Dir,
) -> Option<u32> {
    let to = from + dir.vector();
    if !enterable(graph.node(to, map), args) {
        return None;
    }

    match dir.components() {
        None => Some(CARDINAL_COST),
        Some((a, b)) => {
            if !args.flags.allow_diagonals {
                return None;
            }

            let open = enterable(graph.node(from + a.vector(), map), args)
                && enterable(graph.node(from + b.vector(), map), args);

            open.then_some(DIAGONAL_COST)
        }
    }
}

/// Every step out of `from` in `directions` that's allowed, with its cost.
///
/// Same rules as [`step_cost`], resolved from one [`GridGraph::neighbors`] lookup.
pub(crate) fn steps_from<M: TileMap + ?Sized>(
    graph: &mut GridGraph,
    map: &M,
    args: &PathArgs,
    from: IVec2,
    directions: &[Dir],
) -> SmallVec<[(IVec2, u32); 8]> {
    let around = graph.neighbors(from, directions, map);
    let open = |dir: Dir| {
        around
            .iter()
            .any(|(d, node)| *d == dir && enterable(node, args))
    };

    around
        .iter()
        .filter(|(_, node)| enterable(node, args))
        .filter_map(|(dir, node)| match dir.components() {
            None => Some((node.pos(), CARDINAL_COST)),
            Some((a, b)) => (args.flags.allow_diagonals && open(a) && open(b))
                .then_some((node.pos(), DIAGONAL_COST)),
        })
        .collect()
}

/// Finds the enterable tile closest to `goal` within `radius` tiles.
///
/// Scans outwards one 8-neighbor ring at a time and returns the candidate with the smallest
/// Euclidean distance. Ring `k` holds tiles at least `k` away, so the scan stops once no
/// later ring can hold anything closer. Ties go to the tile found first.
pub(crate) fn nearest_enterable<M: TileMap + ?Sized>(
    graph: &mut GridGraph,
    map: &M,
    args: &PathArgs,
    goal: IVec2,
    radius: f32,
) -> Option<IVec2> {
    if radius <= 0.0 {
        return None;
    }

    let radius_sq = radius * radius;
    let within = |pos: IVec2| (pos - goal).as_vec2().length_squared() <= radius_sq;

    let mut seen: FxHashSet<IVec2> = FxHashSet::default();
    seen.insert(goal);

    let mut ring: VecDeque<IVec2> = VecDeque::from([goal]);
    let mut best: Option<(i32, IVec2)> = None;
    let mut depth = 0;

    while !ring.is_empty() {
        let mut next = VecDeque::new();

        for &pos in &ring {
            if enterable(graph.node(pos, map), args) {
                let dist = (pos - goal).length_squared();
                if best.is_none_or(|(best_dist, _)| dist < best_dist) {
                    best = Some((dist, pos));
                }
            }

            for dir in Dir::all() {
                let neighbor = pos + dir.vector();
                if within(neighbor) && seen.insert(neighbor) {
                    next.push_back(neighbor);
                }
            }
        }

        depth += 1;
        if best.is_some_and(|(best_dist, _)| best_dist <= depth * depth) {
            break;
        }

        ring = next;
    }

    best.map(|(_, pos)| pos)
}
