//! Jump point successors for 8-way searches that may not cut corners.
use bevy::math::IVec2;
use smallvec::SmallVec;

use crate::{
    chunk::CHUNK_SIZE,
    dir::Dir,
    graph::GridGraph,
    neighbor::{CARDINAL_COST, DIAGONAL_COST},
    request::PathArgs,
    tile::TileMap,
    traverse::{enterable, step_cost},
};

/// Longest run scanned before the tile reached is treated as a jump point anyway.
/// Keeps a mover that may walk through space from scanning forever.
const MAX_JUMP: i32 = 8 * CHUNK_SIZE;

/// Returns the jump points reachable from `current` with the cost of reaching each.
///
/// `parent` is the jump point `current` was reached from; the start has none and scans
/// all eight directions.
pub(crate) fn successors<M: TileMap + ?Sized>(
    graph: &mut GridGraph,
    map: &M,
    args: &PathArgs,
    parent: Option<IVec2>,
    current: IVec2,
    goal: IVec2,
) -> SmallVec<[(IVec2, u32); 8]> {
    let mut found = SmallVec::new();

    for dir in pruned_directions(parent, current) {
        if let Some(point) = jump(graph, map, args, current, dir, goal) {
            found.push(point);
        }
    }

    found
}

fn pruned_directions(parent: Option<IVec2>, current: IVec2) -> SmallVec<[Dir; 8]> {
    let Some(dir) = parent.and_then(|parent| Dir::from_offset((current - parent).signum())) else {
        return Dir::all().collect();
    };

    match dir.components() {
        Some((a, b)) => SmallVec::from_slice(&[a, b, dir]),
        None => {
            let mut dirs = SmallVec::from_slice(&[dir]);
            for side in perpendicular(dir) {
                dirs.push(side);
                if let Some(diagonal) = Dir::from_offset(dir.vector() + side.vector()) {
                    dirs.push(diagonal);
                }
            }
            dirs
        }
    }
}

fn perpendicular(dir: Dir) -> [Dir; 2] {
    match dir {
        Dir::NORTH | Dir::SOUTH => [Dir::EAST, Dir::WEST],
        _ => [Dir::NORTH, Dir::SOUTH],
    }
}

/// Walks from `from` in `dir` until it finds a tile the route may have to turn at.
fn jump<M: TileMap + ?Sized>(
    graph: &mut GridGraph,
    map: &M,
    args: &PathArgs,
    from: IVec2,
    dir: Dir,
    goal: IVec2,
) -> Option<(IVec2, u32)> {
    let cost = if dir.is_diagonal() {
        DIAGONAL_COST
    } else {
        CARDINAL_COST
    };

    let mut pos = from;
    for n in 1..=MAX_JUMP {
        step_cost(graph, map, args, pos, dir)?;
        pos += dir.vector();
        let reached = Some((pos, cost * n as u32));

        if pos == goal || n == MAX_JUMP {
            return reached;
        }

        match dir.components() {
            Some((a, b)) => {
                if jump(graph, map, args, pos, a, goal).is_some()
                    || jump(graph, map, args, pos, b, goal).is_some()
                {
                    return reached;
                }
            }
            None => {
                if is_forced(graph, map, args, pos, dir) {
                    return reached;
                }
            }
        }
    }

    None
}

// A side tile that could only be reached through `pos` without cutting a corner.
fn is_forced<M: TileMap + ?Sized>(
    graph: &mut GridGraph,
    map: &M,
    args: &PathArgs,
    pos: IVec2,
    dir: Dir,
) -> bool {
    let back = pos - dir.vector();

    perpendicular(dir).into_iter().any(|side| {
        enterable(graph.node(pos + side.vector(), map), args)
            && !enterable(graph.node(back + side.vector(), map), args)
    })
}
