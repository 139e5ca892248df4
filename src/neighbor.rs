use bevy::math::IVec2;

use std::fmt::Debug;

use crate::dir::Dir;

/// Cost of an orthogonal step.
pub const CARDINAL_COST: u32 = 10;
/// Cost of a diagonal step, about sqrt(2) times [`CARDINAL_COST`].
pub const DIAGONAL_COST: u32 = 14;

/// Defines which directions a search expands in and the matching admissible heuristic.
pub trait Neighborhood: Debug + Sync + Send {
    fn directions(&self) -> &'static [Dir];
    fn heuristic(&self, pos: IVec2, target: IVec2) -> u32;
    fn is_ordinal(&self) -> bool {
        false
    }
}

/// Four-way movement with a Manhattan heuristic.
#[derive(Clone, Copy, Debug, Default)]
pub struct CardinalNeighborhood;

impl Neighborhood for CardinalNeighborhood {
    #[inline(always)]
    fn directions(&self) -> &'static [Dir] {
        &[Dir::NORTH, Dir::EAST, Dir::SOUTH, Dir::WEST]
    }

    #[inline(always)]
    fn heuristic(&self, pos: IVec2, target: IVec2) -> u32 {
        manhattan_distance(pos, target)
    }
}

/// Eight-way movement with an octile heuristic.
#[derive(Clone, Copy, Debug, Default)]
pub struct OrdinalNeighborhood;

impl Neighborhood for OrdinalNeighborhood {
    #[inline(always)]
    fn directions(&self) -> &'static [Dir] {
        &[
            Dir::NORTH,
            Dir::EAST,
            Dir::SOUTH,
            Dir::WEST,
            Dir::NORTHEAST,
            Dir::SOUTHEAST,
            Dir::SOUTHWEST,
            Dir::NORTHWEST,
        ]
    }

    #[inline(always)]
    fn heuristic(&self, pos: IVec2, target: IVec2) -> u32 {
        octile_distance(pos, target)
    }

    #[inline(always)]
    fn is_ordinal(&self) -> bool {
        true
    }
}

/// Picks the neighborhood for a request.
pub fn neighborhood_for(allow_diagonals: bool) -> &'static dyn Neighborhood {
    if allow_diagonals {
        &OrdinalNeighborhood
    } else {
        &CardinalNeighborhood
    }
}

/// Exact cost of the cheapest 8-way route on an open grid.
#[inline(always)]
pub fn octile_distance(a: IVec2, b: IVec2) -> u32 {
    let d = (a - b).abs();
    let (dx, dy) = (d.x as u32, d.y as u32);
    CARDINAL_COST * dx.max(dy) + (DIAGONAL_COST - CARDINAL_COST) * dx.min(dy)
}

/// Exact cost of the cheapest 4-way route on an open grid.
#[inline(always)]
pub fn manhattan_distance(a: IVec2, b: IVec2) -> u32 {
    let d = (a - b).abs();
    CARDINAL_COST * (d.x + d.y) as u32
}
