use bevy::math::IVec2;
use strum::{EnumIter, IntoEnumIterator};

/// The eight directions a tile can be left through.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter)]
pub enum Dir {
    NORTH = 0,
    EAST = 1,
    SOUTH = 2,
    WEST = 3,
    NORTHEAST = 4,
    SOUTHEAST = 5,
    SOUTHWEST = 6,
    NORTHWEST = 7,
}

pub use self::Dir::*;

impl Dir {
    pub fn cardinal() -> std::iter::Copied<std::slice::Iter<'static, Dir>> {
        [NORTH, EAST, SOUTH, WEST].iter().copied()
    }

    pub fn ordinal() -> std::iter::Copied<std::slice::Iter<'static, Dir>> {
        [NORTHEAST, SOUTHEAST, SOUTHWEST, NORTHWEST].iter().copied()
    }

    pub fn all() -> DirIter {
        Dir::iter()
    }

    pub fn vector(self) -> IVec2 {
        match self {
            NORTH => IVec2::new(0, 1),
            EAST => IVec2::new(1, 0),
            SOUTH => IVec2::new(0, -1),
            WEST => IVec2::new(-1, 0),
            NORTHEAST => IVec2::new(1, 1),
            SOUTHEAST => IVec2::new(1, -1),
            SOUTHWEST => IVec2::new(-1, -1),
            NORTHWEST => IVec2::new(-1, 1),
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(self, NORTHEAST | SOUTHEAST | SOUTHWEST | NORTHWEST)
    }

    /// The two cardinal directions a diagonal is made of.
    pub fn components(self) -> Option<(Dir, Dir)> {
        match self {
            NORTHEAST => Some((NORTH, EAST)),
            SOUTHEAST => Some((SOUTH, EAST)),
            SOUTHWEST => Some((SOUTH, WEST)),
            NORTHWEST => Some((NORTH, WEST)),
            _ => None,
        }
    }

    /// The direction of a unit step, if `offset` is one.
    pub fn from_offset(offset: IVec2) -> Option<Dir> {
        Dir::all().find(|dir| dir.vector() == offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vectors_are_unit_steps() {
        for dir in Dir::all() {
            assert_eq!(dir.vector().abs().max_element(), 1);
            assert_eq!(Dir::from_offset(dir.vector()), Some(dir));
        }
    }

    #[test]
    fn test_diagonal_components_sum() {
        for dir in Dir::ordinal() {
            let (a, b) = dir.components().unwrap();
            assert_eq!(a.vector() + b.vector(), dir.vector());
        }

        assert!(Dir::cardinal().all(|dir| dir.components().is_none()));
    }

    #[test]
    fn test_from_offset() {
        assert_eq!(Dir::from_offset(IVec2::new(-1, 1)), Some(NORTHWEST));
        assert_eq!(Dir::from_offset(IVec2::new(2, 0)), None);
    }
}
