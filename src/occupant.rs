//! Data entities contribute to the tiles they occupy.
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

/// Whether a physics body is anchored or free to move.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyType {
    /// Anchored bodies (walls, machines, closed doors) block movement.
    #[default]
    Static,
    /// Mobs and items. Tracked on the tile but never block.
    Dynamic,
}

/// Collision data of an entity as far as the graph is concerned.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionBody {
    /// Layers this body occupies.
    pub layer: u32,
    /// Layers this body collides with.
    pub mask: u32,
    pub body_type: BodyType,
}

impl CollisionBody {
    pub fn new(layer: u32, mask: u32, body_type: BodyType) -> Self {
        CollisionBody {
            layer,
            mask,
            body_type,
        }
    }

    /// A static body occupying `layer`.
    pub fn wall(layer: u32) -> Self {
        CollisionBody::new(layer, 0, BodyType::Static)
    }

    /// A dynamic body occupying `layer`.
    pub fn mob(layer: u32) -> Self {
        CollisionBody::new(layer, 0, BodyType::Dynamic)
    }

    pub fn is_static(&self) -> bool {
        self.body_type == BodyType::Static
    }
}

/// An interned access tag, e.g. "Engineering" or "Security".
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccessTag(pub u32);

/// Access requirements placed on a tile by a locked door, airlock, etc.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AccessReader {
    required: SmallVec<[AccessTag; 4]>,
}

impl AccessReader {
    /// Creates a reader that lets through anyone holding any of the given tags.
    pub fn new(required: impl IntoIterator<Item = AccessTag>) -> Self {
        let mut required: SmallVec<[AccessTag; 4]> = required.into_iter().collect();
        required.sort_unstable();
        required.dedup();

        AccessReader { required }
    }

    /// A reader that lets everyone through.
    pub fn unrestricted() -> Self {
        AccessReader::default()
    }

    pub fn required(&self) -> &[AccessTag] {
        &self.required
    }

    /// A reader is satisfied when it requires nothing or when the caller holds at least one of its tags.
    pub fn is_allowed(&self, access: &FxHashSet<AccessTag>) -> bool {
        self.required.is_empty() || self.required.iter().any(|tag| access.contains(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_allows_any_matching_tag() {
        let reader = AccessReader::new([AccessTag(2), AccessTag(1), AccessTag(2)]);
        assert_eq!(reader.required(), &[AccessTag(1), AccessTag(2)]);

        let mut access = FxHashSet::default();
        assert!(!reader.is_allowed(&access));

        access.insert(AccessTag(7));
        assert!(!reader.is_allowed(&access));

        access.insert(AccessTag(2));
        assert!(reader.is_allowed(&access));
    }

    #[test]
    fn test_unrestricted_reader() {
        assert!(AccessReader::unrestricted().is_allowed(&FxHashSet::default()));
    }
}
