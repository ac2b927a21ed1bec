//! Persistent identities across frames

use crate::model::id::Uid;

/// A track links instances of the same physical animal across frames.
///
/// Tracks compare by value (`name`, `spawned_on`); the [`Uid`] only matters
/// for identity checks between graphs.
#[derive(Debug, Clone)]
pub struct Track {
    uid: Uid,
    pub name: String,
    /// Frame index the track was first seen on
    pub spawned_on: usize,
}

impl Track {
    pub fn new(name: impl Into<String>, spawned_on: usize) -> Self {
        Self {
            uid: Uid::fresh(),
            name: name.into(),
            spawned_on,
        }
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    pub fn same_as(&self, other: &Track) -> bool {
        self.uid == other.uid
    }

    pub(crate) fn same_value(&self, other: &Track) -> bool {
        self.name == other.name && self.spawned_on == other.spawned_on
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_value() {
        let a = Track::new("female", 3);
        let b = Track::new("female", 3);
        assert!(a.same_value(&b));
        assert!(!a.same_as(&b));
        assert!(!a.same_value(&Track::new("female", 4)));
    }
}
