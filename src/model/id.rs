//! Identity types for the labels graph.
//!
//! Arena ids are newtypes over `u32` that serve as direct indices into the
//! storage vectors owned by a [`Labels`](crate::Labels), providing O(1) lookup.
//! They are only meaningful for the container that issued them.
//!
//! [`Uid`] is the cross-container identity: every skeleton, video and track
//! gets a fresh one at construction and keeps it through `Clone`, so two
//! graphs that share an entity (e.g. after a `match_to` load) can tell.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Typed index into an arena.
pub trait ArenaId: Copy + Eq {
    fn from_index(index: usize) -> Self;
    fn index(self) -> usize;
}

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl $name {
            pub const INVALID: $name = $name(u32::MAX);

            #[inline]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }

            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl ArenaId for $name {
            #[inline]
            fn from_index(index: usize) -> Self {
                $name(index as u32)
            }

            #[inline]
            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if *self == Self::INVALID {
                    write!(f, concat!(stringify!($name), "(INVALID)"))
                } else {
                    write!(f, concat!(stringify!($name), "({})"), self.0)
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        }
    };
}

arena_id!(
    /// Index into `Labels::skeletons`.
    SkeletonId
);
arena_id!(
    /// Index into `Labels::videos`.
    VideoId
);
arena_id!(
    /// Index into `Labels::tracks`.
    TrackId
);

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

/// Process-unique object identity, preserved by `Clone`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uid(u64);

impl Uid {
    /// Allocate a new identity.
    pub fn fresh() -> Self {
        Uid(NEXT_UID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid({})", self.0)
    }
}
