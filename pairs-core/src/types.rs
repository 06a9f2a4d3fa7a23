//! Core identity types shared across the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Opaque identifier of one game session, fresh on every start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of a single card instance.
///
/// Assigned at shuffle time, so two cards never share an ID even when they
/// carry the same face, and a re-shuffled deck gets entirely new IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(pub Uuid);

impl CardId {
    /// Create a new random card ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CardId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Faces
// ---------------------------------------------------------------------------

/// Ordered master list of face images. Decks take a prefix of this list.
pub const MASTER_FACES: [&str; 18] = [
    "/img/helmet-1.png",
    "/img/potion-1.png",
    "/img/ring-1.png",
    "/img/scroll-1.png",
    "/img/shield-1.png",
    "/img/sword-1.png",
    "/img/amulet-1.png",
    "/img/axe-1.png",
    "/img/bow-1.png",
    "/img/crown-1.png",
    "/img/dagger-1.png",
    "/img/gem-1.png",
    "/img/hammer-1.png",
    "/img/key-1.png",
    "/img/lantern-1.png",
    "/img/map-1.png",
    "/img/staff-1.png",
    "/img/torch-1.png",
];

/// Index into [`MASTER_FACES`]; the value two cards of a pair share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FaceId(pub u16);

impl FaceId {
    /// Image source for this face, or `None` if the index is out of range.
    #[must_use]
    pub fn src(self) -> Option<&'static str> {
        MASTER_FACES.get(usize::from(self.0)).copied()
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "face#{}", self.0)
    }
}
