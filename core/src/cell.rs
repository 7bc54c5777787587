use serde::{Deserialize, Serialize};

/// Player-visible state of one board cell.
///
/// `Mine` and `Exploded` only appear after the game ends: losing discloses
/// every mine, and the one that was actually clicked is marked `Exploded`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Hidden,
    Revealed(u8),
    Flagged,
    Mine,
    Exploded,
}

impl Cell {
    pub const fn is_hidden(self) -> bool {
        matches!(self, Self::Hidden)
    }

    pub const fn is_unrevealed(self) -> bool {
        matches!(self, Self::Hidden | Self::Flagged)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::Hidden
    }
}
