use alloc::format;
use alloc::string::String;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::Observation;
use crate::*;

/// Reasoning family behind a suggestion. Closed set with a single member for
/// now: the advisor only makes logically certain deductions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HintCategory {
    DirectDeduction,
}

impl HintCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::DirectDeduction => "Direct Deduction",
        }
    }
}

impl core::fmt::Display for HintCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HintConfidence {
    High,
}

impl HintConfidence {
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
        }
    }
}

impl core::fmt::Display for HintConfidence {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// A provably safe cell together with the clue that proves it.
///
/// Ephemeral: recomputed from scratch on every request, never stored in the
/// game. The explanation text may be rephrased by an external collaborator,
/// but `target`, `category`, and `confidence` are authoritative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HintSuggestion {
    pub target: Coord2,
    pub source: Coord2,
    pub source_clue: u8,
    pub flagged_neighbors: u8,
    pub category: HintCategory,
    pub confidence: HintConfidence,
    pub explanation: String,
}

impl HintSuggestion {
    fn direct(target: Coord2, source: Coord2, source_clue: u8, flagged_neighbors: u8) -> Self {
        let explanation = format!(
            "Row {}, Col {} shows \"{}\" with {} flags. All mines found → remaining cells safe.",
            u32::from(source.0) + 1,
            u32::from(source.1) + 1,
            source_clue,
            flagged_neighbors,
        );
        Self {
            target,
            source,
            source_clue,
            flagged_neighbors,
            category: HintCategory::DirectDeduction,
            confidence: HintConfidence::High,
            explanation,
        }
    }
}

type NeighborList = SmallVec<[Coord2; 8]>;

/// Finds the first provably safe hidden cell, or `None` when no logically
/// certain move exists (a normal outcome, not a failure).
///
/// Clues are scanned in row-major order and each clue's neighbors in the
/// fixed offset order, so identical observations always produce identical
/// suggestions.
pub fn compute_hint(obs: &Observation) -> Option<HintSuggestion> {
    if obs.state != GameState::Playing {
        return None;
    }

    let proven_mines = provable_mines(obs);

    let (rows, cols) = obs.size;
    for row in 0..rows {
        for col in 0..cols {
            let source = (row, col);
            let Some(clue) = obs.revealed[source.to_nd_index()] else {
                continue;
            };
            if clue == 0 {
                continue;
            }

            let flagged = count_flagged_neighbors(obs, source);
            if flagged != clue {
                continue;
            }

            // every mine around this clue is flagged, the rest are safe
            for &target in &hidden_neighbors(obs, source) {
                if proven_mines.contains(&target) {
                    log::warn!(
                        "clue at {:?} is satisfied but {:?} is provably a mine, player flags disagree",
                        source,
                        target
                    );
                    continue;
                }
                return Some(HintSuggestion::direct(target, source, clue, flagged));
            }
        }
    }

    None
}

/// Cells that are provably mines: a clue whose count equals flagged plus
/// hidden neighbors pins every hidden neighbor. This rule never produces a
/// suggestion; it only stops the safe-cell rule from proposing a cell that
/// another clue proves dangerous.
fn provable_mines(obs: &Observation) -> HashSet<Coord2> {
    let mut mines = HashSet::new();

    let (rows, cols) = obs.size;
    for row in 0..rows {
        for col in 0..cols {
            let source = (row, col);
            let Some(clue) = obs.revealed[source.to_nd_index()] else {
                continue;
            };
            if clue == 0 {
                continue;
            }

            let flagged = count_flagged_neighbors(obs, source);
            let hidden = hidden_neighbors(obs, source);
            if !hidden.is_empty() && usize::from(clue) == usize::from(flagged) + hidden.len() {
                mines.extend(hidden);
            }
        }
    }

    mines
}

fn count_flagged_neighbors(obs: &Observation, coords: Coord2) -> u8 {
    obs.flags
        .iter_neighbor_cells(coords)
        .filter(|&flagged| flagged)
        .count()
        .try_into()
        .unwrap()
}

/// Unrevealed, unflagged neighbors in fixed offset order.
fn hidden_neighbors(obs: &Observation, coords: Coord2) -> NeighborList {
    obs.flags
        .iter_neighbor_cells_with_index(coords)
        .filter(|&(pos, flagged)| !flagged && obs.revealed[pos.to_nd_index()].is_none())
        .map(|(pos, _)| pos)
        .collect()
}

/// Caller-side bookkeeping for the currently displayed suggestion.
///
/// The engine does not own hint state; the UI holds a tracker next to its
/// `Game` and pokes it after each mutation to learn whether the displayed
/// suggestion must be dismissed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HintTracker {
    current: Option<HintSuggestion>,
}

impl HintTracker {
    pub fn set(&mut self, suggestion: HintSuggestion) {
        self.current = Some(suggestion);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&HintSuggestion> {
        self.current.as_ref()
    }

    /// Drops the suggestion when a reveal (including flood fill) uncovered
    /// its target. Returns whether the suggestion was invalidated.
    pub fn after_reveal(&mut self, game: &Game) -> bool {
        let stale = self
            .current
            .as_ref()
            .is_some_and(|suggestion| !game.cell_at(suggestion.target).is_hidden());
        if stale {
            log::debug!("hint invalidated, target no longer hidden");
            self.current = None;
        }
        stale
    }

    /// Drops the suggestion when a flag toggle touched its target cell,
    /// in either direction. Returns whether the suggestion was invalidated.
    pub fn after_flag(&mut self, coords: Coord2) -> bool {
        let stale = self
            .current
            .as_ref()
            .is_some_and(|suggestion| suggestion.target == coords);
        if stale {
            log::debug!("hint invalidated, target was toggled at {:?}", coords);
            self.current = None;
        }
        stale
    }
}
