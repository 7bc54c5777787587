use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Read-only snapshot of the player-visible board: the hint advisor's only
/// input, and the summary handed to external collaborators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub size: Coord2,
    pub mine_count: CellCount,
    pub flag_count: CellCount,
    pub state: GameState,
    pub revealed: Array2<Option<u8>>,
    pub flags: Array2<bool>,
}

impl Observation {
    pub fn new(
        size: Coord2,
        mine_count: CellCount,
        flag_count: CellCount,
        state: GameState,
        revealed: Array2<Option<u8>>,
        flags: Array2<bool>,
    ) -> Result<Self> {
        let obs = Self {
            size,
            mine_count,
            flag_count,
            state,
            revealed,
            flags,
        };
        obs.validate()?;
        Ok(obs)
    }

    pub fn from_game(game: &Game) -> Self {
        let size = game.size();
        let mut revealed = Array2::from_elem(size.to_nd_index(), None);
        let mut flags = Array2::from_elem(size.to_nd_index(), false);

        let (rows, cols) = size;
        for row in 0..rows {
            for col in 0..cols {
                let coords = (row, col);
                match game.cell_at(coords) {
                    Cell::Hidden => {}
                    Cell::Revealed(count) => revealed[coords.to_nd_index()] = Some(count),
                    Cell::Flagged => flags[coords.to_nd_index()] = true,
                    // terminal disclosure states carry no solver information
                    Cell::Mine | Cell::Exploded => {}
                }
            }
        }

        Self {
            size,
            mine_count: game.total_mines(),
            flag_count: game.flag_count(),
            state: game.state(),
            revealed,
            flags,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let expected = (self.size.0 as usize, self.size.1 as usize);
        if self.revealed.dim() != expected || self.flags.dim() != expected {
            return Err(GameError::InvalidBoardShape);
        }

        if self.mine_count > mult(self.size.0, self.size.1) {
            return Err(GameError::TooManyMines);
        }

        Ok(())
    }
}
