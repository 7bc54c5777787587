use alloc::collections::VecDeque;
use core::num::Saturating;
use hashbrown::HashSet;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Valid transitions:
/// - `Ready -> Playing` on the first successful reveal (which also places the mines)
/// - `Playing -> Won` when the last safe cell is revealed
/// - `Playing -> Lost` when a mine is revealed
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameState {
    Ready,
    Playing,
    Won,
    Lost,
}

impl GameState {
    /// No mines placed yet; the next reveal will place them.
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    /// Meaningful only once the game is finished.
    pub const fn is_won(self) -> bool {
        matches!(self, Self::Won)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::Ready
    }
}

/// One match from first click to win or loss.
///
/// Mine placement is lazy: the minefield is generated on the first reveal and
/// always excludes the revealed cell, so the first click can never lose.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Game {
    config: GameConfig,
    seed: u64,
    minefield: Option<Minefield>,
    board: Array2<Cell>,
    revealed_count: Saturating<CellCount>,
    flag_count: Saturating<CellCount>,
    state: GameState,
    triggered_mine: Option<Coord2>,
}

impl Game {
    /// Fresh game with no mines placed. The seed is the only source of
    /// randomness; the crate never reaches for an OS RNG itself.
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            minefield: None,
            board: Array2::default(config.size.to_nd_index()),
            revealed_count: Saturating(0),
            flag_count: Saturating(0),
            state: Default::default(),
            triggered_mine: None,
        }
    }

    /// Game over a pre-built minefield, skipping lazy placement. The
    /// first-click guarantee is the caller's problem here.
    pub fn from_minefield(minefield: Minefield) -> Self {
        let config = minefield.game_config();
        Self {
            config,
            seed: 0,
            minefield: Some(minefield),
            board: Array2::default(config.size.to_nd_index()),
            revealed_count: Saturating(0),
            flag_count: Saturating(0),
            state: Default::default(),
            triggered_mine: None,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn size(&self) -> Coord2 {
        self.config.size
    }

    pub fn total_mines(&self) -> CellCount {
        self.config.mines
    }

    pub fn flag_count(&self) -> CellCount {
        self.flag_count.0
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count.0
    }

    /// May go negative; flags are player bookkeeping with no upper bound.
    pub fn mines_left(&self) -> isize {
        (self.config.mines as isize) - (self.flag_count.0 as isize)
    }

    pub fn cell_at(&self, coords: Coord2) -> Cell {
        self.board[coords.to_nd_index()]
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    /// Ground truth, false until mines are placed.
    pub fn has_mine_at(&self, coords: Coord2) -> bool {
        self.minefield
            .as_ref()
            .is_some_and(|field| field.contains_mine(coords))
    }

    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.config.validate_coords(coords)?;

        // finished games swallow input instead of erroring, so UI event
        // handlers need no special casing
        if self.state.is_finished() {
            return Ok(RevealOutcome::NoChange);
        }

        if !self.board[coords.to_nd_index()].is_hidden() {
            return Ok(RevealOutcome::NoChange);
        }

        self.ensure_minefield(coords);
        Ok(self.reveal_single_cell(coords))
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        use Cell::*;
        use MarkOutcome::*;

        let coords = self.config.validate_coords(coords)?;

        if self.state.is_finished() {
            return Ok(NoChange);
        }

        Ok(match self.board[coords.to_nd_index()] {
            Hidden => {
                self.board[coords.to_nd_index()] = Flagged;
                self.flag_count += 1;
                Changed
            }
            Flagged => {
                self.board[coords.to_nd_index()] = Hidden;
                self.flag_count -= 1;
                Changed
            }
            _ => NoChange,
        })
    }

    fn ensure_minefield(&mut self, first_click: Coord2) {
        if self.minefield.is_none() {
            let generator = RandomMinefieldGenerator::new(self.seed, first_click);
            self.minefield = Some(generator.generate(self.config));
            log::debug!("placed {} mines, excluding {:?}", self.config.mines, first_click);
        }
    }

    fn is_mine(&self, coords: Coord2) -> bool {
        self.minefield
            .as_ref()
            .is_some_and(|field| field.contains_mine(coords))
    }

    fn adjacent_mines(&self, coords: Coord2) -> u8 {
        match &self.minefield {
            Some(field) => field.adjacent_mine_count(coords),
            None => 0,
        }
    }

    fn reveal_single_cell(&mut self, coords: Coord2) -> RevealOutcome {
        if self.is_mine(coords) {
            self.board[coords.to_nd_index()] = Cell::Exploded;
            self.triggered_mine = Some(coords);
            self.end_game(false);
            return RevealOutcome::HitMine;
        }

        let adjacent = self.adjacent_mines(coords);
        self.board[coords.to_nd_index()] = Cell::Revealed(adjacent);
        self.revealed_count += 1;
        log::debug!("revealed {:?}, adjacent mines: {}", coords, adjacent);

        if adjacent == 0 {
            self.flood_fill(coords);
        }

        if self.revealed_count == Saturating(self.config.safe_cells()) {
            self.end_game(true);
            RevealOutcome::Won
        } else {
            self.mark_started();
            RevealOutcome::Revealed
        }
    }

    /// Opens the connected zero-region around `start` plus its numbered
    /// border. Flagged cells are never flood-revealed.
    fn flood_fill(&mut self, start: Coord2) {
        let mut visited: HashSet<Coord2> = HashSet::from([start]);
        let mut to_visit: VecDeque<_> = self
            .board
            .iter_neighbors(start)
            .filter(|&pos| self.board[pos.to_nd_index()].is_hidden())
            .collect();
        log::trace!("flood fill from {:?}, frontier: {:?}", start, to_visit);

        while let Some(visit_coords) = to_visit.pop_front() {
            if !visited.insert(visit_coords) {
                continue;
            }

            if !self.board[visit_coords.to_nd_index()].is_hidden() {
                continue;
            }

            let visit_adjacent = self.adjacent_mines(visit_coords);
            self.board[visit_coords.to_nd_index()] = Cell::Revealed(visit_adjacent);
            self.revealed_count += 1;
            log::trace!(
                "flood revealed {:?}, adjacent mines: {}",
                visit_coords,
                visit_adjacent
            );

            // only zero cells expand the region; numbered cells are its border
            if visit_adjacent == 0 {
                to_visit.extend(
                    self.board
                        .iter_neighbors(visit_coords)
                        .filter(|&pos| self.board[pos.to_nd_index()].is_hidden())
                        .filter(|pos| !visited.contains(pos)),
                );
            }
        }
    }

    fn mark_started(&mut self) {
        if matches!(self.state, GameState::Ready) {
            log::debug!("game started");
            self.state = GameState::Playing;
        }
    }

    fn end_game(&mut self, won: bool) {
        if self.state.is_finished() {
            return;
        }

        self.state = if won { GameState::Won } else { GameState::Lost };
        log::debug!("game over, won: {}", won);
        self.disclose_mines(won);
    }

    /// On a loss every mine becomes visible; on a win the still-hidden mines
    /// are flagged for the player, counting into `flag_count`.
    fn disclose_mines(&mut self, won: bool) {
        let Some(minefield) = self.minefield.as_ref() else {
            return;
        };

        let (rows, cols) = self.config.size;
        for row in 0..rows {
            for col in 0..cols {
                let coords = (row, col);
                if !minefield.contains_mine(coords) {
                    continue;
                }

                let cell = self.board[coords.to_nd_index()];
                if won {
                    if cell.is_hidden() {
                        self.board[coords.to_nd_index()] = Cell::Flagged;
                        self.flag_count += 1;
                    }
                } else if cell.is_unrevealed() {
                    self.board[coords.to_nd_index()] = Cell::Mine;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(size: Coord2, mines: &[Coord2]) -> Minefield {
        Minefield::from_mine_coords(size, mines).unwrap()
    }

    fn for_each_cell(size: Coord2, mut f: impl FnMut(Coord2)) {
        for row in 0..size.0 {
            for col in 0..size.1 {
                f((row, col));
            }
        }
    }

    #[test]
    fn reveal_hits_mine_and_discloses_every_mine() {
        let mut game = Game::from_minefield(field((3, 3), &[(0, 0), (2, 2)]));
        game.toggle_flag((2, 2)).unwrap();

        let outcome = game.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::HitMine);
        assert_eq!(game.state(), GameState::Lost);
        assert_eq!(game.triggered_mine(), Some((0, 0)));
        assert_eq!(game.cell_at((0, 0)), Cell::Exploded);
        // flagged mines are disclosed too; losing reveals all of them
        assert_eq!(game.cell_at((2, 2)), Cell::Mine);
        // no safe cell became revealed as part of the loss
        for_each_cell(game.size(), |coords| {
            if !game.has_mine_at(coords) {
                assert_eq!(game.cell_at(coords), Cell::Hidden);
            }
        });
    }

    #[test]
    fn reveal_flood_fill_opens_zero_region() {
        let mut game = Game::from_minefield(field((3, 3), &[(2, 2)]));

        let outcome = game.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::Won);
        assert_eq!(game.cell_at((0, 0)), Cell::Revealed(0));
        assert_eq!(game.cell_at((1, 1)), Cell::Revealed(1));
        // opening the whole safe region wins, which auto-flags the mine
        assert_eq!(game.cell_at((2, 2)), Cell::Flagged);
    }

    #[test]
    fn flood_fill_stops_at_numbered_border() {
        // mine in the far column, zero region on the left of the numbers
        let mut game = Game::from_minefield(field((3, 4), &[(1, 3)]));

        let outcome = game.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::Revealed);
        assert!(outcome.has_update());
        // zero region (two columns) plus the numbered border column
        assert_eq!(game.revealed_count(), 9);
        // border numbers revealed by the fill
        assert_eq!(game.cell_at((0, 2)), Cell::Revealed(1));
        assert_eq!(game.cell_at((1, 2)), Cell::Revealed(1));
        assert_eq!(game.cell_at((2, 2)), Cell::Revealed(1));
        // beyond the border nothing was touched
        assert_eq!(game.cell_at((0, 3)), Cell::Hidden);
        assert_eq!(game.cell_at((2, 3)), Cell::Hidden);
    }

    #[test]
    fn flood_fill_skips_flagged_cells() {
        let mut game = Game::from_minefield(field((3, 3), &[(2, 2)]));
        game.toggle_flag((0, 1)).unwrap();

        let outcome = game.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::Revealed);
        assert_eq!(game.cell_at((0, 1)), Cell::Flagged);
        assert_eq!(game.cell_at((1, 1)), Cell::Revealed(1));
    }

    #[test]
    fn winning_auto_flags_remaining_mines() {
        let mut game = Game::from_minefield(field((2, 2), &[(0, 0)]));

        assert_eq!(game.reveal((0, 1)).unwrap(), RevealOutcome::Revealed);
        assert_eq!(game.reveal((1, 0)).unwrap(), RevealOutcome::Revealed);
        assert_eq!(game.reveal((1, 1)).unwrap(), RevealOutcome::Won);

        assert_eq!(game.state(), GameState::Won);
        assert!(game.state().is_won());
        assert_eq!(game.cell_at((0, 0)), Cell::Flagged);
        assert_eq!(game.flag_count(), 1);
    }

    #[test]
    fn finished_game_swallows_mutations() {
        let mut game = Game::from_minefield(field((2, 2), &[(0, 0)]));
        game.reveal((0, 0)).unwrap();
        assert_eq!(game.state(), GameState::Lost);

        assert_eq!(game.reveal((1, 1)).unwrap(), RevealOutcome::NoChange);
        let mark = game.toggle_flag((1, 1)).unwrap();
        assert_eq!(mark, MarkOutcome::NoChange);
        assert!(!mark.has_update());
        assert_eq!(game.cell_at((1, 1)), Cell::Hidden);
    }

    #[test]
    fn out_of_bounds_coordinates_error_without_state_change() {
        let mut game = Game::new(GameConfig::default(), 7);

        assert_eq!(game.reveal((8, 0)), Err(GameError::InvalidCoords));
        assert_eq!(game.toggle_flag((0, 8)), Err(GameError::InvalidCoords));
        assert_eq!(game.state(), GameState::Ready);
    }

    #[test]
    fn revealing_flagged_cell_is_a_no_op() {
        let mut game = Game::from_minefield(field((2, 2), &[(0, 0)]));
        game.toggle_flag((1, 1)).unwrap();

        assert_eq!(game.reveal((1, 1)).unwrap(), RevealOutcome::NoChange);
        assert_eq!(game.cell_at((1, 1)), Cell::Flagged);
    }

    #[test]
    fn flags_may_exceed_the_mine_count() {
        let mut game = Game::from_minefield(field((2, 2), &[(0, 0)]));

        game.toggle_flag((0, 1)).unwrap();
        game.toggle_flag((1, 0)).unwrap();
        game.toggle_flag((1, 1)).unwrap();

        assert_eq!(game.flag_count(), 3);
        assert_eq!(game.mines_left(), -2);
    }

    #[test]
    fn flagging_is_allowed_before_the_first_reveal() {
        let mut game = Game::new(GameConfig::default(), 1);

        assert_eq!(game.toggle_flag((3, 3)).unwrap(), MarkOutcome::Changed);
        assert!(game.state().is_ready());
        assert_eq!(game.flag_count(), 1);
    }

    #[test]
    fn first_reveal_places_exact_mine_count_and_is_safe() {
        for seed in 0..64 {
            let mut game = Game::new(GameConfig::default(), seed);
            let start = ((seed % 8) as Coord, ((seed / 8) % 8) as Coord);

            game.reveal(start).unwrap();

            assert!(!game.has_mine_at(start), "seed {seed}: first click hit a mine");
            let mut mines = 0;
            for_each_cell(game.size(), |coords| {
                if game.has_mine_at(coords) {
                    mines += 1;
                }
            });
            assert_eq!(mines, 10, "seed {seed}: wrong mine count");
        }
    }

    #[test]
    fn same_seed_and_moves_give_identical_games() {
        let mut left = Game::new(GameConfig::default(), 99);
        let mut right = Game::new(GameConfig::default(), 99);

        left.reveal((4, 4)).unwrap();
        right.reveal((4, 4)).unwrap();

        assert_eq!(left, right);
    }

    #[test]
    fn revealing_every_safe_cell_wins_and_flags_all_mines() {
        let mut game = Game::new(GameConfig::default(), 42);
        game.reveal((0, 0)).unwrap();

        for_each_cell(game.size(), |coords| {
            if !game.has_mine_at(coords) {
                game.reveal(coords).unwrap();
            }
        });

        assert_eq!(game.state(), GameState::Won);
        assert_eq!(game.flag_count(), 10);
        for_each_cell(game.size(), |coords| {
            if game.has_mine_at(coords) {
                assert_eq!(game.cell_at(coords), Cell::Flagged);
            } else {
                assert!(matches!(game.cell_at(coords), Cell::Revealed(_)));
            }
        });
    }
}
