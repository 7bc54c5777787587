use crate::*;
pub use random::*;

mod random;

/// Strategy for placing mines once the first click is known.
pub trait MinefieldGenerator {
    fn generate(self, config: GameConfig) -> Minefield;
}
