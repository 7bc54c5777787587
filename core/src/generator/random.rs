use ndarray::Array2;

use super::*;

/// Uniform random placement that never puts a mine on the excluded
/// first-click cell. Collisions reject and resample.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RandomMinefieldGenerator {
    seed: u64,
    exclude: Coord2,
}

impl RandomMinefieldGenerator {
    pub fn new(seed: u64, exclude: Coord2) -> Self {
        Self { seed, exclude }
    }
}

impl MinefieldGenerator for RandomMinefieldGenerator {
    fn generate(self, config: GameConfig) -> Minefield {
        use rand::prelude::*;

        let (rows, cols) = config.size;
        let total_cells = config.total_cells();

        let mut requested = config.mines;
        if requested >= total_cells {
            // validated configs never get here, but generators accept any
            // config and must still terminate
            log::warn!(
                "cannot fit {} mines outside the excluded cell, clamping to {}",
                requested,
                total_cells - 1
            );
            requested = total_cells - 1;
        }

        let mut mine_mask: Array2<bool> = Array2::default(config.size.to_nd_index());
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut placed: CellCount = 0;

        while placed < requested {
            let coords: Coord2 = (rng.random_range(0..rows), rng.random_range(0..cols));
            if coords == self.exclude || mine_mask[coords.to_nd_index()] {
                continue;
            }
            mine_mask[coords.to_nd_index()] = true;
            placed += 1;
        }

        Minefield::from_mine_mask(mine_mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn places_exact_count_and_respects_exclusion() {
        let config = GameConfig::default();

        for seed in 0..100 {
            let exclude = ((seed % 8) as Coord, ((seed / 8) % 8) as Coord);
            let field = RandomMinefieldGenerator::new(seed, exclude).generate(config);

            assert_eq!(field.mine_count(), 10, "seed {seed}");
            assert!(!field.contains_mine(exclude), "seed {seed}");
        }
    }

    #[test]
    fn same_seed_reproduces_the_same_field() {
        let config = GameConfig::default();

        let left = RandomMinefieldGenerator::new(5, (0, 0)).generate(config);
        let right = RandomMinefieldGenerator::new(5, (0, 0)).generate(config);

        assert_eq!(left, right);
    }

    #[test]
    fn adjacency_matches_brute_force_recount() {
        let config = GameConfig::new_unchecked((6, 5), 8);
        let field = RandomMinefieldGenerator::new(1234, (2, 2)).generate(config);

        for row in 0..6 {
            for col in 0..5 {
                let coords = (row, col);
                if field.contains_mine(coords) {
                    continue;
                }

                let mut expected = 0;
                for d_row in -1i16..=1 {
                    for d_col in -1i16..=1 {
                        if d_row == 0 && d_col == 0 {
                            continue;
                        }
                        let n_row = i16::from(row) + d_row;
                        let n_col = i16::from(col) + d_col;
                        if (0..6).contains(&n_row)
                            && (0..5).contains(&n_col)
                            && field.contains_mine((n_row as Coord, n_col as Coord))
                        {
                            expected += 1;
                        }
                    }
                }

                assert_eq!(field.adjacent_mine_count(coords), expected);
            }
        }
    }

    #[test]
    fn overfull_request_is_clamped() {
        let config = GameConfig::new_unchecked((2, 2), 4);

        let field = RandomMinefieldGenerator::new(0, (1, 1)).generate(config);

        assert_eq!(field.mine_count(), 3);
        assert!(!field.contains_mine((1, 1)));
    }
}
