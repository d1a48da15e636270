//! Proportional (roulette-wheel) destination selection.

use rand::Rng;

use crate::weights::WeightTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("weight table has no entries")]
    EmptyTable,
    #[error("all weights in the table are zero")]
    ZeroTotalWeight,
}

/// Checks that `table` can be drawn from at all.
pub fn validate(table: &WeightTable) -> Result<u128, SelectionError> {
    if table.is_empty() {
        return Err(SelectionError::EmptyTable);
    }
    match table.total_weight() {
        0 => Err(SelectionError::ZeroTotalWeight),
        total => Ok(total),
    }
}

/// Draws one destination with probability proportional to its weight.
///
/// The table is never modified; only the random source advances.
pub fn select<'a, R: Rng + ?Sized>(
    table: &'a WeightTable,
    rng: &mut R,
) -> Result<&'a std::path::Path, SelectionError> {
    let total = validate(table)?;
    let draw = rng.gen_range(0..total);
    let mut running = 0u128;
    for entry in table.entries() {
        running += u128::from(entry.weight);
        if running > draw {
            return Ok(&entry.path);
        }
    }
    // draw < total, so the loop returns before running out of entries
    unreachable!("draw {draw} not covered by total weight {total}")
}

/// Owns the random source used for repeated draws against a read-only table.
#[derive(Debug)]
pub struct WeightedSelector<R> {
    rng: R,
}

impl WeightedSelector<rand::rngs::ThreadRng> {
    #[must_use]
    pub fn from_thread_rng() -> Self {
        Self::new(rand::thread_rng())
    }
}

impl<R: Rng> WeightedSelector<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn select<'a>(
        &mut self,
        table: &'a WeightTable,
    ) -> Result<&'a std::path::Path, SelectionError> {
        select(table, &mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use rand::SeedableRng;

    fn seeded() -> WeightedSelector<rand::rngs::StdRng> {
        WeightedSelector::new(rand::rngs::StdRng::seed_from_u64(0x5eed))
    }

    #[test]
    fn empty_table_fails() {
        let table = WeightTable::default();
        assert_eq!(seeded().select(&table), Err(SelectionError::EmptyTable));
    }

    #[test]
    fn all_zero_weights_fail() -> Result<()> {
        let table = WeightTable::parse("0:/a\n0:/b")?;
        assert_eq!(seeded().select(&table), Err(SelectionError::ZeroTotalWeight));
        Ok(())
    }

    #[test]
    fn zero_weight_entry_is_never_selected() -> Result<()> {
        let table = WeightTable::parse("0:/a\n5:/b")?;
        let mut selector = seeded();
        for _ in 0..10_000 {
            assert_eq!(selector.select(&table)?, std::path::Path::new("/b"));
        }
        Ok(())
    }

    #[test]
    fn single_entry_always_wins() -> Result<()> {
        let table = WeightTable::parse("7:/only")?;
        let mut selector = seeded();
        for _ in 0..100 {
            assert_eq!(selector.select(&table)?, std::path::Path::new("/only"));
        }
        Ok(())
    }

    #[test]
    fn selection_is_proportional_to_weight() -> Result<()> {
        let table = WeightTable::parse("1:/a\n3:/b")?;
        let mut selector = seeded();
        let draws = 100_000;
        let mut hits_b = 0;
        for _ in 0..draws {
            if selector.select(&table)? == std::path::Path::new("/b") {
                hits_b += 1;
            }
        }
        let frequency = f64::from(hits_b) / f64::from(draws);
        assert!((frequency - 0.75).abs() < 0.02, "frequency of /b: {frequency}");
        Ok(())
    }

    #[test]
    fn duplicate_paths_contribute_independently() -> Result<()> {
        // /a appears twice with total weight 3 against /b with 1
        let table = WeightTable::parse("1:/a\n1:/b\n2:/a")?;
        let mut selector = seeded();
        let draws = 100_000;
        let mut hits_a = 0;
        for _ in 0..draws {
            if selector.select(&table)? == std::path::Path::new("/a") {
                hits_a += 1;
            }
        }
        let frequency = f64::from(hits_a) / f64::from(draws);
        assert!((frequency - 0.75).abs() < 0.02, "frequency of /a: {frequency}");
        Ok(())
    }

    #[test]
    fn huge_weights_stay_proportional() -> Result<()> {
        // the total exceeds u64, so the draw must be made over u128
        let max = u64::MAX;
        let table = WeightTable::parse(&format!("{max}:/a\n{max}:/b\n0:/c"))?;
        let mut selector = seeded();
        let draws = 10_000;
        let mut hits_a = 0;
        for _ in 0..draws {
            let choice = selector.select(&table)?;
            assert_ne!(choice, std::path::Path::new("/c"));
            if choice == std::path::Path::new("/a") {
                hits_a += 1;
            }
        }
        let frequency = f64::from(hits_a) / f64::from(draws);
        assert!((frequency - 0.5).abs() < 0.03, "frequency of /a: {frequency}");
        Ok(())
    }

    #[test]
    fn validate_reports_total() -> Result<()> {
        assert_eq!(validate(&WeightTable::parse("2:/a\n3:/b")?)?, 5);
        Ok(())
    }
}
