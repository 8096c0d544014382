use crate::error::ReconcileError;

/// A cyclic slot-machine strip of equally tall symbols.
///
/// Offsets grow forward forever, like wheel rotation; the symbol under the
/// payline at offset `o` is the one whose centre band covers
/// `o mod circumference`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReelStrip {
    symbols: Vec<String>,
    symbol_height: f64,
}

impl ReelStrip {
    pub fn new(symbols: Vec<String>, symbol_height: f64) -> Result<Self, ReconcileError> {
        if symbols.is_empty() {
            return Err(ReconcileError::InvalidReel("strip has no symbols".to_string()));
        }
        if !symbol_height.is_finite() || symbol_height <= 0.0 {
            return Err(ReconcileError::InvalidReel(format!(
                "symbol height must be positive, got {}",
                symbol_height
            )));
        }
        Ok(Self {
            symbols,
            symbol_height,
        })
    }

    pub fn circumference(&self) -> f64 {
        self.symbols.len() as f64 * self.symbol_height
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Offset residue that centres symbol `index` on the payline.
    pub fn centre_of(&self, index: usize) -> f64 {
        (index as f64 + 0.5) * self.symbol_height
    }

    pub fn symbol_at(&self, offset: f64) -> &str {
        let local = offset.rem_euclid(self.circumference());
        let index = ((local / self.symbol_height) as usize).min(self.symbols.len() - 1);
        &self.symbols[index]
    }

    /// Smallest forward offset from `current` that centres `symbol_id`, plus
    /// `extra_loops` full revolutions. Unknown symbols land on the first one.
    pub fn target_offset(&self, current: f64, symbol_id: &str, extra_loops: u32) -> f64 {
        let index = match self.symbols.iter().position(|s| s == symbol_id) {
            Some(index) => index,
            None => {
                log::info!("Symbol {} not on strip, landing on {}", symbol_id, self.symbols[0]);
                0
            }
        };

        let circumference = self.circumference();
        let base = (current / circumference).floor() * circumference;
        let mut target = base + self.centre_of(index);
        if target < current {
            target += circumference;
        }
        target + circumference * extra_loops as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip() -> ReelStrip {
        let symbols = ["cherry", "bell", "seven", "bar"].iter().map(|s| s.to_string()).collect();
        ReelStrip::new(symbols, 100.0).unwrap()
    }

    #[test]
    fn test_rejects_bad_strips() {
        assert!(matches!(ReelStrip::new(vec![], 10.0), Err(ReconcileError::InvalidReel(_))));
        assert!(matches!(ReelStrip::new(vec!["a".into()], 0.0), Err(ReconcileError::InvalidReel(_))));
    }

    #[test]
    fn test_target_centres_symbol() {
        let strip = strip();
        let target = strip.target_offset(0.0, "seven", 3);
        assert_eq!(target, 250.0 + 1200.0);
        assert_eq!(strip.symbol_at(target), "seven");
    }

    #[test]
    fn test_target_only_moves_forward() {
        let strip = strip();
        let mut offset = 0.0;
        for symbol in ["bar", "cherry", "cherry", "bell", "seven"] {
            let target = strip.target_offset(offset, symbol, 2);
            assert!(target > offset);
            assert_eq!(strip.symbol_at(target), symbol);
            offset = target;
        }
    }

    #[test]
    fn test_unknown_symbol_lands_on_first() {
        let strip = strip();
        assert_eq!(strip.symbol_at(strip.target_offset(130.0, "lemon", 1)), "cherry");
    }
}
