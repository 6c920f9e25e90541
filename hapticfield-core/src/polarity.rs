//! Field polarity and the cell that shares it across threads

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI8, Ordering};

/// Sign multiplier applied to the whole force field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i8)]
pub enum Polarity {
    #[default]
    Positive = 1,
    Negative = -1,
}

impl Polarity {
    /// The polarity as a scalar factor
    pub fn sign(self) -> f64 {
        match self {
            Polarity::Positive => 1.0,
            Polarity::Negative => -1.0,
        }
    }

    /// The opposite polarity
    pub fn flipped(self) -> Self {
        match self {
            Polarity::Positive => Polarity::Negative,
            Polarity::Negative => Polarity::Positive,
        }
    }

    fn from_raw(raw: i8) -> Self {
        if raw < 0 {
            Polarity::Negative
        } else {
            Polarity::Positive
        }
    }
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarity::Positive => write!(f, "+1"),
            Polarity::Negative => write!(f, "-1"),
        }
    }
}

/// Process-wide polarity, written by the command handler and read once per
/// servo tick.
#[derive(Debug)]
pub struct PolarityCell {
    raw: AtomicI8,
}

impl PolarityCell {
    /// Create a cell holding `initial`
    pub fn new(initial: Polarity) -> Self {
        Self {
            raw: AtomicI8::new(initial as i8),
        }
    }

    /// Current polarity
    pub fn load(&self) -> Polarity {
        Polarity::from_raw(self.raw.load(Ordering::Acquire))
    }

    /// Replace the polarity
    pub fn store(&self, polarity: Polarity) {
        self.raw.store(polarity as i8, Ordering::Release);
    }

    /// Flip the polarity and return the new value
    pub fn toggle(&self) -> Polarity {
        // i8 negation is an involution on {1, -1}
        let previous = self.raw.fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| Some(-raw));
        match previous {
            Ok(raw) | Err(raw) => Polarity::from_raw(raw).flipped(),
        }
    }
}

impl Default for PolarityCell {
    fn default() -> Self {
        Self::new(Polarity::Positive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_sign_and_flip() {
        assert_eq!(Polarity::Positive.sign(), 1.0);
        assert_eq!(Polarity::Negative.sign(), -1.0);
        assert_eq!(Polarity::Positive.flipped(), Polarity::Negative);
        assert_eq!(Polarity::Negative.flipped().flipped(), Polarity::Negative);
    }

    #[test]
    fn test_cell_toggle_returns_new_value() {
        let cell = PolarityCell::default();
        assert_eq!(cell.load(), Polarity::Positive);
        assert_eq!(cell.toggle(), Polarity::Negative);
        assert_eq!(cell.load(), Polarity::Negative);
        assert_eq!(cell.toggle(), Polarity::Positive);
    }

    #[test]
    fn test_concurrent_toggles_are_not_lost() {
        let cell = Arc::new(PolarityCell::new(Polarity::Positive));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cell = Arc::clone(&cell);
                thread::spawn(move || {
                    for _ in 0..1001 {
                        cell.toggle();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        // 4004 flips is even
        assert_eq!(cell.load(), Polarity::Positive);
    }

    #[test]
    fn test_polarity_from_toml_name() {
        #[derive(Deserialize)]
        struct Holder {
            polarity: Polarity,
        }
        let holder: Holder = toml::from_str("polarity = \"negative\"").unwrap();
        assert_eq!(holder.polarity, Polarity::Negative);
    }
}
