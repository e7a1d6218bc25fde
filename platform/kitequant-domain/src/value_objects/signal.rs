use std::cmp::Ordering;

/// Sign of `fast - slow` on one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendSign {
    Below,
    Equal,
    Above,
}

impl TrendSign {
    pub fn from_averages(fast: f64, slow: f64) -> Self {
        match fast.partial_cmp(&slow) {
            Some(Ordering::Greater) => TrendSign::Above,
            Some(Ordering::Less) => TrendSign::Below,
            _ => TrendSign::Equal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossover {
    Buy,
    Sell,
}

impl Crossover {
    /// Buy when the fast average moves from at/below to strictly above the
    /// slow one; sell when it moves from at/above to strictly below.
    pub fn between(previous: TrendSign, current: TrendSign) -> Option<Self> {
        match (previous, current) {
            (TrendSign::Below | TrendSign::Equal, TrendSign::Above) => Some(Crossover::Buy),
            (TrendSign::Above | TrendSign::Equal, TrendSign::Below) => Some(Crossover::Sell),
            _ => None,
        }
    }
}
