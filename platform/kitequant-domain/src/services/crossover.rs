use crate::services::features::RollingSma;
use crate::value_objects::signal::{Crossover, TrendSign};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossoverUpdate {
    pub fast: Option<f64>,
    pub slow: Option<f64>,
    pub crossover: Option<Crossover>,
}

/// Fast/slow moving averages plus the previous bar's trend sign.
#[derive(Debug, Clone)]
pub struct CrossoverDetector {
    fast: RollingSma,
    slow: RollingSma,
    previous: Option<TrendSign>,
}

impl CrossoverDetector {
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        Self {
            fast: RollingSma::new(fast_period),
            slow: RollingSma::new(slow_period),
            previous: None,
        }
    }

    pub fn update(&mut self, close: f64) -> CrossoverUpdate {
        let fast = self.fast.update(close);
        let slow = self.slow.update(close);

        let crossover = match (fast, slow) {
            (Some(fast), Some(slow)) => {
                let current = TrendSign::from_averages(fast, slow);
                let crossover = self
                    .previous
                    .and_then(|previous| Crossover::between(previous, current));
                self.previous = Some(current);
                crossover
            }
            _ => None,
        };

        CrossoverUpdate {
            fast,
            slow,
            crossover,
        }
    }
}
