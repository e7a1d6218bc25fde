use std::collections::VecDeque;

/// Arithmetic mean of the last `window` values.
#[derive(Debug, Clone)]
pub struct RollingSma {
    window: usize,
    buf: VecDeque<f64>,
}

impl RollingSma {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            buf: VecDeque::with_capacity(window),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        if self.window == 0 {
            return None;
        }

        self.buf.push_back(value);
        while self.buf.len() > self.window {
            self.buf.pop_front();
        }
        self.value()
    }

    /// Summed from the window on every call so that equal windows always
    /// produce bit-identical means.
    pub fn value(&self) -> Option<f64> {
        if self.window == 0 || self.buf.len() < self.window {
            return None;
        }
        Some(self.buf.iter().sum::<f64>() / self.window as f64)
    }
}
