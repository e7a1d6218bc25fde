use crate::value_objects::bar::Bar;

/// Pull-based bar feed; exhausted when `next_bar` returns `None`.
pub trait BarSource {
    fn next_bar(&mut self) -> Option<Bar>;
}

pub struct VecBarSource {
    bars: Vec<Bar>,
    index: usize,
}

impl VecBarSource {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars, index: 0 }
    }
}

impl BarSource for VecBarSource {
    fn next_bar(&mut self) -> Option<Bar> {
        let bar = self.bars.get(self.index)?.clone();
        self.index += 1;
        Some(bar)
    }
}

/// Adapts any lazily produced iterator of bars.
pub struct IterBarSource<I> {
    inner: I,
}

impl<I> IterBarSource<I>
where
    I: Iterator<Item = Bar>,
{
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<I> BarSource for IterBarSource<I>
where
    I: Iterator<Item = Bar>,
{
    fn next_bar(&mut self) -> Option<Bar> {
        self.inner.next()
    }
}
