pub(crate) mod smoothing_window;
pub(crate) mod stats;

use clam_common::Real;

pub use smoothing_window::SmoothingWindow;
pub use stats::Stats;

pub trait Window: Clone {
    type OutputType;

    fn push(&mut self, value: Real) -> bool;
    fn output(&self) -> Option<Self::OutputType>;
}

#[derive(Clone)]
pub struct WindowIter<I, W>
where
    I: Iterator<Item = Real>,
    W: Window,
{
    window_function: W,
    source: I,
}

impl<I, W> WindowIter<I, W>
where
    I: Iterator<Item = Real>,
    W: Window,
{
    pub fn new(source: I, window_function: W) -> Self {
        WindowIter {
            source,
            window_function,
        }
    }
}

impl<I, W> Iterator for WindowIter<I, W>
where
    I: Iterator<Item = Real>,
    W: Window,
{
    type Item = W::OutputType;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let value = self.source.next()?;
            if self.window_function.push(value) {
                return self.window_function.output();
            }
        }
    }
}

pub trait WindowFilter<I, W>
where
    I: Iterator<Item = Real>,
    W: Window,
{
    fn window(self, window: W) -> WindowIter<I, W>;
}

impl<I, W> WindowFilter<I, W> for I
where
    I: Iterator<Item = Real>,
    W: Window,
{
    fn window(self, window: W) -> WindowIter<I, W> {
        WindowIter::<I, W>::new(self, window)
    }
}
