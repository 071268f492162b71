pub(crate) mod iter;

pub use iter::{EventFilter, EventIter};
