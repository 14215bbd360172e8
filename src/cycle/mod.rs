//! The round-robin container and its iterators.

pub use self::iter::{IntoIter, Iter, IterMut};
pub use self::queue::CyclicQueue;

mod iter;
mod queue;
mod slots;
