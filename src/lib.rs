//! A round-robin container: items are handed out one at a time in a
//! repeating, fair order, and the item just handed out can be removed in
//! place. See [`CyclicQueue`].

#[macro_use]
extern crate log;

pub mod cycle;
pub mod error;
pub mod version;

pub use cycle::CyclicQueue;
pub use error::{Error, Result};
