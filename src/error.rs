//! Errors reported by [`CyclicQueue`](crate::CyclicQueue).
//!
//! Both variants are usage errors: they mean the caller broke the
//! fetch-then-remove protocol, so they are returned straight away and never
//! retried internally.

use std::fmt;

/// Protocol violations on a [`CyclicQueue`](crate::CyclicQueue).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The queue holds no items, so there is nothing to fetch or remove.
    EmptyContainer,
    /// No item is checked out: nothing was fetched since the last removal.
    NoCurrentPosition,
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyContainer => write!(f, "round-robin queue is empty"),
            Error::NoCurrentPosition => write!(f, "no item is checked out for removal"),
        }
    }
}

impl std::error::Error for Error {}
