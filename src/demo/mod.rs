pub mod basic;
pub mod workers;
