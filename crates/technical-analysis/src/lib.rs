pub mod indicators;
pub mod analyzer;

#[cfg(test)]
mod analyzer_tests;

pub use indicators::*;
pub use analyzer::*;
