//! Pathlookup CLI library.
//!
//! Terminal styling and report renderers for the `pathlookup-cli` binary.

pub mod output;
pub mod terminal;

#[cfg(test)]
pub(crate) mod test_helpers;
