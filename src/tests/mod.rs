//! Test suite for the block builder
//!
//! Tests are grouped by pipeline stage; `example_blocks` holds the handlers
//! and page fixtures they share.

#[cfg(test)]
mod registry_tests;
#[cfg(test)]
mod update_tests;
#[cfg(test)]
mod property_tests;
