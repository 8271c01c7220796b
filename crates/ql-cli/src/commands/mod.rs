//! CLI command implementations

pub(crate) mod lower;
