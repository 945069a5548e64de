//! Feature modules composed into the main app, or run on their own

pub mod payments;
pub mod support;
