//! Crate-level tests and shared test support.

pub(crate) mod support;
