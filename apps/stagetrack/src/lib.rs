//! # Stagetrack application library
//!
//! The binary's modules, exposed as a library so integration tests can
//! exercise the HTTP router and tool dispatch directly.

pub mod api;
pub mod cli;
pub mod tools;
