//! BallNet CLI library.
//!
//! Command implementations for the `ballnet` binary: force and deformation
//! prediction, variant inspection and environment checks.

pub mod commands;
