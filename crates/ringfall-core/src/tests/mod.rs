//! Crate-level integration tests.
//!
//! Unit tests live next to their modules; the scenarios here exercise the
//! arena rules end to end through the public API, the way the input shell
//! and bot layers drive them.

mod helpers;
mod integration;
