//! Shared utilities.
//!
//! Frame timing and per-frame callback scheduling live here; everything the
//! pipeline needs beyond GPU state is deliberately small.

pub mod frame_clock;
