//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against the simulated platform adapters.  All tests run on the host
//! with no sensor or audio hardware required.

mod runtime_tests;
mod session_tests;
