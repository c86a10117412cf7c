//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock peripherals. All tests run on the host with no real
//! hardware required.

mod debounce_flow_tests;
mod mock_hw;
mod sequencer_flow_tests;
