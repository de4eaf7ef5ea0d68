//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below exercises one subsystem against the mock adapters in
//! `mock_hw`. Everything runs on the host with no real hardware.

mod bridge_tests;
mod concurrency_tests;
mod debounce_tests;
mod mock_hw;
mod service_tests;
