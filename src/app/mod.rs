//! Application core: bridge orchestration with no direct hardware access.
//!
//! The driver loop (input refresh, mirroring, analog sampling, radio
//! debounce) and the console command handling live here. Hardware is
//! reached only through the **port traits** in [`ports`], so the whole
//! layer runs on the host against mocks.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
