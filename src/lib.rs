//! KC868 Modbus I/O bridge library.
//!
//! Exposes the I/O stores, the protocol bridge and the radio pipeline for
//! integration testing. ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod console;
pub mod error;
pub mod io;
pub mod modbus;
pub mod radio;

pub mod pins;

#[cfg(target_os = "espidf")]
mod critical_section_impl;
