//! Shared I/O stores.
//!
//! The three stores are owned for the whole process lifetime and reached by
//! the driver loop and by both protocol front ends. Each store sits behind
//! its own blocking mutex, so a request touching one store never waits on
//! another, and every handler sees a store only between complete updates.
//!
//! ```text
//!  RTU front end ──┐
//!                  ├──▶ SharedIo ──▶ Mutex<ExpanderBank>
//!  TCP front end ──┤               ├▶ Mutex<AnalogCache>
//!                  │               └▶ Mutex<VirtualRegisters>
//!  driver loop ────┘
//! ```

pub mod analog;
pub mod expander;
pub mod registers;

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;

use analog::AnalogCache;
use expander::ExpanderBank;
use registers::VirtualRegisters;

/// `true` when a store that last refreshed at `last` is due again at `now`.
///
/// Timestamps are a wrapping millisecond counter. A store that has never
/// refreshed is always due.
pub(crate) fn interval_elapsed(last: Option<u32>, now_ms: u32, interval_ms: u32) -> bool {
    match last {
        None => true,
        Some(t) => now_ms.wrapping_sub(t) >= interval_ms,
    }
}

/// The process-wide stores, one lock per store.
pub struct SharedIo<M: RawMutex, B, S> {
    expander: Mutex<M, RefCell<ExpanderBank<B>>>,
    analog: Mutex<M, RefCell<AnalogCache<S>>>,
    registers: Mutex<M, RefCell<VirtualRegisters>>,
}

impl<M: RawMutex, B, S> SharedIo<M, B, S> {
    pub fn new(expander: ExpanderBank<B>, analog: AnalogCache<S>, registers: VirtualRegisters) -> Self {
        Self {
            expander: Mutex::new(RefCell::new(expander)),
            analog: Mutex::new(RefCell::new(analog)),
            registers: Mutex::new(RefCell::new(registers)),
        }
    }

    /// Run `f` with exclusive access to the expander bank.
    ///
    /// `f` must not re-enter `SharedIo` for the same store.
    pub fn with_expander<R>(&self, f: impl FnOnce(&mut ExpanderBank<B>) -> R) -> R {
        self.expander.lock(|cell| f(&mut cell.borrow_mut()))
    }

    pub fn with_analog<R>(&self, f: impl FnOnce(&mut AnalogCache<S>) -> R) -> R {
        self.analog.lock(|cell| f(&mut cell.borrow_mut()))
    }

    pub fn with_registers<R>(&self, f: impl FnOnce(&mut VirtualRegisters) -> R) -> R {
        self.registers.lock(|cell| f(&mut cell.borrow_mut()))
    }
}
