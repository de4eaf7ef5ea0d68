//! `critical-section` 1.x provider for ESP-IDF.
//!
//! The shared stores lock through `CriticalSectionRawMutex` and the
//! expander store is held across blocking I2C transfers, so the section is
//! a FreeRTOS-backed `std::sync::Mutex` rather than an interrupt mask.
//! Nesting on one thread is tracked with a depth counter.
//!
//! Interrupt handlers must never enter this section.

use core::cell::{Cell, RefCell};
use std::sync::{Mutex, MutexGuard, PoisonError};

static SECTION: Mutex<()> = Mutex::new(());

thread_local! {
    static DEPTH: Cell<u8> = const { Cell::new(0) };
    static GUARD: RefCell<Option<MutexGuard<'static, ()>>> = const { RefCell::new(None) };
}

#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_acquire() -> u8 {
    DEPTH.with(|depth| {
        let d = depth.get();
        if d == 0 {
            // poisoned: take it over
            let lock = SECTION.lock().unwrap_or_else(PoisonError::into_inner);
            GUARD.with(|guard| *guard.borrow_mut() = Some(lock));
        }
        let nested = d.saturating_add(1);
        depth.set(nested);
        nested
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_release(_token: u8) {
    DEPTH.with(|depth| {
        let d = depth.get();
        if d == 0 {
            return;
        }
        depth.set(d - 1);
        if d == 1 {
            GUARD.with(|guard| *guard.borrow_mut() = None);
        }
    });
}
