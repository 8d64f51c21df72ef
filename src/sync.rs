// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Interrupt-safe shared cells.
//!
//! Every value that is touched both from an interrupt handler and from the main loop, and that is
//! wider than a single atomic word, lives in a [`Shared`]. Access happens inside a critical
//! section, so a handler can never observe a half-written value (e.g. a 32-bit plane coefficient
//! or a motor's direction/duty pair).

use core::cell::RefCell;

use critical_section::Mutex;

/// A value guarded by a critical section.
///
/// `const`-constructible so it can back a `static`.
pub struct Shared<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> Shared<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Run `f` with shared access to the value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        critical_section::with(|cs| f(&self.inner.borrow_ref(cs)))
    }

    /// Run `f` with exclusive access to the value.
    ///
    /// Must not be re-entered from inside `f`.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    /// Replace the value, returning the previous one.
    pub fn replace(&self, value: T) -> T {
        critical_section::with(|cs| self.inner.borrow(cs).replace(value))
    }
}

impl<T: Copy> Shared<T> {
    /// Copy the value out.
    pub fn get(&self) -> T {
        self.with(|v| *v)
    }
}
