//! Registry shared between foreground and interrupt context
//!
//! The registry lives in a `static` behind a critical-section mutex. Every
//! access, from `main` or from an interrupt vector, goes through
//! [`with_registry`], so no two contexts can touch a slot at once.
//!
//! ```ignore
//! static SERIAL: SharedRegistry<Usart, 4> = shared();
//!
//! extern "C" fn usart2_rx() {
//!     let events = with_registry(&SERIAL, |reg| {
//!         let slot = reg.resolve(PeripheralId::Usart2)?;
//!         Some(reg.handle_interrupt(slot))
//!     });
//!     // forward `events` to the application
//! }
//! ```

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use uartline_hal::UartHal;

use crate::registry::Registry;

/// A registry behind a critical-section mutex
pub type SharedRegistry<H, const N: usize> = Mutex<CriticalSectionRawMutex, RefCell<Registry<H, N>>>;

/// An empty shared registry, usable as a `static` initializer
pub const fn shared<H: UartHal + 'static, const N: usize>() -> SharedRegistry<H, N> {
    Mutex::new(RefCell::new(Registry::new()))
}

/// Run `f` with exclusive access to the registry
///
/// Panics if called re-entrantly from inside `f`.
pub fn with_registry<H, const N: usize, R>(
    shared: &SharedRegistry<H, N>,
    f: impl FnOnce(&mut Registry<H, N>) -> R,
) -> R
where
    H: UartHal + 'static,
{
    shared.lock(|cell| f(&mut *cell.borrow_mut()))
}
