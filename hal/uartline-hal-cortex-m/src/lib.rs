//! Cortex-M binding for the uartline interrupt controller trait
//!
//! Line masking, pending clear and priority go through
//! `cortex_m::peripheral::NVIC`. Handlers are installed by writing the
//! device entry of the vector table that VTOR points at, so the table must
//! have been copied to RAM and VTOR relocated before [`CortexNvic`] is
//! created.
//!
//! # Usage
//!
//! ```ignore
//! let cp = cortex_m::Peripherals::take().unwrap();
//! // SAFETY: startup code relocated the vector table to RAM
//! let mut nvic = unsafe { CortexNvic::new(cp.NVIC) };
//! ```

#![no_std]

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::{NVIC, SCB};
use uartline_hal::{InterruptController, Irq, Vector};

/// Priority bits implemented by the core (Cortex-M0+)
pub const NVIC_PRIO_BITS: u8 = 2;

/// System exception entries preceding the first device interrupt
const EXCEPTION_ENTRIES: usize = 16;

#[derive(Clone, Copy)]
struct Line(u16);

// SAFETY: `Line` is only built from `Irq` values naming device interrupts
unsafe impl InterruptNumber for Line {
    fn number(self) -> u16 {
        self.0
    }
}

/// NVIC with a RAM vector table
pub struct CortexNvic {
    nvic: NVIC,
}

impl CortexNvic {
    /// Take ownership of the NVIC
    ///
    /// # Safety
    ///
    /// VTOR must point at a writable copy of the vector table that is large
    /// enough for every line passed to [`InterruptController::set_vector`].
    pub unsafe fn new(nvic: NVIC) -> Self {
        Self { nvic }
    }

    /// Release the NVIC
    pub fn free(self) -> NVIC {
        self.nvic
    }
}

/// Convert a logical priority (0 most urgent) to the NVIC register value
pub const fn hw_priority(priority: u8) -> u8 {
    priority << (8 - NVIC_PRIO_BITS)
}

/// Address of a device line's entry in the vector table at `vtor`
pub const fn vector_entry(vtor: u32, irq: Irq) -> usize {
    vtor as usize + (EXCEPTION_ENTRIES + irq.0 as usize) * core::mem::size_of::<u32>()
}

impl InterruptController for CortexNvic {
    fn clear_pending(&mut self, irq: Irq) {
        NVIC::unpend(Line(irq.0));
    }

    fn disable(&mut self, irq: Irq) {
        NVIC::mask(Line(irq.0));
    }

    fn enable(&mut self, irq: Irq) {
        // SAFETY: the handler for this line is installed before it is unmasked
        unsafe { NVIC::unmask(Line(irq.0)) }
    }

    fn set_priority(&mut self, irq: Irq, priority: u8) {
        // SAFETY: priorities are only changed with the line masked
        unsafe { self.nvic.set_priority(Line(irq.0), hw_priority(priority)) }
    }

    fn set_vector(&mut self, irq: Irq, vector: Vector) {
        // SAFETY: `new` requires VTOR to reference a RAM table covering `irq`
        unsafe {
            let entry = vector_entry((*SCB::PTR).vtor.read(), irq) as *mut u32;
            core::ptr::write_volatile(entry, vector as usize as u32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hw_priority_uses_top_bits() {
        assert_eq!(hw_priority(0), 0x00);
        assert_eq!(hw_priority(1), 0x40);
        assert_eq!(hw_priority(3), 0xC0);
    }

    #[test]
    fn test_vector_entry_skips_exceptions() {
        // USART2 on a table relocated to the start of SRAM
        assert_eq!(vector_entry(0x2000_0000, Irq(28)), 0x2000_0000 + (16 + 28) * 4);
        assert_eq!(vector_entry(0, Irq(0)), 0x40);
    }
}
