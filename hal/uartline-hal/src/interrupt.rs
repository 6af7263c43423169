//! Interrupt controller abstraction
//!
//! Covers the handful of NVIC operations the engine performs while
//! installing a handler for a peripheral: clear pending, disable the line,
//! set priority, install the vector, enable the line.

/// Interrupt handler installed at a vector
pub type Vector = extern "C" fn();

/// Interrupt line number (position in the device vector table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Irq(pub u16);

/// Interrupt controller operations
pub trait InterruptController {
    /// Clear a pending request on the line
    fn clear_pending(&mut self, irq: Irq);

    /// Disable (mask) the line
    fn disable(&mut self, irq: Irq);

    /// Enable (unmask) the line
    fn enable(&mut self, irq: Irq);

    /// Set the line's priority (0 is the most urgent)
    fn set_priority(&mut self, irq: Irq, priority: u8);

    /// Install a handler at the line's vector
    fn set_vector(&mut self, irq: Irq, vector: Vector);

    /// Replace the handler of a line with the line disabled
    ///
    /// The sequence is: clear pending, disable, set priority, set vector,
    /// enable. This is the only point where the engine masks a line, and
    /// it masks exactly one.
    fn install(&mut self, irq: Irq, priority: u8, vector: Vector) {
        self.clear_pending(irq);
        self.disable(irq);
        self.set_priority(irq, priority);
        self.set_vector(irq, vector);
        self.enable(irq);
    }
}
