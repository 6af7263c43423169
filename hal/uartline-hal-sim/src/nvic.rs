//! Interrupt controller model

use uartline_hal::{InterruptController, Irq, Vector};

/// Number of device interrupt lines modelled (STM32L0 has 32)
pub const LINES: usize = 32;

/// Recorded state of one interrupt line
#[derive(Debug, Clone, Copy, Default)]
pub struct LineState {
    pub enabled: bool,
    pub pending: bool,
    pub priority: u8,
    pub vector: Option<Vector>,
}

/// Interrupt controller that only records what was asked of it
#[derive(Debug, Clone)]
pub struct SimNvic {
    lines: [LineState; LINES],
    installs: u32,
}

impl Default for SimNvic {
    fn default() -> Self {
        Self::new()
    }
}

impl SimNvic {
    /// Create a controller with every line disabled
    pub fn new() -> Self {
        Self {
            lines: [LineState::default(); LINES],
            installs: 0,
        }
    }

    /// State of a line
    pub fn line(&self, irq: Irq) -> LineState {
        self.lines[irq.0 as usize]
    }

    /// Mark a line pending
    pub fn pend(&mut self, irq: Irq) {
        self.lines[irq.0 as usize].pending = true;
    }

    /// Check whether the line's vector is the given handler
    pub fn vector_is(&self, irq: Irq, vector: Vector) -> bool {
        self.line(irq)
            .vector
            .is_some_and(|v| v as usize == vector as usize)
    }

    /// Number of vector installations performed
    pub fn installs(&self) -> u32 {
        self.installs
    }
}

impl InterruptController for SimNvic {
    fn clear_pending(&mut self, irq: Irq) {
        self.lines[irq.0 as usize].pending = false;
    }

    fn disable(&mut self, irq: Irq) {
        self.lines[irq.0 as usize].enabled = false;
    }

    fn enable(&mut self, irq: Irq) {
        self.lines[irq.0 as usize].enabled = true;
    }

    fn set_priority(&mut self, irq: Irq, priority: u8) {
        self.lines[irq.0 as usize].priority = priority;
    }

    fn set_vector(&mut self, irq: Irq, vector: Vector) {
        self.lines[irq.0 as usize].vector = Some(vector);
        self.installs += 1;
    }
}
