//! GPIO pin naming
//!
//! The transfer engine never drives pins itself; it only needs to name the
//! RTS/CTS pins selected for hardware flow control so they can be checked
//! against the peripheral's pin map and recorded.

/// GPIO port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    H,
}

/// A physical pin, e.g. `PA12`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin {
    pub port: Port,
    pub number: u8,
}

impl Pin {
    /// Create a pin from its port and number (0-15)
    pub const fn new(port: Port, number: u8) -> Self {
        Self { port, number }
    }
}
