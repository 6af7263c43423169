//! UART line configuration
//!
//! The hardware-control block recorded per peripheral slot and pushed to the
//! register layer on every reconfiguration.

use crate::gpio::Pin;

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl UartConfig {
    /// Default 8N1 framing at the given baud rate
    pub fn with_baudrate(baudrate: u32) -> Self {
        Self {
            baudrate,
            ..Self::default()
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
    Nine,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

/// Hardware flow control selection
///
/// Only the mode and the pins are recorded; electrical setup of the pins is
/// left to the board support code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlowControl {
    #[default]
    None,
    /// RTS driven on the given pin
    Rts(Pin),
    /// CTS sampled on the given pin
    Cts(Pin),
    /// Both RTS and CTS
    RtsCts { rts: Pin, cts: Pin },
}

impl FlowControl {
    /// Pin carrying RTS, if any
    pub fn rts(&self) -> Option<Pin> {
        match *self {
            FlowControl::Rts(pin) | FlowControl::RtsCts { rts: pin, .. } => Some(pin),
            _ => None,
        }
    }

    /// Pin carrying CTS, if any
    pub fn cts(&self) -> Option<Pin> {
        match *self {
            FlowControl::Cts(pin) | FlowControl::RtsCts { cts: pin, .. } => Some(pin),
            _ => None,
        }
    }
}
