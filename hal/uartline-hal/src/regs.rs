//! USART register capability set
//!
//! Everything the transfer engine needs from a serial peripheral: status
//! flags, interrupt sources, the data register, and the vendor's
//! interrupt-driven transfer routines together with their bookkeeping
//! (busy state, transfer size and remaining count).

use bitflags::bitflags;

use crate::uart::{FlowControl, UartConfig};

/// Errors reported by the vendor transfer routines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// A transfer is already running in that direction
    Busy,
    /// Generic failure
    Error,
    /// Operation timed out
    Timeout,
}

/// USART status flags (ISR register)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Flag {
    /// Transmit data register empty
    Txe,
    /// Transmission complete
    Tc,
    /// Read data register not empty
    Rxne,
    /// Parity error
    Pe,
    /// Framing error
    Fe,
    /// Noise detected
    Ne,
    /// Overrun error
    Ore,
}

/// USART interrupt sources
///
/// `Err` is the shared error-interrupt enable covering framing, noise and
/// overrun; `Fe`, `Ne` and `Ore` name the individual conditions behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Interrupt {
    Txe,
    Tc,
    Rxne,
    Pe,
    Err,
    Fe,
    Ne,
    Ore,
}

/// Transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Tx,
    Rx,
}

bitflags! {
    /// Directions with an outstanding interrupt-driven transfer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BusyState: u8 {
        const TX = 1 << 0;
        const RX = 1 << 1;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for BusyState {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "BusyState({=u8:#x})", self.bits())
    }
}

impl BusyState {
    /// Busy state after the given direction is released
    ///
    /// Busy in both directions drops to the other one; busy in this
    /// direction only drops to idle.
    pub fn release(self, dir: Direction) -> Self {
        match dir {
            Direction::Tx => self.difference(BusyState::TX),
            Direction::Rx => self.difference(BusyState::RX),
        }
    }

    /// Check whether the given direction is busy
    pub fn is_busy(self, dir: Direction) -> bool {
        match dir {
            Direction::Tx => self.contains(BusyState::TX),
            Direction::Rx => self.contains(BusyState::RX),
        }
    }
}

/// Register-level access to one serial peripheral
///
/// Implementations wrap the peripheral's registers and the vendor's
/// interrupt-driven transfer state (the handle). The engine owns one
/// implementation per peripheral slot.
pub trait UartHal {
    /// Read a status flag
    fn flag(&self, flag: Flag) -> bool;

    /// Clear a status flag (ICR write)
    fn clear_flag(&mut self, flag: Flag);

    /// Check whether the condition behind an interrupt source is raised
    fn interrupt_pending(&self, it: Interrupt) -> bool;

    /// Check whether an interrupt source is enabled (CR bit set)
    fn interrupt_enabled(&self, it: Interrupt) -> bool;

    /// Enable an interrupt source
    fn enable_interrupt(&mut self, it: Interrupt);

    /// Disable an interrupt source
    fn disable_interrupt(&mut self, it: Interrupt);

    /// Read the receive data register
    ///
    /// Reading clears the receive-not-empty flag.
    fn read_data(&mut self) -> u16;

    /// Write the transmit data register
    fn write_data(&mut self, value: u16);

    /// Request transmission of a break frame
    fn request_break(&mut self);

    /// Apply line configuration and flow control
    fn configure(&mut self, config: &UartConfig, flow: FlowControl);

    /// Start an interrupt-driven transmit of `len` bytes
    ///
    /// Enables the transmit-empty interrupt source. Bytes are fetched from
    /// the buffer passed to [`UartHal::service_irq`].
    fn start_transmit_it(&mut self, len: usize) -> Result<(), HalError>;

    /// Start an interrupt-driven receive of `len` bytes
    ///
    /// Enables the receive-not-empty, parity and error interrupt sources.
    fn start_receive_it(&mut self, len: usize) -> Result<(), HalError>;

    /// Current busy state of the handle
    fn busy_state(&self) -> BusyState;

    /// Overwrite the busy state of the handle
    fn set_busy_state(&mut self, state: BusyState);

    /// Bytes still to transfer in a direction
    fn remaining(&self, dir: Direction) -> usize;

    /// Overwrite the remaining count of a direction
    fn set_remaining(&mut self, dir: Direction, count: usize);

    /// Size of the transfer last started in a direction
    ///
    /// The vendor routines may reset this to zero once the transfer ends.
    fn transfer_size(&self, dir: Direction) -> usize;

    /// Run the vendor interrupt service routine
    ///
    /// Moves at most one byte per direction between the data registers and
    /// the given buffers, decrements the remaining counts and performs
    /// end-of-transfer bookkeeping (interrupt sources, busy state).
    fn service_irq(&mut self, tx: &[u8], rx: &mut [u8]);
}
