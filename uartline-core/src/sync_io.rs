//! Blocking byte I/O
//!
//! Polls the status flags with no timeout. A peripheral that never raises
//! the flag hangs the caller; this path is used where a byte must go out
//! (or come in) before anything else can happen.

use core::convert::Infallible;

use uartline_hal::{Direction, Flag, UartHal};

use crate::registry::{Registry, SlotIndex};

/// Byte-level access to one peripheral
///
/// Handed to interrupt consumers by the demultiplexer, and usable anywhere
/// an `embedded-io` reader or writer is wanted.
pub struct ByteIo<'a, H: UartHal> {
    hal: &'a mut H,
}

impl<'a, H: UartHal> ByteIo<'a, H> {
    /// Wrap a peripheral's registers
    pub fn new(hal: &'a mut H) -> Self {
        Self { hal }
    }

    /// Check whether a received byte is waiting
    pub fn readable(&self) -> bool {
        self.hal.flag(Flag::Rxne)
    }

    /// Check whether the transmit data register can take a byte
    pub fn writable(&self) -> bool {
        self.hal.flag(Flag::Txe)
    }

    /// Wait for a byte and return it
    pub fn read_byte(&mut self) -> u8 {
        while !self.readable() {}
        (self.hal.read_data() & 0xFF) as u8
    }

    /// Wait for room and send a byte
    pub fn write_byte(&mut self, byte: u8) {
        while !self.writable() {}
        self.hal.write_data(byte as u16);
    }
}

impl<H: UartHal> embedded_io::ErrorType for ByteIo<'_, H> {
    type Error = Infallible;
}

impl<H: UartHal> embedded_io::Read for ByteIo<'_, H> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }

        // Block for the first byte only, then take what is already there
        buf[0] = self.read_byte();
        let mut count = 1;
        while count < buf.len() && self.readable() {
            buf[count] = self.read_byte();
            count += 1;
        }

        Ok(count)
    }
}

impl<H: UartHal> embedded_io::ReadReady for ByteIo<'_, H> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.readable())
    }
}

impl<H: UartHal> embedded_io::Write for ByteIo<'_, H> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        for &byte in buf {
            self.write_byte(byte);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        while !self.hal.flag(Flag::Tc) {}
        Ok(())
    }
}

impl<H: UartHal> embedded_io::WriteReady for ByteIo<'_, H> {
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.writable())
    }
}

impl<H: UartHal + 'static, const N: usize> Registry<H, N> {
    /// Byte I/O over a slot's peripheral
    pub fn byte_io(&mut self, slot: SlotIndex) -> ByteIo<'_, H> {
        ByteIo::new(&mut self.slot_mut(slot).hal)
    }

    /// Wait for a byte and return it
    pub fn blocking_read(&mut self, slot: SlotIndex) -> u8 {
        self.byte_io(slot).read_byte()
    }

    /// Wait for room and send a byte
    pub fn blocking_write(&mut self, slot: SlotIndex, byte: u8) {
        self.byte_io(slot).write_byte(byte)
    }

    /// Check whether a received byte is waiting
    pub fn readable(&self, slot: SlotIndex) -> bool {
        self.slot(slot).hal.flag(Flag::Rxne)
    }

    /// Check whether the transmit data register can take a byte
    pub fn writable(&self, slot: SlotIndex) -> bool {
        self.slot(slot).hal.flag(Flag::Txe)
    }

    /// Zero both hardware transfer counters
    ///
    /// Drops in-flight accounting without touching any register.
    pub fn clear(&mut self, slot: SlotIndex) {
        let hal = &mut self.slot_mut(slot).hal;
        hal.set_remaining(Direction::Tx, 0);
        hal.set_remaining(Direction::Rx, 0);
    }

    /// Send a break frame
    pub fn send_break(&mut self, slot: SlotIndex) {
        self.slot_mut(slot).hal.request_break();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::setup;
    use embedded_io::{Read, ReadReady, Write};
    use uartline_hal_sim::SimUart;

    #[test]
    fn test_blocking_write_reaches_line() {
        let (mut reg, slot, _) = setup();
        reg.blocking_write(slot, b'A');
        reg.blocking_write(slot, b'B');
        assert_eq!(reg.hal(slot).transmitted(), b"AB");
    }

    #[test]
    fn test_blocking_read_masks_and_clears() {
        let (mut reg, slot, _) = setup();
        reg.hal_mut(slot).inject_rx(0x5A);
        assert!(reg.readable(slot));

        assert_eq!(reg.blocking_read(slot), 0x5A);
        assert!(!reg.readable(slot));
    }

    #[test]
    fn test_clear_zeroes_counters_only() {
        let (mut reg, slot, _) = setup();
        reg.hal_mut(slot).start_transmit_it(4).unwrap();
        reg.hal_mut(slot).start_receive_it(8).unwrap();

        reg.clear(slot);

        let hal = reg.hal(slot);
        assert_eq!(hal.remaining(Direction::Tx), 0);
        assert_eq!(hal.remaining(Direction::Rx), 0);
        // Busy state and transfer sizes are untouched
        assert!(hal.busy_state().is_busy(Direction::Tx));
        assert_eq!(hal.transfer_size(Direction::Rx), 8);
    }

    #[test]
    fn test_send_break() {
        let (mut reg, slot, _) = setup();
        reg.send_break(slot);
        reg.send_break(slot);
        assert_eq!(reg.hal(slot).breaks(), 2);
    }

    #[test]
    fn test_embedded_io_write_and_flush() {
        let mut uart = SimUart::new();
        let mut io = ByteIo::new(&mut uart);
        io.write_all(b"hello").unwrap();
        io.flush().unwrap();
        assert_eq!(uart.transmitted(), b"hello");
    }

    #[test]
    fn test_embedded_io_read_takes_available_byte() {
        let mut uart = SimUart::new();
        uart.inject_rx(b'x');
        let mut io = ByteIo::new(&mut uart);
        let mut buf = [0u8; 4];

        assert_eq!(io.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], b'x');
        assert!(!io.read_ready().unwrap());
        assert_eq!(io.read(&mut []).unwrap(), 0);
    }
}
