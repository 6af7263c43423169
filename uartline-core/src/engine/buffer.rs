//! Transfer descriptors

/// Lifecycle of one transfer direction
///
/// `Armed` and `Aborting` only exist inside a start or abort call; between
/// calls a direction is always `Idle` or `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferState {
    /// No transfer outstanding
    Idle,
    /// Descriptor filled, hardware not started yet
    Armed,
    /// Hardware is moving bytes
    InProgress,
    /// Interrupt sources and counters are being torn down
    Aborting,
}

/// Transmit descriptor
#[derive(Debug, Default)]
pub(crate) struct TxBuffer {
    pub(crate) buf: Option<&'static [u8]>,
    pub(crate) length: usize,
    pub(crate) pos: usize,
}

impl TxBuffer {
    pub(crate) const fn new() -> Self {
        Self {
            buf: None,
            length: 0,
            pos: 0,
        }
    }

    /// Load a new buffer, returning the one it replaces
    pub(crate) fn arm(&mut self, buf: &'static [u8]) -> Option<&'static [u8]> {
        self.length = buf.len();
        self.pos = 0;
        self.buf.replace(buf)
    }

    pub(crate) fn data(&self) -> &[u8] {
        self.buf.unwrap_or(&[])
    }

    pub(crate) fn take(&mut self) -> Option<&'static [u8]> {
        self.length = 0;
        self.pos = 0;
        self.buf.take()
    }
}

/// Receive descriptor
///
/// `received` counts the bytes the hardware stored. `length` and `pos` are
/// cut back to the match index when a character match ends the transfer.
#[derive(Debug, Default)]
pub(crate) struct RxBuffer {
    pub(crate) buf: Option<&'static mut [u8]>,
    pub(crate) length: usize,
    pub(crate) pos: usize,
    pub(crate) received: usize,
}

impl RxBuffer {
    pub(crate) const fn new() -> Self {
        Self {
            buf: None,
            length: 0,
            pos: 0,
            received: 0,
        }
    }

    /// Load a new buffer, returning the one it replaces
    pub(crate) fn arm(&mut self, buf: &'static mut [u8]) -> Option<&'static mut [u8]> {
        self.length = buf.len();
        self.pos = 0;
        self.received = 0;
        self.buf.replace(buf)
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        match self.buf.as_deref_mut() {
            Some(buf) => buf,
            None => &mut [],
        }
    }

    /// Index of the first `byte` among the stored bytes
    pub(crate) fn find(&self, byte: u8) -> Option<usize> {
        let buf = self.buf.as_deref()?;
        let filled = self.received.min(buf.len());
        buf[..filled].iter().position(|&b| b == byte)
    }

    /// End the transfer at `index`
    pub(crate) fn truncate(&mut self, index: usize) {
        self.length = index;
        self.pos = index;
        self.received = index;
    }

    pub(crate) fn take(&mut self) -> Option<(&'static mut [u8], usize)> {
        let received = self.received;
        self.length = 0;
        self.pos = 0;
        self.received = 0;
        self.buf.take().map(|buf| (buf, received))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::rx_buffer;

    #[test]
    fn test_find_only_looks_at_stored_bytes() {
        let mut rx = RxBuffer::new();
        let buf = rx_buffer(4);
        buf.copy_from_slice(b"ab\nc");
        rx.arm(buf);

        rx.received = 2;
        assert_eq!(rx.find(b'\n'), None);

        rx.received = 3;
        assert_eq!(rx.find(b'\n'), Some(2));
    }

    #[test]
    fn test_arm_returns_replaced_buffer() {
        let mut rx = RxBuffer::new();
        assert!(rx.arm(rx_buffer(3)).is_none());
        let old = rx.arm(rx_buffer(5)).unwrap();
        assert_eq!(old.len(), 3);
        assert_eq!(rx.length, 5);

        let mut tx = TxBuffer::new();
        assert!(tx.arm(b"ab").is_none());
        assert_eq!(tx.arm(b"xyz"), Some(&b"ab"[..]));
        assert_eq!(tx.length, 3);
    }

    #[test]
    fn test_truncate_and_take() {
        let mut rx = RxBuffer::new();
        rx.arm(rx_buffer(8));
        rx.received = 5;
        rx.truncate(3);

        let (buf, len) = rx.take().unwrap();
        assert_eq!(buf.len(), 8);
        assert_eq!(len, 3);
        assert!(rx.take().is_none());
    }
}
