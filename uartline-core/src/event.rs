//! Logical transfer events
//!
//! Bit positions match the classic asynchronous serial API so masks can be
//! passed through unchanged from higher layers.

use bitflags::bitflags;

bitflags! {
    /// Transfer outcomes a caller can request and be told about
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Events: u32 {
        /// Every byte of the transmit buffer has left the shift register
        const TX_COMPLETE = 1 << 2;
        /// The receive buffer is full
        const RX_COMPLETE = 1 << 8;
        const RX_OVERRUN_ERROR = 1 << 9;
        const RX_FRAMING_ERROR = 1 << 10;
        const RX_PARITY_ERROR = 1 << 11;
        /// The character-match byte was received; the transfer stopped early
        const RX_CHARACTER_MATCH = 1 << 13;

        const TX_ALL = Self::TX_COMPLETE.bits();
        const RX_ERRORS = Self::RX_OVERRUN_ERROR.bits()
            | Self::RX_FRAMING_ERROR.bits()
            | Self::RX_PARITY_ERROR.bits();
        const RX_ALL = Self::RX_COMPLETE.bits()
            | Self::RX_ERRORS.bits()
            | Self::RX_CHARACTER_MATCH.bits();
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Events {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Events({=u32:#x})", self.bits())
    }
}

impl Events {
    /// Keep the bits of `family` from `requested`, everything else from `self`
    pub fn replace_family(self, family: Events, requested: Events) -> Events {
        self.difference(family).union(requested.intersection(family))
    }
}

/// Tag passed to byte-stream consumers by the interrupt demultiplexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqEvent {
    /// A received byte is waiting in the data register
    Rx,
    /// The transmit data register can take another byte
    Tx,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_families_are_disjoint() {
        assert!(!Events::TX_ALL.intersects(Events::RX_ALL));
        assert!(Events::RX_ALL.contains(Events::RX_ERRORS));
    }

    #[test]
    fn test_replace_family_keeps_other_direction() {
        let current = Events::TX_COMPLETE | Events::RX_COMPLETE;
        let next = current.replace_family(Events::RX_ALL, Events::RX_PARITY_ERROR | Events::TX_COMPLETE);
        assert_eq!(next, Events::TX_COMPLETE | Events::RX_PARITY_ERROR);
    }

    #[test]
    fn test_replace_family_clears_when_nothing_requested() {
        let current = Events::TX_COMPLETE | Events::RX_CHARACTER_MATCH;
        let next = current.replace_family(Events::TX_ALL, Events::empty());
        assert_eq!(next, Events::RX_CHARACTER_MATCH);
    }
}
