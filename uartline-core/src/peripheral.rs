//! Serial peripheral identifiers
//!
//! STM32L0 USART/LPUART instances, their interrupt lines, and the pins that
//! can carry RTS and CTS for each of them.

use uartline_hal::{Irq, Pin, Port};

/// Physical serial peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeripheralId {
    Usart1,
    Usart2,
    Usart4,
    Usart5,
    Lpuart1,
}

impl PeripheralId {
    /// Every instance, in vector-table order of their lines
    pub const ALL: [PeripheralId; 5] = [
        PeripheralId::Usart4,
        PeripheralId::Usart5,
        PeripheralId::Usart1,
        PeripheralId::Usart2,
        PeripheralId::Lpuart1,
    ];

    /// Interrupt line of the instance
    ///
    /// USART4 and USART5 share one line.
    pub fn irq(self) -> Irq {
        match self {
            PeripheralId::Usart4 | PeripheralId::Usart5 => Irq(14),
            PeripheralId::Usart1 => Irq(27),
            PeripheralId::Usart2 => Irq(28),
            PeripheralId::Lpuart1 => Irq(29),
        }
    }

    /// Check whether `pin` can be routed to this instance's RTS
    pub fn has_rts_pin(self, pin: Pin) -> bool {
        RTS_PINS.iter().any(|&(p, id)| p == pin && id == self)
    }

    /// Check whether `pin` can be routed to this instance's CTS
    pub fn has_cts_pin(self, pin: Pin) -> bool {
        CTS_PINS.iter().any(|&(p, id)| p == pin && id == self)
    }
}

// STM32L0x3 alternate-function table
const RTS_PINS: &[(Pin, PeripheralId)] = &[
    (Pin::new(Port::A, 1), PeripheralId::Usart2),
    (Pin::new(Port::A, 12), PeripheralId::Usart1),
    (Pin::new(Port::A, 15), PeripheralId::Usart4),
    (Pin::new(Port::B, 1), PeripheralId::Lpuart1),
    (Pin::new(Port::B, 3), PeripheralId::Usart1),
    (Pin::new(Port::B, 5), PeripheralId::Usart5),
    (Pin::new(Port::B, 12), PeripheralId::Lpuart1),
    (Pin::new(Port::D, 2), PeripheralId::Lpuart1),
    (Pin::new(Port::D, 4), PeripheralId::Usart2),
];

const CTS_PINS: &[(Pin, PeripheralId)] = &[
    (Pin::new(Port::A, 0), PeripheralId::Usart2),
    (Pin::new(Port::A, 6), PeripheralId::Lpuart1),
    (Pin::new(Port::A, 11), PeripheralId::Usart1),
    (Pin::new(Port::B, 4), PeripheralId::Usart1),
    (Pin::new(Port::B, 7), PeripheralId::Usart4),
    (Pin::new(Port::B, 13), PeripheralId::Lpuart1),
    (Pin::new(Port::D, 3), PeripheralId::Usart2),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_line() {
        assert_eq!(PeripheralId::Usart4.irq(), PeripheralId::Usart5.irq());
        assert_ne!(PeripheralId::Usart1.irq(), PeripheralId::Usart2.irq());
    }

    #[test]
    fn test_flow_pins() {
        assert!(PeripheralId::Usart1.has_rts_pin(Pin::new(Port::A, 12)));
        assert!(PeripheralId::Usart1.has_cts_pin(Pin::new(Port::A, 11)));
        // PA12 is USART1 RTS, not USART2
        assert!(!PeripheralId::Usart2.has_rts_pin(Pin::new(Port::A, 12)));
        // RTS pins are not CTS pins
        assert!(!PeripheralId::Usart1.has_cts_pin(Pin::new(Port::A, 12)));
        // USART5 has no CTS
        assert!(PeripheralId::ALL
            .iter()
            .all(|&id| id != PeripheralId::Usart5 || !CTS_PINS.iter().any(|&(_, p)| p == id)));
    }
}
