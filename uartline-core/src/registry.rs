//! Peripheral registry
//!
//! A fixed-capacity table of peripheral slots. Slots are claimed once at
//! start-up, keep their index for the lifetime of the program and are never
//! freed. All mutation of per-peripheral state goes through the methods on
//! [`Registry`] (here and in the `sync_io`, `irq` and `engine` modules).

use heapless::Vec;
use uartline_hal::{FlowControl, UartConfig, UartHal};

use crate::engine::{RxBuffer, TransferState, TxBuffer};
use crate::event::Events;
use crate::irq::IrqConsumer;
use crate::peripheral::PeripheralId;

/// Errors from registry set-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// Every slot is taken
    Full,
    /// The peripheral already owns a slot
    AlreadyInitialized,
}

/// Index of a claimed slot
///
/// Only handed out by [`Registry::init`] and [`Registry::resolve`]. Using an
/// index with a registry other than the one that produced it is a
/// programming error and panics if out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotIndex(u8);

impl SlotIndex {
    /// Position in the table
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Per-peripheral state
pub(crate) struct Slot<H: UartHal + 'static> {
    pub(crate) id: PeripheralId,
    pub(crate) hal: H,
    pub(crate) config: UartConfig,
    pub(crate) flow: FlowControl,
    pub(crate) consumer: Option<&'static dyn IrqConsumer<H>>,
    /// Events requested for the current transfers
    pub(crate) events: Events,
    pub(crate) char_match: Option<u8>,
    pub(crate) tx: TxBuffer,
    pub(crate) rx: RxBuffer,
    pub(crate) tx_state: TransferState,
    pub(crate) rx_state: TransferState,
}

/// Fixed-capacity peripheral table
pub struct Registry<H: UartHal + 'static, const N: usize> {
    slots: Vec<Slot<H>, N>,
}

impl<H: UartHal + 'static, const N: usize> Default for Registry<H, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: UartHal + 'static, const N: usize> Registry<H, N> {
    /// Create an empty registry
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Claim a slot for a peripheral and apply its line configuration
    ///
    /// Must be called before any interrupt of the peripheral is enabled.
    pub fn init(
        &mut self,
        id: PeripheralId,
        mut hal: H,
        config: UartConfig,
    ) -> Result<SlotIndex, RegistryError> {
        if self.resolve(id).is_some() {
            return Err(RegistryError::AlreadyInitialized);
        }
        if self.slots.is_full() {
            return Err(RegistryError::Full);
        }

        let index = self.slots.len();
        hal.configure(&config, FlowControl::None);
        self.slots
            .push(Slot {
                id,
                hal,
                config,
                flow: FlowControl::None,
                consumer: None,
                events: Events::empty(),
                char_match: None,
                tx: TxBuffer::new(),
                rx: RxBuffer::new(),
                tx_state: TransferState::Idle,
                rx_state: TransferState::Idle,
            })
            .map_err(|_| RegistryError::Full)?;

        debug!("serial: {} -> slot {}", id, index);
        Ok(SlotIndex(index as u8))
    }

    /// Find the slot of a peripheral
    pub fn resolve(&self, id: PeripheralId) -> Option<SlotIndex> {
        self.slots
            .iter()
            .position(|slot| slot.id == id)
            .map(|index| SlotIndex(index as u8))
    }

    /// Register the interrupt consumer of a slot
    ///
    /// Replaces any previous consumer.
    pub fn register_consumer(&mut self, slot: SlotIndex, consumer: &'static dyn IrqConsumer<H>) {
        self.slot_mut(slot).consumer = Some(consumer);
    }

    /// Check whether a slot has an interrupt consumer
    pub fn has_consumer(&self, slot: SlotIndex) -> bool {
        self.slot(slot).consumer.is_some()
    }

    /// Peripheral owning a slot
    pub fn peripheral(&self, slot: SlotIndex) -> PeripheralId {
        self.slot(slot).id
    }

    /// Apply a new line configuration
    pub fn configure(&mut self, slot: SlotIndex, config: UartConfig) {
        let s = self.slot_mut(slot);
        s.config = config;
        s.hal.configure(&s.config, s.flow);
    }

    /// Current line configuration
    pub fn config(&self, slot: SlotIndex) -> UartConfig {
        self.slot(slot).config
    }

    /// Select hardware flow control
    ///
    /// # Panics
    ///
    /// If an RTS or CTS pin cannot be routed to the slot's peripheral.
    pub fn set_flow_control(&mut self, slot: SlotIndex, flow: FlowControl) {
        let s = self.slot_mut(slot);
        if let Some(rts) = flow.rts() {
            assert!(s.id.has_rts_pin(rts), "RTS pin not available on this peripheral");
        }
        if let Some(cts) = flow.cts() {
            assert!(s.id.has_cts_pin(cts), "CTS pin not available on this peripheral");
        }

        s.flow = flow;
        s.hal.configure(&s.config, flow);
    }

    /// Current flow control selection
    pub fn flow_control(&self, slot: SlotIndex) -> FlowControl {
        self.slot(slot).flow
    }

    /// Register access of a slot
    pub fn hal(&self, slot: SlotIndex) -> &H {
        &self.slot(slot).hal
    }

    /// Mutable register access of a slot
    pub fn hal_mut(&mut self, slot: SlotIndex) -> &mut H {
        &mut self.slot_mut(slot).hal
    }

    /// Number of claimed slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if no slot has been claimed
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn slot(&self, slot: SlotIndex) -> &Slot<H> {
        &self.slots[slot.index()]
    }

    pub(crate) fn slot_mut(&mut self, slot: SlotIndex) -> &mut Slot<H> {
        &mut self.slots[slot.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::NullConsumer;
    use uartline_hal::{Parity, Pin, Port};
    use uartline_hal_sim::SimUart;

    static FIRST: NullConsumer = NullConsumer(1);
    static SECOND: NullConsumer = NullConsumer(2);

    #[test]
    fn test_init_and_resolve() {
        let mut reg: Registry<SimUart, 2> = Registry::new();
        let a = reg.init(PeripheralId::Usart1, SimUart::new(), UartConfig::default()).unwrap();
        let b = reg.init(PeripheralId::Lpuart1, SimUart::new(), UartConfig::default()).unwrap();

        assert_eq!(reg.resolve(PeripheralId::Usart1), Some(a));
        assert_eq!(reg.resolve(PeripheralId::Lpuart1), Some(b));
        assert_eq!(reg.resolve(PeripheralId::Usart2), None);
        assert_eq!(reg.peripheral(b), PeripheralId::Lpuart1);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_init_rejects_duplicate_and_full() {
        let mut reg: Registry<SimUart, 1> = Registry::new();
        reg.init(PeripheralId::Usart2, SimUart::new(), UartConfig::default()).unwrap();

        assert_eq!(
            reg.init(PeripheralId::Usart2, SimUart::new(), UartConfig::default()),
            Err(RegistryError::AlreadyInitialized)
        );
        assert_eq!(
            reg.init(PeripheralId::Usart1, SimUart::new(), UartConfig::default()),
            Err(RegistryError::Full)
        );
    }

    #[test]
    fn test_init_applies_config() {
        let mut reg: Registry<SimUart, 1> = Registry::new();
        let config = UartConfig::with_baudrate(9600);
        let slot = reg.init(PeripheralId::Usart2, SimUart::new(), config).unwrap();

        assert_eq!(reg.hal(slot).config(), Some((config, FlowControl::None)));
    }

    #[test]
    fn test_register_consumer_last_writer_wins() {
        let mut reg: Registry<SimUart, 1> = Registry::new();
        let slot = reg.init(PeripheralId::Usart2, SimUart::new(), UartConfig::default()).unwrap();
        assert!(!reg.has_consumer(slot));

        reg.register_consumer(slot, &FIRST);
        reg.register_consumer(slot, &SECOND);

        let consumer = reg.slot(slot).consumer.unwrap();
        assert!(core::ptr::addr_eq(consumer, &SECOND));
    }

    #[test]
    fn test_configure_keeps_flow_control() {
        let mut reg: Registry<SimUart, 1> = Registry::new();
        let slot = reg.init(PeripheralId::Usart1, SimUart::new(), UartConfig::default()).unwrap();
        let flow = FlowControl::Rts(Pin::new(Port::A, 12));
        reg.set_flow_control(slot, flow);

        let config = UartConfig {
            parity: Parity::Even,
            ..UartConfig::default()
        };
        reg.configure(slot, config);

        assert_eq!(reg.config(slot), config);
        assert_eq!(reg.flow_control(slot), flow);
        assert_eq!(reg.hal(slot).config(), Some((config, flow)));
    }

    #[test]
    fn test_flow_control_rts_cts() {
        let mut reg: Registry<SimUart, 1> = Registry::new();
        let slot = reg.init(PeripheralId::Usart2, SimUart::new(), UartConfig::default()).unwrap();
        let flow = FlowControl::RtsCts {
            rts: Pin::new(Port::A, 1),
            cts: Pin::new(Port::A, 0),
        };

        reg.set_flow_control(slot, flow);
        assert_eq!(reg.flow_control(slot), flow);

        reg.set_flow_control(slot, FlowControl::None);
        assert_eq!(reg.hal(slot).config().map(|(_, f)| f), Some(FlowControl::None));
    }

    #[test]
    #[should_panic(expected = "CTS pin")]
    fn test_flow_control_rejects_foreign_pin() {
        let mut reg: Registry<SimUart, 1> = Registry::new();
        let slot = reg.init(PeripheralId::Usart2, SimUart::new(), UartConfig::default()).unwrap();
        // PA11 is USART1 CTS
        reg.set_flow_control(slot, FlowControl::Cts(Pin::new(Port::A, 11)));
    }
}
