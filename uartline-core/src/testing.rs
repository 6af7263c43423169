//! Shared fixtures for unit tests

use std::boxed::Box;
use std::vec;

use uartline_hal::{UartConfig, UartHal};
use uartline_hal_sim::{SimNvic, SimUart};

use crate::event::IrqEvent;
use crate::irq::IrqConsumer;
use crate::peripheral::PeripheralId;
use crate::registry::{Registry, SlotIndex};
use crate::sync_io::ByteIo;

/// Consumer that ignores every interrupt
pub struct NullConsumer(pub u8);

impl<H: UartHal> IrqConsumer<H> for NullConsumer {
    fn on_irq(&self, _event: IrqEvent, _io: &mut ByteIo<'_, H>) {}
}

pub extern "C" fn tx_vector() {}
pub extern "C" fn rx_vector() {}

/// Registry with USART2 in slot 0 and a fresh interrupt controller
pub fn setup() -> (Registry<SimUart, 2>, SlotIndex, SimNvic) {
    let mut reg = Registry::new();
    let slot = reg
        .init(PeripheralId::Usart2, SimUart::new(), UartConfig::default())
        .unwrap();
    (reg, slot, SimNvic::new())
}

/// Receive buffer that outlives the test
pub fn rx_buffer(len: usize) -> &'static mut [u8] {
    Box::leak(vec![0u8; len].into_boxed_slice())
}

/// Transmit buffer that outlives the test
pub fn tx_buffer(data: &[u8]) -> &'static [u8] {
    Box::leak(data.to_vec().into_boxed_slice())
}
