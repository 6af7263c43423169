//! Interrupt demultiplexer
//!
//! The low-level notification path for byte-stream consumers: one entry
//! point per peripheral turns raised hardware flags into [`IrqEvent`] tags
//! delivered to the consumer registered for that slot. The asynchronous
//! transfer engine does not go through here; it installs its own handler.
//!
//! ```ignore
//! extern "C" fn usart2_irq() {
//!     with_registry(&SERIAL, |reg| reg.dispatch_irq(PeripheralId::Usart2));
//! }
//! ```

use uartline_hal::{Flag, Interrupt, InterruptController, UartHal, Vector};

use crate::event::IrqEvent;
use crate::peripheral::PeripheralId;
use crate::registry::{Registry, SlotIndex};
use crate::sync_io::ByteIo;

/// Receiver of demultiplexed interrupts for one slot
///
/// Runs in interrupt context and must not block beyond a single byte
/// transfer on the given [`ByteIo`].
pub trait IrqConsumer<H: UartHal>: Sync {
    fn on_irq(&self, event: IrqEvent, io: &mut ByteIo<'_, H>);
}

fn source(event: IrqEvent) -> Interrupt {
    match event {
        IrqEvent::Rx => Interrupt::Rxne,
        IrqEvent::Tx => Interrupt::Txe,
    }
}

impl<H: UartHal + 'static, const N: usize> Registry<H, N> {
    /// Interrupt entry point of a peripheral
    ///
    /// Unknown peripherals and slots without a consumer are ignored; their
    /// flags stay raised.
    pub fn dispatch_irq(&mut self, id: PeripheralId) {
        let Some(slot) = self.resolve(id) else {
            return;
        };
        let s = self.slot_mut(slot);
        let Some(consumer) = s.consumer else {
            return;
        };

        if s.hal.flag(Flag::Txe)
            && s.hal.interrupt_pending(Interrupt::Txe)
            && s.hal.interrupt_enabled(Interrupt::Txe)
        {
            consumer.on_irq(IrqEvent::Tx, &mut ByteIo::new(&mut s.hal));
        }

        // Reading the data register in the consumer drops RXNE
        if s.hal.flag(Flag::Rxne)
            && s.hal.interrupt_pending(Interrupt::Rxne)
            && s.hal.interrupt_enabled(Interrupt::Rxne)
        {
            consumer.on_irq(IrqEvent::Rx, &mut ByteIo::new(&mut s.hal));
        }

        if s.hal.flag(Flag::Ore) && s.hal.interrupt_pending(Interrupt::Ore) {
            s.hal.clear_flag(Flag::Ore);
        }
    }

    /// Enable a byte-stream interrupt source and route the line to `vector`
    pub fn enable_irq<C: InterruptController>(
        &mut self,
        slot: SlotIndex,
        event: IrqEvent,
        nvic: &mut C,
        vector: Vector,
    ) {
        let s = self.slot_mut(slot);
        let irq = s.id.irq();
        s.hal.enable_interrupt(source(event));
        nvic.set_vector(irq, vector);
        nvic.enable(irq);
    }

    /// Disable a byte-stream interrupt source
    ///
    /// The line itself is only disabled once both sources are off. The line
    /// shared by USART4 and USART5 is disabled without regard to the other
    /// instance.
    pub fn disable_irq<C: InterruptController>(&mut self, slot: SlotIndex, event: IrqEvent, nvic: &mut C) {
        let s = self.slot_mut(slot);
        let other = match event {
            IrqEvent::Rx => IrqEvent::Tx,
            IrqEvent::Tx => IrqEvent::Rx,
        };

        s.hal.disable_interrupt(source(event));
        if !s.hal.interrupt_enabled(source(other)) {
            nvic.disable(s.id.irq());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{rx_vector, setup};
    use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
    use uartline_hal_sim::SimUart;

    /// Echoes received bytes and counts deliveries
    struct Echo {
        rx: AtomicUsize,
        tx: AtomicUsize,
        last: AtomicU8,
    }

    impl Echo {
        const fn new() -> Self {
            Self {
                rx: AtomicUsize::new(0),
                tx: AtomicUsize::new(0),
                last: AtomicU8::new(0),
            }
        }
    }

    impl IrqConsumer<SimUart> for Echo {
        fn on_irq(&self, event: IrqEvent, io: &mut ByteIo<'_, SimUart>) {
            match event {
                IrqEvent::Rx => {
                    let byte = io.read_byte();
                    self.last.store(byte, Ordering::Relaxed);
                    self.rx.fetch_add(1, Ordering::Relaxed);
                }
                IrqEvent::Tx => {
                    self.tx.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    #[test]
    fn test_dispatch_rx_to_consumer() {
        static ECHO: Echo = Echo::new();
        let (mut reg, slot, mut nvic) = setup();
        reg.register_consumer(slot, &ECHO);
        reg.enable_irq(slot, IrqEvent::Rx, &mut nvic, rx_vector);

        reg.hal_mut(slot).inject_rx(b'q');
        reg.dispatch_irq(PeripheralId::Usart2);

        assert_eq!(ECHO.rx.load(Ordering::Relaxed), 1);
        assert_eq!(ECHO.tx.load(Ordering::Relaxed), 0);
        assert_eq!(ECHO.last.load(Ordering::Relaxed), b'q');
        assert!(!reg.readable(slot));
    }

    #[test]
    fn test_dispatch_tx_requires_enabled_source() {
        static ECHO: Echo = Echo::new();
        let (mut reg, slot, mut nvic) = setup();
        reg.register_consumer(slot, &ECHO);

        // TXE is raised out of reset but its source is off
        reg.dispatch_irq(PeripheralId::Usart2);
        assert_eq!(ECHO.tx.load(Ordering::Relaxed), 0);

        reg.enable_irq(slot, IrqEvent::Tx, &mut nvic, rx_vector);
        reg.dispatch_irq(PeripheralId::Usart2);
        assert_eq!(ECHO.tx.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_dispatch_without_consumer_leaves_flags() {
        let (mut reg, slot, mut nvic) = setup();
        reg.enable_irq(slot, IrqEvent::Rx, &mut nvic, rx_vector);
        reg.hal_mut(slot).inject_rx(1);

        reg.dispatch_irq(PeripheralId::Usart2);
        // Unknown peripheral is ignored as well
        reg.dispatch_irq(PeripheralId::Usart1);

        assert!(reg.readable(slot));
    }

    #[test]
    fn test_dispatch_clears_overrun() {
        static ECHO: Echo = Echo::new();
        let (mut reg, slot, _) = setup();
        reg.register_consumer(slot, &ECHO);
        reg.hal_mut(slot).raise(Flag::Ore);

        reg.dispatch_irq(PeripheralId::Usart2);

        assert!(!reg.hal(slot).flag(Flag::Ore));
        assert_eq!(ECHO.rx.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_enable_installs_vector() {
        let (mut reg, slot, mut nvic) = setup();
        let irq = PeripheralId::Usart2.irq();

        reg.enable_irq(slot, IrqEvent::Rx, &mut nvic, rx_vector);

        assert!(nvic.line(irq).enabled);
        assert!(nvic.vector_is(irq, rx_vector));
        assert!(reg.hal(slot).interrupt_enabled(Interrupt::Rxne));
    }

    #[test]
    fn test_disable_keeps_line_while_other_source_on() {
        let (mut reg, slot, mut nvic) = setup();
        let irq = PeripheralId::Usart2.irq();
        reg.enable_irq(slot, IrqEvent::Rx, &mut nvic, rx_vector);
        reg.enable_irq(slot, IrqEvent::Tx, &mut nvic, rx_vector);

        reg.disable_irq(slot, IrqEvent::Rx, &mut nvic);
        assert!(nvic.line(irq).enabled);
        assert!(!reg.hal(slot).interrupt_enabled(Interrupt::Rxne));

        reg.disable_irq(slot, IrqEvent::Tx, &mut nvic);
        assert!(!nvic.line(irq).enabled);
    }
}
