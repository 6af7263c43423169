//! Asynchronous transfer engine
//!
//! Interrupt-driven transmit and receive with caller-selected completion
//! events. The foreground starts a transfer and installs a handler at the
//! peripheral's vector; from then on only that handler, through
//! [`Registry::handle_interrupt`], advances the transfer.
//!
//! Each direction carries an explicit [`TransferState`]:
//!
//! ```text
//!  Idle ──start──▶ Armed ──hw start ok──▶ InProgress ──done──▶ Idle
//!                    │                        │
//!                    └──hw start failed──▶ Idle    abort ──▶ Aborting ──▶ Idle
//! ```
//!
//! Within one interrupt step a receive line error preempts completion and
//! character-match reporting; the step returns as soon as an error bit is
//! collected.

mod buffer;

pub use buffer::TransferState;
pub(crate) use buffer::{RxBuffer, TxBuffer};

use uartline_hal::{Direction, Flag, Interrupt, InterruptController, UartHal, Vector};

use crate::event::Events;
use crate::registry::{Registry, Slot, SlotIndex};

/// Line priority while a transmit handler is installed
pub const TX_IRQ_PRIORITY: u8 = 1;

/// Line priority while a receive handler is installed
pub const RX_IRQ_PRIORITY: u8 = 0;

/// Receive buffer handed back once the receive direction is idle
#[derive(Debug)]
pub struct Received {
    pub buffer: &'static mut [u8],
    /// Bytes stored, or bytes before the match byte for a character match
    pub len: usize,
}

impl Received {
    /// The received bytes
    pub fn data(&self) -> &[u8] {
        &self.buffer[..self.len.min(self.buffer.len())]
    }
}

impl<H: UartHal + 'static> Slot<H> {
    /// Clear and collect receive line errors that may be reported
    fn take_line_errors(&mut self) -> Events {
        let mut errors = Events::empty();

        if self.hal.flag(Flag::Pe) {
            self.hal.clear_flag(Flag::Pe);
            if self.hal.interrupt_enabled(Interrupt::Pe) {
                errors |= Events::RX_PARITY_ERROR;
            }
        }

        if self.hal.flag(Flag::Fe) && self.hal.interrupt_pending(Interrupt::Fe) {
            self.hal.clear_flag(Flag::Fe);
            if self.hal.interrupt_enabled(Interrupt::Err) {
                errors |= Events::RX_FRAMING_ERROR;
            }
        }

        // Noise is acknowledged but never reported
        if self.hal.flag(Flag::Ne) && self.hal.interrupt_pending(Interrupt::Ne) {
            self.hal.clear_flag(Flag::Ne);
        }

        if self.hal.flag(Flag::Ore) && self.hal.interrupt_pending(Interrupt::Ore) {
            self.hal.clear_flag(Flag::Ore);
            if self.hal.interrupt_enabled(Interrupt::Err) {
                errors |= Events::RX_OVERRUN_ERROR;
            }
        }

        errors
    }

    /// Move directions the hardware has released back to idle
    fn sync_states(&mut self) {
        if self.tx_state == TransferState::InProgress && !self.hal.busy_state().is_busy(Direction::Tx) {
            self.tx_state = TransferState::Idle;
        }
        if self.rx_state == TransferState::InProgress && !self.hal.busy_state().is_busy(Direction::Rx) {
            let remaining = self.hal.remaining(Direction::Rx);
            self.rx.received = self.rx.length.saturating_sub(remaining);
            self.rx_state = TransferState::Idle;
        }
    }

    fn abort_tx(&mut self) {
        self.tx_state = TransferState::Aborting;

        self.hal.disable_interrupt(Interrupt::Tc);
        self.hal.disable_interrupt(Interrupt::Txe);
        self.hal.clear_flag(Flag::Tc);

        self.hal.set_remaining(Direction::Tx, 0);
        let busy = self.hal.busy_state();
        self.hal.set_busy_state(busy.release(Direction::Tx));

        self.tx_state = TransferState::Idle;
    }

    fn abort_rx(&mut self) {
        self.rx_state = TransferState::Aborting;

        self.hal.disable_interrupt(Interrupt::Rxne);
        self.hal.disable_interrupt(Interrupt::Pe);
        self.hal.disable_interrupt(Interrupt::Err);
        self.hal.clear_flag(Flag::Pe);
        self.hal.clear_flag(Flag::Fe);
        self.hal.clear_flag(Flag::Ore);
        // Drop RXNE
        let _ = self.hal.read_data();

        self.hal.set_remaining(Direction::Rx, 0);
        let busy = self.hal.busy_state();
        self.hal.set_busy_state(busy.release(Direction::Rx));

        self.rx_state = TransferState::Idle;
    }
}

impl<H: UartHal + 'static, const N: usize> Registry<H, N> {
    /// Start an interrupt-driven transmit of `buf`
    ///
    /// Only events of the transmit family are taken from `events`; they
    /// replace the previously requested transmit events. `vector` is
    /// installed at the peripheral's line with the line disabled meanwhile.
    ///
    /// Returns the number of bytes accepted: `buf.len()`, or 0 if `buf` is
    /// empty, a transmit is already running, or the hardware refused to
    /// start. A rejected call leaves the running transfer untouched. An
    /// accepted call drops a previous buffer that was never taken back.
    pub fn start_transmit<C: InterruptController>(
        &mut self,
        slot: SlotIndex,
        buf: &'static [u8],
        events: Events,
        vector: Vector,
        nvic: &mut C,
    ) -> usize {
        let s = self.slot_mut(slot);
        if buf.is_empty() || s.hal.busy_state().is_busy(Direction::Tx) {
            trace!("serial: {} tx rejected", s.id);
            return 0;
        }

        let len = buf.len();
        if s.tx.arm(buf).is_some() {
            debug!("serial: {} dropped untaken tx buffer", s.id);
        }
        s.tx_state = TransferState::Armed;
        s.events = s.events.replace_family(Events::TX_ALL, events);

        nvic.install(s.id.irq(), TX_IRQ_PRIORITY, vector);

        match s.hal.start_transmit_it(len) {
            Ok(()) => {
                s.tx_state = TransferState::InProgress;
                len
            }
            Err(e) => {
                warn!("serial: {} tx start failed: {}", s.id, e);
                s.tx.take();
                s.tx_state = TransferState::Idle;
                0
            }
        }
    }

    /// Start an interrupt-driven receive into `buf`
    ///
    /// Only events of the receive family are taken from `events`.
    /// `char_match` ends the transfer early when that byte arrives and
    /// [`Events::RX_CHARACTER_MATCH`] is requested; `Some(0xFF)` means no
    /// match, like `None`.
    ///
    /// Returns the number of bytes accepted. A rejected call (empty buffer,
    /// receive already running, hardware refused) hands the buffer back.
    ///
    /// An accepted call replaces the previous receive buffer. If that buffer
    /// was not taken back with [`Registry::take_receive`] it is dropped
    /// together with its received bytes.
    pub fn start_receive<C: InterruptController>(
        &mut self,
        slot: SlotIndex,
        buf: &'static mut [u8],
        events: Events,
        vector: Vector,
        char_match: Option<u8>,
        nvic: &mut C,
    ) -> Result<usize, &'static mut [u8]> {
        let s = self.slot_mut(slot);
        if buf.is_empty() || s.hal.busy_state().is_busy(Direction::Rx) {
            trace!("serial: {} rx rejected", s.id);
            return Err(buf);
        }

        let len = buf.len();
        if s.rx.arm(buf).is_some() {
            warn!("serial: {} dropped untaken rx buffer", s.id);
        }
        s.rx_state = TransferState::Armed;
        s.events = s.events.replace_family(Events::RX_ALL, events);
        s.char_match = char_match.filter(|&c| c != 0xFF);

        nvic.install(s.id.irq(), RX_IRQ_PRIORITY, vector);

        match s.hal.start_receive_it(len) {
            Ok(()) => {
                s.rx_state = TransferState::InProgress;
                Ok(len)
            }
            Err(e) => {
                warn!("serial: {} rx start failed: {}", s.id, e);
                s.rx_state = TransferState::Idle;
                match s.rx.take() {
                    Some((buf, _)) => Err(buf),
                    None => Err(&mut []),
                }
            }
        }
    }

    /// One interrupt step of the installed transfer handler
    ///
    /// Returns the requested events satisfied by this step, empty if there
    /// is nothing to report.
    pub fn handle_interrupt(&mut self, slot: SlotIndex) -> Events {
        let s = self.slot_mut(slot);
        let requested = s.events;
        let tx_live = s.tx_state == TransferState::InProgress;
        let rx_live = s.rx_state == TransferState::InProgress;
        let mut events = Events::empty();

        if s.hal.flag(Flag::Tc) && s.hal.interrupt_enabled(Interrupt::Tc) {
            events |= requested & Events::TX_COMPLETE;
        }

        events |= s.take_line_errors() & requested;

        s.hal.service_irq(s.tx.data(), s.rx.data_mut());

        if tx_live {
            let tx_size = s.hal.transfer_size(Direction::Tx);
            if tx_size != 0 {
                s.tx.pos = tx_size - s.hal.remaining(Direction::Tx).min(tx_size);
            }
        }

        if events.intersects(Events::RX_ERRORS) {
            debug!("serial: {} line error {}", s.id, events);
            s.sync_states();
            return events;
        }

        if rx_live {
            let size = s.hal.transfer_size(Direction::Rx);
            let remaining = s.hal.remaining(Direction::Rx);
            if size != 0 {
                s.rx.pos = size - remaining.min(size);
                s.rx.received = s.rx.pos;
            }
            if remaining == 0 && s.rx.pos >= s.rx.length.saturating_sub(1) {
                s.rx.received = s.rx.length;
                s.rx_state = TransferState::Idle;
                events |= requested & Events::RX_COMPLETE;
            }
        }

        if rx_live && requested.contains(Events::RX_CHARACTER_MATCH) {
            if let Some(index) = s.char_match.and_then(|c| s.rx.find(c)) {
                trace!("serial: {} char match at {}", s.id, index);
                s.rx.truncate(index);
                events.remove(Events::RX_COMPLETE);
                events |= Events::RX_CHARACTER_MATCH;
                s.abort_rx();
            }
        }

        s.sync_states();
        events
    }

    /// Abort the transmit direction
    ///
    /// Always succeeds; aborting an idle direction changes nothing.
    pub fn abort_transmit(&mut self, slot: SlotIndex) {
        self.slot_mut(slot).abort_tx();
    }

    /// Abort the receive direction
    ///
    /// Always succeeds; aborting an idle direction changes nothing. Bytes
    /// already stored stay available through [`Registry::take_receive`].
    pub fn abort_receive(&mut self, slot: SlotIndex) {
        let s = self.slot_mut(slot);
        if s.rx_state == TransferState::InProgress {
            let remaining = s.hal.remaining(Direction::Rx);
            s.rx.received = s.rx.length.saturating_sub(remaining);
        }
        s.abort_rx();
    }

    /// Check whether the hardware reports a transmit in progress
    pub fn tx_active(&self, slot: SlotIndex) -> bool {
        self.slot(slot).hal.busy_state().is_busy(Direction::Tx)
    }

    /// Check whether the hardware reports a receive in progress
    pub fn rx_active(&self, slot: SlotIndex) -> bool {
        self.slot(slot).hal.busy_state().is_busy(Direction::Rx)
    }

    /// State of the transmit direction
    pub fn tx_state(&self, slot: SlotIndex) -> TransferState {
        self.slot(slot).tx_state
    }

    /// State of the receive direction
    pub fn rx_state(&self, slot: SlotIndex) -> TransferState {
        self.slot(slot).rx_state
    }

    /// Bytes of the current transmit handed to the hardware
    pub fn tx_position(&self, slot: SlotIndex) -> usize {
        self.slot(slot).tx.pos
    }

    /// Receive position as tracked by the interrupt handler
    pub fn rx_position(&self, slot: SlotIndex) -> usize {
        self.slot(slot).rx.pos
    }

    /// Events currently requested
    pub fn events(&self, slot: SlotIndex) -> Events {
        self.slot(slot).events
    }

    /// Take back the transmit buffer once the transmit direction is idle
    pub fn take_transmit(&mut self, slot: SlotIndex) -> Option<&'static [u8]> {
        if self.tx_active(slot) {
            return None;
        }
        let s = self.slot_mut(slot);
        s.tx_state = TransferState::Idle;
        s.tx.take()
    }

    /// Take back the receive buffer once the receive direction is idle
    pub fn take_receive(&mut self, slot: SlotIndex) -> Option<Received> {
        if self.rx_active(slot) {
            return None;
        }
        let s = self.slot_mut(slot);
        s.rx_state = TransferState::Idle;
        s.rx.take().map(|(buffer, len)| Received { buffer, len })
    }
}
