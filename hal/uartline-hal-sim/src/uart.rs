//! USART register and vendor-handle model
//!
//! Flag and enable bits follow the STM32L0 USART: transmit-empty and
//! transmission-complete are raised out of reset, reading the data register
//! drops receive-not-empty, and a byte arriving while receive-not-empty is
//! still raised is lost with an overrun.
//!
//! [`UartHal::service_irq`] mirrors the vendor IRQ handler: error flags are
//! acknowledged, one byte is stored per receive interrupt, transmission
//! complete is handled before transmit-empty, and the last transmit-empty
//! interrupt hands over to transmission-complete. A finished receive resets
//! the transfer size to zero.

use heapless::Vec;
use uartline_hal::{
    BusyState, Direction, Flag, FlowControl, HalError, Interrupt, UartConfig, UartHal,
};

/// Capacity of the transmitted-byte log
pub const TX_LOG_SIZE: usize = 256;

const ISR_PE: u16 = 1 << 0;
const ISR_FE: u16 = 1 << 1;
const ISR_NE: u16 = 1 << 2;
const ISR_ORE: u16 = 1 << 3;
const ISR_RXNE: u16 = 1 << 5;
const ISR_TC: u16 = 1 << 6;
const ISR_TXE: u16 = 1 << 7;

const CR_PEIE: u8 = 1 << 0;
const CR_TXEIE: u8 = 1 << 1;
const CR_TCIE: u8 = 1 << 2;
const CR_RXNEIE: u8 = 1 << 3;
const CR_EIE: u8 = 1 << 4;

fn isr_bit(flag: Flag) -> u16 {
    match flag {
        Flag::Txe => ISR_TXE,
        Flag::Tc => ISR_TC,
        Flag::Rxne => ISR_RXNE,
        Flag::Pe => ISR_PE,
        Flag::Fe => ISR_FE,
        Flag::Ne => ISR_NE,
        Flag::Ore => ISR_ORE,
    }
}

fn cr_bit(it: Interrupt) -> u8 {
    match it {
        Interrupt::Txe => CR_TXEIE,
        Interrupt::Tc => CR_TCIE,
        Interrupt::Rxne => CR_RXNEIE,
        Interrupt::Pe => CR_PEIE,
        Interrupt::Err | Interrupt::Fe | Interrupt::Ne | Interrupt::Ore => CR_EIE,
    }
}

/// Simulated USART instance
#[derive(Debug, Clone)]
pub struct SimUart {
    isr: u16,
    cr: u8,
    rdr: u16,
    tx_log: Vec<u8, TX_LOG_SIZE>,
    busy: BusyState,
    tx_size: usize,
    tx_remaining: usize,
    rx_size: usize,
    rx_remaining: usize,
    config: Option<(UartConfig, FlowControl)>,
    breaks: u32,
    fail_next_start: bool,
}

impl Default for SimUart {
    fn default() -> Self {
        Self::new()
    }
}

impl SimUart {
    /// Create a peripheral in its reset state
    pub fn new() -> Self {
        Self {
            isr: ISR_TXE | ISR_TC,
            cr: 0,
            rdr: 0,
            tx_log: Vec::new(),
            busy: BusyState::empty(),
            tx_size: 0,
            tx_remaining: 0,
            rx_size: 0,
            rx_remaining: 0,
            config: None,
            breaks: 0,
            fail_next_start: false,
        }
    }

    /// A byte arrives on the RX line
    ///
    /// If the previous byte was not read yet it stays in the data register
    /// and an overrun is flagged.
    pub fn inject_rx(&mut self, byte: u8) {
        if self.isr & ISR_RXNE != 0 {
            self.isr |= ISR_ORE;
            return;
        }
        self.rdr = byte as u16;
        self.isr |= ISR_RXNE;
    }

    /// Raise a line error flag (parity, framing, noise, overrun)
    pub fn raise(&mut self, flag: Flag) {
        self.isr |= isr_bit(flag);
    }

    /// Make the next transfer start report failure
    pub fn fail_next_start(&mut self) {
        self.fail_next_start = true;
    }

    /// Bytes written to the transmit data register so far
    pub fn transmitted(&self) -> &[u8] {
        &self.tx_log
    }

    /// Number of break requests
    pub fn breaks(&self) -> u32 {
        self.breaks
    }

    /// Last applied configuration
    pub fn config(&self) -> Option<(UartConfig, FlowControl)> {
        self.config
    }

    fn take_start_failure(&mut self) -> bool {
        core::mem::replace(&mut self.fail_next_start, false)
    }

    fn end_receive(&mut self) {
        self.cr &= !(CR_RXNEIE | CR_PEIE | CR_EIE);
        self.busy = self.busy.release(Direction::Rx);
        self.rx_size = 0;
    }

    fn end_transmit(&mut self) {
        self.cr &= !CR_TCIE;
        self.busy = self.busy.release(Direction::Tx);
        // Completion callback acknowledges TC
        self.isr &= !ISR_TC;
    }
}

impl UartHal for SimUart {
    fn flag(&self, flag: Flag) -> bool {
        self.isr & isr_bit(flag) != 0
    }

    fn clear_flag(&mut self, flag: Flag) {
        // TXE only drops by writing the data register
        if flag != Flag::Txe {
            self.isr &= !isr_bit(flag);
        }
    }

    fn interrupt_pending(&self, it: Interrupt) -> bool {
        let mask = match it {
            Interrupt::Txe => ISR_TXE,
            Interrupt::Tc => ISR_TC,
            Interrupt::Rxne => ISR_RXNE,
            Interrupt::Pe => ISR_PE,
            Interrupt::Err => ISR_FE | ISR_NE | ISR_ORE,
            Interrupt::Fe => ISR_FE,
            Interrupt::Ne => ISR_NE,
            Interrupt::Ore => ISR_ORE,
        };
        self.isr & mask != 0
    }

    fn interrupt_enabled(&self, it: Interrupt) -> bool {
        self.cr & cr_bit(it) != 0
    }

    fn enable_interrupt(&mut self, it: Interrupt) {
        self.cr |= cr_bit(it);
    }

    fn disable_interrupt(&mut self, it: Interrupt) {
        self.cr &= !cr_bit(it);
    }

    fn read_data(&mut self) -> u16 {
        self.isr &= !ISR_RXNE;
        self.rdr
    }

    fn write_data(&mut self, value: u16) {
        // Instant shift-out: the byte is on the wire and the line is idle again
        let _ = self.tx_log.push(value as u8);
        self.isr |= ISR_TXE | ISR_TC;
    }

    fn request_break(&mut self) {
        self.breaks += 1;
    }

    fn configure(&mut self, config: &UartConfig, flow: FlowControl) {
        self.config = Some((*config, flow));
    }

    fn start_transmit_it(&mut self, len: usize) -> Result<(), HalError> {
        if self.take_start_failure() || len == 0 {
            return Err(HalError::Error);
        }
        if self.busy.is_busy(Direction::Tx) {
            return Err(HalError::Busy);
        }
        self.tx_size = len;
        self.tx_remaining = len;
        self.busy |= BusyState::TX;
        self.cr |= CR_TXEIE;
        Ok(())
    }

    fn start_receive_it(&mut self, len: usize) -> Result<(), HalError> {
        if self.take_start_failure() || len == 0 {
            return Err(HalError::Error);
        }
        if self.busy.is_busy(Direction::Rx) {
            return Err(HalError::Busy);
        }
        self.rx_size = len;
        self.rx_remaining = len;
        self.busy |= BusyState::RX;
        self.cr |= CR_PEIE | CR_EIE | CR_RXNEIE;
        Ok(())
    }

    fn busy_state(&self) -> BusyState {
        self.busy
    }

    fn set_busy_state(&mut self, state: BusyState) {
        self.busy = state;
    }

    fn remaining(&self, dir: Direction) -> usize {
        match dir {
            Direction::Tx => self.tx_remaining,
            Direction::Rx => self.rx_remaining,
        }
    }

    fn set_remaining(&mut self, dir: Direction, count: usize) {
        match dir {
            Direction::Tx => self.tx_remaining = count,
            Direction::Rx => self.rx_remaining = count,
        }
    }

    fn transfer_size(&self, dir: Direction) -> usize {
        match dir {
            Direction::Tx => self.tx_size,
            Direction::Rx => self.rx_size,
        }
    }

    fn service_irq(&mut self, tx: &[u8], rx: &mut [u8]) {
        // Acknowledge line errors the caller left behind
        if self.cr & CR_PEIE != 0 {
            self.isr &= !ISR_PE;
        }
        if self.cr & CR_EIE != 0 {
            self.isr &= !(ISR_FE | ISR_NE | ISR_ORE);
        }

        if self.isr & ISR_RXNE != 0 && self.cr & CR_RXNEIE != 0 {
            let byte = self.read_data() as u8;
            if self.rx_remaining > 0 {
                let index = self.rx_size - self.rx_remaining;
                if let Some(slot) = rx.get_mut(index) {
                    *slot = byte;
                }
                self.rx_remaining -= 1;
                if self.rx_remaining == 0 {
                    self.end_receive();
                }
            }
        }

        if self.isr & ISR_TC != 0 && self.cr & CR_TCIE != 0 {
            self.end_transmit();
        }

        if self.isr & ISR_TXE != 0 && self.cr & CR_TXEIE != 0 {
            if self.tx_remaining == 0 {
                self.cr &= !CR_TXEIE;
                self.cr |= CR_TCIE;
            } else {
                let index = self.tx_size - self.tx_remaining;
                let byte = tx.get(index).copied().unwrap_or(0);
                self.write_data(byte as u16);
                self.tx_remaining -= 1;
            }
        }
    }
}
