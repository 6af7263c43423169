//! Simulated serial peripheral for the uartline HAL
//!
//! This crate provides host-side implementations of the `uartline-hal`
//! traits so the registry and transfer engine can be exercised without a
//! board:
//!
//! - [`SimUart`] - STM32L0 USART status/enable bits plus the vendor
//!   interrupt-driven transfer routines
//! - [`SimNvic`] - interrupt line state (enable, pending, priority, vector)
//!
//! The model transmits instantly: a data register write lands in
//! [`SimUart::transmitted`] and leaves both transmit-empty and
//! transmission-complete raised. Reception is driven by the test through
//! [`SimUart::inject_rx`].

#![no_std]
#![deny(unsafe_code)]

pub mod nvic;
pub mod uart;

pub use nvic::{LineState, SimNvic};
pub use uart::SimUart;
