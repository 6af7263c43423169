//! uartline Hardware Abstraction Layer
//!
//! This crate defines the register-level capability set that the uartline
//! transfer engine consumes. A chip-specific crate implements these traits
//! over the real USART registers and the vendor's interrupt-driven transfer
//! routines; the engine itself never touches a register directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  uartline-core (registry, engine)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  uartline-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ uartline-hal- │       │ uartline-hal- │
//! │   cortex-m    │       │      sim      │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`regs::UartHal`] - USART flags, interrupt sources, data register and
//!   interrupt-driven transfers
//! - [`interrupt::InterruptController`] - interrupt line control and vector
//!   installation

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod interrupt;
pub mod regs;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use gpio::{Pin, Port};
pub use interrupt::{InterruptController, Irq, Vector};
pub use regs::{BusyState, Direction, Flag, HalError, Interrupt, UartHal};
pub use uart::{DataBits, FlowControl, Parity, StopBits, UartConfig};
