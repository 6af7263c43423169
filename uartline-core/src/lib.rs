//! Interrupt-driven UART transfer engine
//!
//! This crate contains the board-agnostic serial driver logic that sits on
//! top of the `uartline-hal` register traits:
//!
//! - Peripheral registry (fixed slot table, consumer registration)
//! - Line configuration and flow-control pin checks
//! - Blocking byte I/O (`embedded-io` compatible)
//! - Interrupt demultiplexer for byte-stream consumers
//! - Asynchronous transfer engine (start, interrupt step, abort)
//!
//! # Initialization order
//!
//! Every peripheral must be registered with [`Registry::init`] and, for the
//! byte-stream path, given a consumer before any of its interrupt sources
//! is enabled. The registry provides no locking of its own; share it
//! between foreground and interrupt context through [`SharedRegistry`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

mod fmt;

pub mod engine;
pub mod event;
pub mod irq;
pub mod peripheral;
pub mod registry;
pub mod shared;
pub mod sync_io;

#[cfg(test)]
mod testing;

pub use engine::{Received, TransferState};
pub use event::{Events, IrqEvent};
pub use irq::IrqConsumer;
pub use peripheral::PeripheralId;
pub use registry::{Registry, RegistryError, SlotIndex};
pub use shared::{shared, with_registry, SharedRegistry};
pub use sync_io::ByteIo;
