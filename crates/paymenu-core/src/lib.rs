//! Core domain + application logic for the payment menu bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the Crypto Pay
//! gateway live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod i18n;
pub mod images;
pub mod keyboards;
pub mod logging;
pub mod messaging;
pub mod payments;
pub mod render;

pub use errors::{Error, Result};

#[cfg(test)]
mod testing;
