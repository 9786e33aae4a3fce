//! Crypto payment-link flow: callback payload -> invoice -> confirmation menu.

pub mod flow;
pub mod gateway;
pub mod request;
