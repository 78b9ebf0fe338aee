#![cfg_attr(not(test), no_std)]

//! # gsm-modem
//!
//! Blocking AT command client for GSM, GPRS and WiFi modems attached over a
//! byte stream, with decoding of the hex encoded text these modems report
//! for SMS and USSD payloads.
//!
//! The transport is anything implementing the `embedded-io` [`Read`],
//! [`ReadReady`] and [`Write`] traits; time is taken from `embassy-time` and
//! cooperative yields go through an `embedded-hal` [`DelayNs`] provider.
//!
//! [`Read`]: embedded_io::Read
//! [`ReadReady`]: embedded_io::ReadReady
//! [`Write`]: embedded_io::Write
//! [`DelayNs`]: embedded_hal::delay::DelayNs

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod baud;
pub mod client;
pub mod config;
pub mod error;
pub mod hex;
pub mod ip;
pub mod matcher;
pub mod modem;
pub mod modules;
pub mod text;

#[cfg(test)]
mod test_helpers;

pub use client::AtClient;
pub use config::Config;
pub use error::Error;
pub use matcher::{Match, Patterns};
pub use modem::{GenericModem, Modem};
pub use modules::Module;

// Re-export the time and address types that appear in the public API
pub use embassy_time::Duration;
pub use no_std_net::Ipv4Addr;

/// Prelude - Include traits
pub mod prelude {
    pub use crate::baud::SetBaudRate;
    pub use crate::client::Transport;
    pub use crate::modem::Modem;
    pub use crate::modules::ModuleParams;
}
