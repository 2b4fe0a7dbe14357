//! Relays tickets from an OTIMCON card-reader station to a serial thermal
//! printer, keeping a copy of each ticket on disk.
//!
//! The station is first switched into PRINT mode (see [`handshake`]), after
//! which [`relay::Session`] forwards every line the station prints, treating
//! a read timeout as the end of a ticket.

pub mod cli;
pub mod config;
pub mod error;
pub mod handshake;
pub mod relay;
pub mod transport;

pub use error::{Error, Result};
