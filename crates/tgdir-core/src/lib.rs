//! Core of the chat directory bot: the user/chat directory, handle
//! resolution, owner broadcasts and per-chat restrictions.
//!
//! This crate is framework-agnostic. Telegram lives behind the
//! [`messaging::port::MessagingPort`] trait implemented in the adapter crate.

pub mod activity;
pub mod broadcast;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod hooks;
pub mod logging;
pub mod messaging;
pub mod resolver;
pub mod restriction;
pub mod store;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};
