//! Parlance - Chat conversation service.
//!
//! Maintains conversations of ordered messages and guarantees that every
//! mutation is reflected both in persisted state and in a stream of domain
//! events delivered to external consumers over a message broker.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
