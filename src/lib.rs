//! Production counter supervisory core.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. Hexagonal layout: `fsm` and `session` are the core,
//! `ports` the trait boundary, `adapters` the outer ring.

#![deny(unused_must_use)]

pub mod adapters;
pub mod config;
pub mod error;
pub mod events;
pub mod fsm;
pub mod ports;
pub mod session;
pub mod supervisor;
