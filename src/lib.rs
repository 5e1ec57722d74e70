//! OP25 Bridge - control-plane queues to HTTP.
//!
//! Fans receiver updates out to browsers over Server-Sent Events and relays
//! terminal commands from HTTP POSTs into the receiver's command queue.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
