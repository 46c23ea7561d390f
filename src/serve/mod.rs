// src/serve/mod.rs

//! Development server: static HTTP over the output directory plus a
//! WebSocket live-reload channel.

pub mod http;
pub mod reload;

pub use reload::{reserve_port, LiveReload};
