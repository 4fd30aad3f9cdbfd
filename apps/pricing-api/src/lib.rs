//! Low-latency pricing decision API: tiered cache-then-fallback lookup
//! plus the write-through surface the rules worker uses to populate it.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod service;
