//! Scraper/ingestion service: async competitor-price fetcher plus the HTTP
//! surface that triggers it and publishes `RawPrice` events downstream.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod producer;
