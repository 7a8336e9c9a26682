//! HTTP adapters

pub mod client;

pub use client::{HttpClient, HttpClientBuilder, HttpFetcher};
