//! chainpulse: market-data polling and chat alert pipeline
//!
//! This library provides the core components for:
//! - Provider clients over loosely-shaped market data APIs
//! - Response normalization with shape hints and field synonyms
//! - Threshold classification via ordered rule chains
//! - File-backed delivery deduplication
//! - Deterministic message rendering
//! - Chat delivery to per-feature topics

pub mod classify;
pub mod cli;
pub mod config;
pub mod deliver;
pub mod features;
pub mod normalize;
pub mod provider;
pub mod render;
pub mod store;
pub mod telemetry;
pub mod testing;
