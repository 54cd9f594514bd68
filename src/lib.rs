//! Fund Forecaster Library
//!
//! Turns an investor profile into candidate mutual-fund portfolios with a
//! generative model, grounded in a fixed fund catalog, and serves the result
//! over HTTP together with fund lookup and portfolio import/export.
//!
//! # Modules
//!
//! - `api`: Route table and middleware stack.
//! - `core`: Domain-layer namespace (catalog, profile, generation, models, errors).
//! - `integrations`: External service namespace (generative model client, circuit breaker).
//! - `catalog`: Fund catalog loading, slugs, and lookup.
//! - `circuit_breaker`: Circuit breaker for model calls.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `genai_client`: Generative model capability and its Gemini client.
//! - `generation`: Portfolio generation pipeline and catalog fidelity pass.
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models.
//! - `profile`: Investor profile validation.
//! - `prompt`: Instruction template and output schema.
//! - `session`: Per-session display state.
//! - `transfer`: Portfolio export and import.

pub mod api;
pub mod core;
pub mod integrations;

// Re-export primary modules for shared use in tests and other binaries
pub mod catalog;
pub mod circuit_breaker;
pub mod config;
pub mod errors;
pub mod genai_client;
pub mod generation;
pub mod handlers;
pub mod models;
pub mod profile;
pub mod prompt;
pub mod session;
pub mod transfer;
