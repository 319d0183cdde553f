//! Retrieval-augmented plan orchestrator
//!
//! Answers a plan query by consulting the knowledge base and the live
//! catalog, judging whether the evidence is fresh enough, and running one
//! fallback retrieval cycle when it is not.
//!
//! CONTROL LOOP:
//! PLAN → ACT → REASON → REFLECT → FALLBACK? → GENERATE

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod execution;
pub mod gemini;
pub mod models;
pub mod normalizer;
pub mod planner;
pub mod synthesis;
pub mod tools;
pub mod verification;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use agent::Orchestrator;
pub use config::Settings;
