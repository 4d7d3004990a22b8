//! Certkeeper Library
//!
//! A resilient orchestration service for TLS certificate lifecycles.
//! Certkeeper periodically re-reads a CSV of domains and drives the
//! external `certbot` tool once per domain, via DNS-challenge plugins,
//! without ever letting one failure take down the batch or the process.
//!
//! This library provides the core components:
//!
//! - **Job Source**: CSV-backed, lazily-read job descriptors
//! - **Credential Resolution**: provider key to plugin and secrets path
//! - **Issuance Invocation**: subprocess execution and outcome classification
//! - **Cycle Scheduling**: the infinite, failure-containing polling loop
//! - **Lifecycle**: signal-driven graceful shutdown

// ============================================================================
// Module Declarations
// ============================================================================

pub mod config;
pub mod jobs;
pub mod shutdown;

// ============================================================================
// Public API Re-exports
// ============================================================================

// Configuration
pub use config::Config;

// Issuance pipeline
pub use jobs::{
    CredentialReference, CredentialResolver, CycleScheduler, CycleStats, DnsPlugin,
    InvocationOutcome, IssuanceInvoker, JobDescriptor, JobSource,
};
