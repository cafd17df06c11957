//! # Storage Models (L2: Business Logic)
//!
//! Price dynamics and facility definitions for commodity storage valuation.
//!
//! This crate provides:
//! - Multi-factor mean-reverting forward price models with analytic
//!   integrated variance and covariance
//! - Factor correlation matrices and a positive semi-definite Cholesky
//! - Decision frequencies and period arithmetic
//! - Storage specifications: ratchets, inventory bounds, costs, fuel,
//!   losses, maintenance and terminal conditions
//! - Feasible inventory space computation
//!
//! ## Design Principles
//!
//! - **Validated construction**: builders reject inconsistent facilities
//!   up front, so queries never see a malformed specification
//! - **Analytic moments**: model variances are closed-form, never simulated

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod error;
pub mod models;
pub mod schedules;
pub mod storage;

pub use error::{ModelError, StorageError};
