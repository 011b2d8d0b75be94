//! Core domain model for coda.
//!
//! This crate defines the canonical play-event model, the per-provider
//! normalizers, artist identity resolution, anomaly screening,
//! consolidation, and the statistical rollups computed over the
//! consolidated listening log.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod anomaly;
pub mod consolidate;
pub mod error;
pub mod model;
pub mod normalize;
pub mod resolve;
pub mod stats;
pub mod vocab;

pub use error::{Error, Result};
