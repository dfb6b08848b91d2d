//! Flux constraint management and result interpretation for flux balance models.
//!
//! A [`Fba`] is built from a declarative stoichiometric specification or a COBRA JSON model,
//! has its flux bounds rewritten in response to regulation and environment, is optimized by a
//! pluggable solver backend, and reports fluxes, added mass and minimal media.

pub mod configuration;
pub mod fba;
pub mod io;
pub mod metabolic_model;
pub mod optimize;
pub mod units;
mod utils;

pub use fba::{Fba, FbaError};
