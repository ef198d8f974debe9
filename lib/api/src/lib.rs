//! # PhenoRank API
//!
//! Boundary operations ([`PhenotypeService`]) and the actix-web REST
//! adapter ([`RestApi`]) that exposes them.

pub mod config;
pub mod service;
pub mod rest;

pub use config::ServiceConfig;
pub use service::{DetectOutcome, PhenotypeService, RankOutcome, TermMatch};
pub use rest::{routes, RestApi};
