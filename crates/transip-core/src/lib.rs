//! # transip-core
//!
//! Core types and utilities for talking to the TransIP REST API.
//!
//! This crate provides the error taxonomy, client configuration, and the generic
//! request/response pipeline that the authenticator and the resource repositories
//! are built on.
//!
//! ## Modules
//!
//! - [`error`] - Error types and HTTP status code mapping
//! - [`config`] - Configuration consumed by the authenticator and API client
//! - [`client`] - HTTP client defaults and construction
//! - [`query`] - Query parameter builder
//! - [`rest`] - Request builder and status-table driven response parser

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod rest;

// Re-export commonly used types
pub use config::ClientConfiguration;
pub use error::{Error, Result};
pub use rest::{RestRequest, RestResponse};
