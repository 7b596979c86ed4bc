//! Backend API Module
//!
//! This module handles:
//! - The transport seam (`Transport`) and its reqwest implementation
//! - Typed backend calls (`ConsoleClient`)
//! - Command to endpoint routing

pub mod client;
pub mod routes;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{ConsoleClient, PolicyDocument};
pub use routes::route;
pub use transport::{ApiRequest, HttpTransport, Method, Transport};
