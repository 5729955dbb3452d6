//! Test fixtures for Tessera integration tests
//!
//! This crate provides scripted endpoints and a fixture connection-error
//! type so that test suites can stage any combination of responses,
//! refusals, and fatal failures without touching the network.

pub mod endpoints;

pub use endpoints::{into_endpoints, CallScript, ConnectionError, ScriptedEndpoint};
