//! Integration tests for riskd-server.
//!
//! A real server on ephemeral loopback ports, driven through `RiskClient`.

pub mod common;
