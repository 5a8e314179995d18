//! HTTP surface of the relay

pub mod cors;
pub mod endpoints;
