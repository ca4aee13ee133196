//! HTTP API

pub mod handlers;
pub mod serve;
