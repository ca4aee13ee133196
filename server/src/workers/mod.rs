//! Background workers

pub mod metrics;
