//! Persisted records and their queries

pub mod backup;
pub mod deployment;
pub mod domain;
pub mod env_var;
pub mod project;
pub mod system_log;
pub mod system_metric;
pub mod team;
pub mod template;
