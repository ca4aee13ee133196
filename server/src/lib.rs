//! XistraCloud control plane
//!
//! Project, domain and team CRUD over SQLite, plus Git-to-Docker deployments
//! through a compose / Dockerfile / generated-Dockerfile cascade.

pub mod app;
pub mod authn;
pub mod db;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod models;
pub mod server;
pub mod telemetry;
pub mod utils;
pub mod validation;
pub mod verify;
pub mod workers;
