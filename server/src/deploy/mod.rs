//! Repository deployment

pub mod cmd;
pub mod compose;
pub mod deployer;
pub mod docker;
pub mod fsm;
pub mod generated;
pub mod git;
pub mod service;
