//! Request and response models for the XistraCloud REST API

pub mod models;
