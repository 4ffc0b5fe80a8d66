//! IronPress - a headless content management backend
//!
//! This library provides the core functionality for the IronPress CMS:
//! the REST API, the persistence layer, and an admin HTTP client.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
