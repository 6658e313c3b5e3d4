/// Access-control policy: quotas, the subscription gate, and the login throttle
pub mod access;
/// Basic application code
pub mod app;
/// Application authorization
pub mod auth;
/// Controllers for REST endpoints
pub mod controller;
/// Cryptography-related objects
pub mod crypto;
/// Domain objects
pub mod domain;
/// Error enums
pub mod error;
/// Repositories
pub mod repo;
/// Application settings
pub mod settings;
/// Application telemetry for tracing and logging
pub mod telemetry;
