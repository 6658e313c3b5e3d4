/// Coach-facing ledger administration endpoints
pub mod admin;
/// Subscriber-facing resource access endpoints
pub mod resources;
/// Login endpoint
pub mod sessions;
/// Public subscription request intake
pub mod subscriptions;
