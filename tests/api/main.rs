mod health_check;
mod helpers;
mod resources;
mod subscriptions;
