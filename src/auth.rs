mod bearer;
mod coach_guard;
mod subscriber_guard;

pub use bearer::token_from_headers;
pub use coach_guard::Coach;
pub use subscriber_guard::AuthenticatedSubscriber;
