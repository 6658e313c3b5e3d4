mod email_address;
mod phone_number;
mod plan;
mod resource;
mod status;
mod subscriber_name;

pub use email_address::EmailAddress;
pub use phone_number::PhoneNumber;
pub use plan::PlanTier;
pub use resource::{DocumentCategory, ResourceCategory};
pub use status::SubscriptionStatus;
pub use subscriber_name::SubscriberName;
