mod login_attempts;
mod resources;
mod subscribers;
mod usage;

pub use login_attempts::{LoginAttemptRecord, LoginAttemptsRepo};
pub use resources::{
    AssignedDocument, AssignedVideo, AssignmentSet, NewDocument, NewVideo, ResourceRepo,
};
pub use subscribers::{NewSubscriber, Subscriber, SubscriberAuth, SubscriberRepo};
pub use usage::{DailyUsage, UsageRepo};
