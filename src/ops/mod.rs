pub mod confirmation;
pub mod health;

pub use confirmation::{ConfirmationPoller, ConfirmationResult, PollSettings};
pub use health::{HealthCheckWorkflow, HealthReport, Target};
