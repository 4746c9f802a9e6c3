pub mod tracker;

pub use tracker::{MigrationEvent, ResumePoint, StateTracker};
