//! Periodic package polling with a sync toggle.

pub mod scheduler;
pub mod update;

pub use scheduler::{drive, PollScheduler, ScheduleTicks, TokioScheduler};
pub use update::{CoordinatorSnapshot, PollResult, SyncState, UpdateCoordinator};
