pub mod plan_store;

pub use plan_store::{PlanId, PlanStore, StorageError};
