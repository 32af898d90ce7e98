pub mod allocation;
pub mod execution;
pub mod reconcile;
pub mod void;
