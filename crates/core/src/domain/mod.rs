pub mod snapshot;
pub mod tip;
