//! Ports: interfaces to collaborators owned by other layers.

pub mod stage_store;

pub use stage_store::{StageStore, StageStoreError};
