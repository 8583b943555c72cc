//! Background Tasks
//!
//! Periodic maintenance work running alongside the ingestion workers.

mod cleanup;

pub use cleanup::spawn_cleanup_task;
