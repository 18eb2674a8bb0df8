//! Shared models and record format

pub mod models;
pub mod record;

pub use record::{DocumentId, Record, RECORD_DELIMITER};
