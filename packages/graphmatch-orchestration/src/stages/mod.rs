// Pipeline Stages

pub mod group;
pub mod match_stage;

pub use group::group_record;
pub use match_stage::{process_document, DocumentOutput};
