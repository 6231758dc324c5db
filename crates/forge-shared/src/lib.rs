//! Shared types used across all forge crates.

mod fence;
mod model;

pub use fence::{extract_fenced_config, extract_fenced_json, strip_fences, ModelOutput};
pub use model::{
    DetailSpec, FollowUpQuestion, MissingInfoRequest, ProblemBrief, ProblemCategory, TurnRecord,
};
