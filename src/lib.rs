//! ClipShip library
//!
//! Cuts timelines of segments out of a source video (with speed change and
//! zoom), joins them through an external ffmpeg process, then delivers the
//! result to the local clip library or one of two upload destinations.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod planner;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use domain::errors::{DomainError, DomainResult};
pub use domain::model::{
    ClipName, ClipRequest, ClipSource, ClipState, Destination, EncodeProgress, EncoderKind, Segment,
    Timeline, UploadProgress,
};
