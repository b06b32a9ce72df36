pub mod client;

pub use client::{ProbeOutcome, RawLabelList, VisionClient, VisionConfig, VisionFailure};
