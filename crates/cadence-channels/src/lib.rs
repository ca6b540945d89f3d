//! Per-platform content generation and publishing.
//!
//! The [`DispatchTable`] maps each [`Platform`](cadence_core::Platform) to a
//! [`Channel`]: a [`ContentGenerator`], an optional [`ImageGenerator`], and a
//! [`Publisher`]. Every outcome is normalised into a
//! [`PostingResult`](cadence_core::PostingResult).

pub mod capability;
pub mod dispatch;
pub mod error;
pub mod llm;
pub mod publishers;
pub mod render;
pub mod template;

pub use capability::{ContentGenerator, GeneratedImage, ImageGenerator, Publisher};
pub use dispatch::{dry_run_result, Channel, DispatchOutcome, DispatchTable};
pub use error::ChannelError;
pub use llm::{HttpImageGenerator, LlmGenerator, LlmSettings};
pub use publishers::{FacebookPublisher, LinkedInPublisher, SimulatedPublisher, TwitterPublisher};
pub use template::TemplateGenerator;
