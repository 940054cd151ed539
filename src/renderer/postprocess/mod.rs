//! GPU post-processing: anti-aliasing, motion blur, progressive bloom,
//! zoom-driven focus blur, and the final composite.
//!
//! [`PostPipeline`] is the entry point: it owns the offscreen
//! [`TargetPool`], one module per pass, and encodes a whole frame per
//! [`PostPipeline::update`]. The fixed stage orders live in [`plan`];
//! surface sizing math lives in [`targets`] and is pure so it tests without
//! a device.

pub mod antialias;
pub mod bloom_composite;
pub mod bright;
pub mod final_composite;
pub mod focus_blur;
pub mod mip_blur;
pub mod motion_blur;
pub mod pipeline;
pub mod plan;
pub mod screen_pass;
pub mod targets;

pub use pipeline::{
    FrameStats, PipelineParams, PostPipeline, ZoomTransition,
};
pub use plan::{FrameMode, Stage};
pub use targets::{PoolSizes, TargetPool};
