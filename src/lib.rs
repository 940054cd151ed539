// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Cinematic GPU post-processing pipeline built on wgpu.
//!
//! Afterglow renders an externally supplied 3D scene through a chain of
//! full-screen passes before presentation: FXAA → camera motion blur →
//! bright-pass extraction → 5-level progressive mip-chain bloom →
//! directional focus blur → final composite with chromatic distortion and
//! ordered dithering. Camera zoom transitions drive the focus blur through
//! a cancellable, eased parameter animation.
//!
//! # Key entry points
//!
//! - [`renderer::postprocess::PostPipeline`] - the pipeline root
//! - [`renderer::SceneRenderer`] - the trait external scenes implement
//! - [`gpu::render_context::RenderContext`] - device/queue/surface bundle
//! - [`options::Options`] - runtime configuration with TOML presets
//! - [`util::frame_clock::FrameClock`] - per-frame callback scheduling
//!
//! # Architecture
//!
//! The pipeline does all of its work inside
//! [`update`](renderer::postprocess::PostPipeline::update): it renders the
//! scene into an offscreen surface, selects the frame mode (motion blur,
//! directional blur, or neither) once, then executes a fixed pass order with
//! conditional skips only. All render targets are allocated once and resized
//! in place; pass parameters live in typed uniform structs flushed through
//! the queue when they change.

pub mod animate;
pub mod camera;
#[cfg(feature = "viewer")]
pub mod demo;
pub mod error;
pub mod gpu;
pub mod options;
pub mod renderer;
pub mod util;
#[cfg(feature = "viewer")]
pub mod viewer;
