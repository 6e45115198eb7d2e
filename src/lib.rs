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

//! Double-buffered GPU texture streaming for low-latency video frame
//! display, built on wgpu.
//!
//! Framestream turns raw CPU-resident pixel buffers (packed BGRA/RGBA,
//! 10-bit packed RGBA, or planar 4:2:0 Y'CbCr) into GPU textures ready
//! for sampling, one frame at a time. The streaming path writes each
//! frame into one of two persistently mapped transfer buffers and flushes
//! it to the plane textures lazily at bind time, so neither the producer
//! nor the draw call waits on the other.
//!
//! # Key entry points
//!
//! - [`texture::FrameTexture`] - the streamable surface: `setup`,
//!   `update`, `bind`
//! - [`format::FrameConfig`] - the configuration surface (format,
//!   dimensions, stride, streaming flag)
//! - [`format::FrameLayout`] - pure per-plane geometry computation
//!
//! # Per-frame cycle
//!
//! A producer calls [`texture::FrameTexture::update`] with one frame; the
//! render loop calls [`texture::FrameTexture::bind`] before drawing and
//! samples the planes through the returned bind group (plane `i` at
//! bindings `2i` and `2i + 1`). A second update before the bind is
//! rejected as back-pressure rather than silently dropping frames.

pub mod error;
pub mod format;
pub mod gpu;
pub mod texture;

pub use error::{LayoutError, StreamError};
pub use format::{FrameConfig, FrameLayout, PixelFormat, PlaneLayout};
pub use texture::FrameTexture;
