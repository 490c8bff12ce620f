//! Pipeline stages for document-to-Markdown conversion.
//!
//! Each submodule implements exactly one step, keeping every stage
//! independently testable.
//!
//! ## Data Flow
//!
//! ```text
//! validate ──▶ decode ──▶ page ──▶ {gate, invoke} ──▶ render
//! (ceilings)  (container) (per page) (per image)     (artifact → text)
//! ```
//!
//! 1. [`validate`] — cheap pre-flight checks on raw byte buffers before any
//!    expensive parsing or OCR is attempted
//! 2. [`gate`]     — per-image admission: decodable, allowed format, within
//!    the size bound
//! 3. [`invoke`]   — one isolated OCR call: transient file, timeout,
//!    guaranteed cleanup
//! 4. [`page`]     — one page: native text plus gated OCR over its images,
//!    diagnostics accumulated locally
//! 5. [`render`]   — deterministic Markdown rendering of a finished artifact

pub mod gate;
pub mod invoke;
pub mod page;
pub mod render;
pub mod validate;
