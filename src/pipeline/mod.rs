//! Pipeline stages for resume evaluation.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ llm ──▶ score
//! (path/URL)  (pdfium)  (JPEG/b64)  (VLM)   (crate::score)
//! ```
//!
//! 1. [`input`]: path, URL or byte buffer to a local file
//! 2. [`render`]: first page to a bitmap, inside `spawn_blocking`
//! 3. [`encode`]: RGB, then JPEG, then base64 `image/jpeg`
//! 4. [`llm`]: the [`llm::ModelInvoker`] trait and its retrying
//!    `edgequake_llm` implementation
//!
//! Prompt construction and score extraction are pure and live outside the
//! pipeline in [`crate::prompts`] and [`crate::score`].

pub mod encode;
pub mod input;
pub mod llm;
pub mod render;
