//! Error types for the edgequake-ats library.
//!
//! A single fatal error type, [`AtsError`], covers everything that stops an
//! evaluation from producing a reply: missing inputs, unreadable PDFs,
//! provider misconfiguration and model failures.
//!
//! A reply that carries no recognisable score is **not** an error. The
//! extractor returns `None` for it and the caller shows a notice instead
//! (see [`crate::score::extract_score`]).
//!
//! Most messages end with a hint the user can act on.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-ats library.
#[derive(Debug, Error)]
pub enum AtsError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// A required input (resume or job description) was not supplied.
    #[error("Missing input: {what}\nPlease upload a PDF and provide a job description before proceeding.")]
    MissingInput { what: String },

    /// Resume file was not found at the given path.
    #[error("Resume file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The resume exists but cannot be read by this process.
    #[error("Cannot read resume '{path}': permission denied\nCheck the file's read permissions.")]
    PermissionDenied { path: PathBuf },

    /// The resume argument is neither a usable path nor an HTTP/HTTPS URL.
    #[error("'{input}' is not a resume path or an HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// Fetching a resume URL failed.
    #[error("Could not fetch resume from '{url}': {reason}\nCheck the link and your network connection.")]
    DownloadFailed { url: String, reason: String },

    /// Fetching a resume URL took longer than `download_timeout_secs`.
    #[error("Resume download from '{url}' gave up after {secs}s\nRaise --download-timeout or save the file locally.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("Resume is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not open the resume.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// The resume is encrypted and no password was given.
    #[error("Resume '{path}' is password-protected.\nPass the password with --password.")]
    PasswordRequired { path: PathBuf },

    /// The password given does not open the resume.
    #[error("The password does not open resume '{path}'")]
    WrongPassword { path: PathBuf },

    /// The PDF opened fine but has no pages to render.
    #[error("PDF '{path}' has no pages")]
    EmptyDocument { path: PathBuf },

    /// pdfium-render failed to rasterise the first page.
    #[error("Rasterisation failed: {detail}")]
    RasterisationFailed { detail: String },

    /// The rendered page could not be encoded as JPEG.
    #[error("Image encoding failed: {detail}")]
    EncodingFailed { detail: String },

    /// No pdfium shared library could be loaded.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install pdfium system-wide, or set PDFIUM_LIB_PATH=/path/to/libpdfium\n\
(or pass --pdfium-lib) to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Prompt errors ─────────────────────────────────────────────────────
    /// The evaluation mode label is not one of the known modes.
    #[error("Unknown evaluation mode '{0}'\nExpected one of: Zero-Shot, One-Shot, Few-Shot.")]
    UnknownMode(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// No usable model provider (usually a missing API key).
    #[error("Model provider '{provider}' is unavailable.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The model call failed after all retries.
    #[error("Generation failed after {retries} retries: {message}")]
    GenerationFailed { retries: u32, message: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the report file.
    #[error("Could not write report '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// `EvaluationConfigBuilder::build` rejected a setting.
    #[error("Invalid evaluation settings: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Something that should not happen, such as a panicked worker task.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AtsError {
    /// `true` for errors the user can fix by supplying different input.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            AtsError::MissingInput { .. }
                | AtsError::FileNotFound { .. }
                | AtsError::PermissionDenied { .. }
                | AtsError::InvalidInput { .. }
                | AtsError::NotAPdf { .. }
                | AtsError::PasswordRequired { .. }
                | AtsError::WrongPassword { .. }
                | AtsError::UnknownMode(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_display() {
        let e = AtsError::MissingInput {
            what: "job description".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("job description"), "got: {msg}");
        assert!(msg.contains("upload a PDF"), "got: {msg}");
    }

    #[test]
    fn unknown_mode_display_lists_choices() {
        let e = AtsError::UnknownMode("Two-Shot".into());
        let msg = e.to_string();
        assert!(msg.contains("Two-Shot"));
        assert!(msg.contains("Few-Shot"));
    }

    #[test]
    fn generation_failed_display() {
        let e = AtsError::GenerationFailed {
            retries: 3,
            message: "quota exceeded".into(),
        };
        assert!(e.to_string().contains("3 retries"));
        assert!(e.to_string().contains("quota exceeded"));
    }

    #[test]
    fn user_correctable_classification() {
        assert!(AtsError::MissingInput { what: "resume".into() }.is_user_correctable());
        assert!(AtsError::UnknownMode("x".into()).is_user_correctable());
        assert!(!AtsError::GenerationFailed {
            retries: 0,
            message: "boom".into()
        }
        .is_user_correctable());
        assert!(!AtsError::Internal("x".into()).is_user_correctable());
    }
}
