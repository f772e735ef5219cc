//! Input resolution: normalise a resume path, URL or byte buffer to a local file.
//!
//! pdfium opens documents from the file system, so every input form ends up
//! as a path. Downloads and in-memory uploads land in temp storage owned by
//! [`ResolvedInput`] and are removed when it is dropped. The `%PDF` magic
//! bytes are checked up front so a mistaken upload produces a readable error
//! instead of a pdfium failure.

use crate::error::AtsError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// The resolved resume: a local path plus whatever temp storage backs it.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; PDF downloaded to a temp directory.
    /// The `TempDir` is kept alive to prevent cleanup until evaluation completes.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
    /// Input was an in-memory upload, spilled to a named temp file.
    Buffered { file: NamedTempFile },
}

impl ResolvedInput {
    /// Get the path to the PDF file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
            ResolvedInput::Buffered { file } => file.path(),
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a path or URL to a local PDF file.
///
/// An empty input means no resume was supplied and yields
/// [`AtsError::MissingInput`].
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, AtsError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AtsError::MissingInput {
            what: "no resume file supplied".into(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Spill an uploaded PDF held in memory to a temp file.
pub fn resolve_bytes(bytes: &[u8]) -> Result<ResolvedInput, AtsError> {
    if bytes.is_empty() {
        return Err(AtsError::MissingInput {
            what: "no resume file supplied".into(),
        });
    }
    check_magic(bytes, Path::new("<upload>"))?;

    let mut file = NamedTempFile::new().map_err(|e| AtsError::Internal(format!("tempfile: {e}")))?;
    file.write_all(bytes)
        .map_err(|e| AtsError::Internal(format!("tempfile write: {e}")))?;

    debug!("Buffered {} byte upload at {}", bytes.len(), file.path().display());
    Ok(ResolvedInput::Buffered { file })
}

fn check_magic(bytes: &[u8], path: &Path) -> Result<(), AtsError> {
    if bytes.len() >= 4 && &bytes[..4] != PDF_MAGIC {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(AtsError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

/// Resolve a local file path, validating existence and PDF magic bytes.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, AtsError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(AtsError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() {
                check_magic(&magic, &path)?;
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(AtsError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(AtsError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, AtsError> {
    info!("Downloading resume from: {}", url);

    let parsed = reqwest::Url::parse(url).map_err(|_| AtsError::InvalidInput {
        input: url.to_string(),
    })?;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AtsError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(parsed.clone()).send().await.map_err(|e| {
        if e.is_timeout() {
            AtsError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            AtsError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(AtsError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = filename_from_url(&parsed);

    let temp_dir = TempDir::new().map_err(|e| AtsError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response.bytes().await.map_err(|e| AtsError::DownloadFailed {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    check_magic(&bytes, &file_path)?;

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| AtsError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded to: {}", file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment if it looks like a file name, else `resume.pdf`.
fn filename_from_url(url: &reqwest::Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|last| !last.is_empty() && last.contains('.'))
        .map(str::to_string)
        .unwrap_or_else(|| "resume.pdf".to_string())
}
