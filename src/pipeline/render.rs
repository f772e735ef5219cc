//! PDF rasterisation: render the first resume page to a `DynamicImage` via pdfium.
//!
//! Only the first page is sent to the model; one-page resumes are the norm
//! and vision APIs bill per image.
//!
//! pdfium is not async-safe, so rendering runs inside
//! `tokio::task::spawn_blocking`. The rendered width follows the configured
//! DPI but is capped at `max_rendered_pixels` on either edge, keeping a
//! poster-sized page from exhausting memory.

use crate::config::EvaluationConfig;
use crate::error::AtsError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable pointing at an existing pdfium shared library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Rasterise the first page of the PDF at `pdf_path`.
pub async fn render_first_page(
    pdf_path: &Path,
    config: &EvaluationConfig,
) -> Result<DynamicImage, AtsError> {
    let path = pdf_path.to_path_buf();
    let dpi = config.dpi;
    let max_pixels = config.max_rendered_pixels;
    let password = config.password.clone();
    let lib_path = config.pdfium_lib_path.clone();

    tokio::task::spawn_blocking(move || {
        render_first_page_blocking(&path, dpi, max_pixels, password.as_deref(), lib_path)
    })
    .await
    .map_err(|e| AtsError::Internal(format!("Render task panicked: {}", e)))?
}

/// Bind to pdfium: explicit path, then `PDFIUM_LIB_PATH`, then the system library.
fn bind_pdfium(lib_path: Option<PathBuf>) -> Result<Pdfium, AtsError> {
    let lib_path = lib_path.or_else(|| std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from));

    let bindings = match lib_path {
        Some(ref p) => {
            debug!("Binding pdfium from {}", p.display());
            Pdfium::bind_to_library(p)
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| AtsError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Width in pixels for a page `width_pts` wide at `dpi`, capped at `max_pixels`.
fn target_width(width_pts: f32, dpi: u32, max_pixels: u32) -> i32 {
    let at_dpi = (width_pts * dpi as f32 / 72.0).round() as i32;
    at_dpi.clamp(1, max_pixels as i32)
}

fn render_first_page_blocking(
    pdf_path: &Path,
    dpi: u32,
    max_pixels: u32,
    password: Option<&str>,
    lib_path: Option<PathBuf>,
) -> Result<DynamicImage, AtsError> {
    let pdfium = bind_pdfium(lib_path)?;

    let document = pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                AtsError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                AtsError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            AtsError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("Resume PDF loaded: {} pages", total_pages);

    if total_pages == 0 {
        return Err(AtsError::EmptyDocument {
            path: pdf_path.to_path_buf(),
        });
    }

    let page = pages.get(0).map_err(|e| AtsError::RasterisationFailed {
        detail: format!("{:?}", e),
    })?;

    let render_config = PdfRenderConfig::new()
        .set_target_width(target_width(page.width().value, dpi, max_pixels))
        .set_maximum_height(max_pixels as i32);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| AtsError::RasterisationFailed {
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    debug!("Rendered page 1 → {}x{} px", image.width(), image.height());

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_width_follows_dpi() {
        // US Letter is 612pt wide: 8.5in at 150 DPI is 1275px.
        assert_eq!(target_width(612.0, 150, 2000), 1275);
        assert_eq!(target_width(612.0, 72, 2000), 612);
    }

    #[test]
    fn target_width_is_capped() {
        assert_eq!(target_width(612.0, 400, 2000), 2000);
        assert_eq!(target_width(0.0, 150, 2000), 1);
    }

    #[test]
    fn bind_to_missing_library_fails_cleanly() {
        let err = bind_pdfium(Some(PathBuf::from("/no/such/libpdfium.so"))).err().unwrap();
        assert!(matches!(err, AtsError::PdfiumBindingFailed(_)));
    }
}
