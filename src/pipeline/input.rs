//! Input resolution: validate a user-supplied path and classify it.
//!
//! All validation happens here, before any external tool is spawned: an
//! unsupported extension or unreadable file must never cost a subprocess.
//! For PDFs we also check the `%PDF` magic so the user gets a precise error
//! rather than poppler's generic "couldn't open file".

use crate::error::Pdf2DoclingError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A validated input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    /// A PDF document: pages go through geometry + rasterisation.
    Pdf(PathBuf),
    /// A single raster image (JPG/PNG): decoded directly.
    Image(PathBuf),
}

impl InputKind {
    pub fn path(&self) -> &Path {
        match self {
            InputKind::Pdf(p) | InputKind::Image(p) => p,
        }
    }
}

/// Validate `path_str` and classify it by extension.
///
/// # Errors
/// * [`Pdf2DoclingError::FileNotFound`] / [`Pdf2DoclingError::PermissionDenied`]
/// * [`Pdf2DoclingError::UnsupportedFormat`] — extension not in {pdf, jpg, jpeg, png}
/// * [`Pdf2DoclingError::NotAPdf`] — `.pdf` file without the `%PDF` magic
pub fn resolve_input(path_str: &str) -> Result<InputKind, Pdf2DoclingError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(Pdf2DoclingError::FileNotFound { path });
    }

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let kind = match extension.as_str() {
        "pdf" => InputKind::Pdf(path.clone()),
        "jpg" | "jpeg" | "png" => InputKind::Image(path.clone()),
        _ => {
            return Err(Pdf2DoclingError::UnsupportedFormat { path, extension });
        }
    };

    // Check readability by opening; for PDFs also verify the magic bytes.
    match std::fs::File::open(&path) {
        Ok(mut f) => {
            if matches!(kind, InputKind::Pdf(_)) {
                use std::io::Read;
                let mut magic = [0u8; 4];
                if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                    return Err(Pdf2DoclingError::NotAPdf { path, magic });
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2DoclingError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Pdf2DoclingError::FileNotFound { path });
        }
    }

    debug!(?kind, "resolved input");
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn classifies_pdf_and_images() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = write_file(&dir, "doc.pdf", b"%PDF-1.7\n");
        let jpg = write_file(&dir, "scan.JPG", b"\xff\xd8\xff");
        let png = write_file(&dir, "page.png", b"\x89PNG");

        assert!(matches!(
            resolve_input(pdf.to_str().unwrap()).unwrap(),
            InputKind::Pdf(_)
        ));
        assert!(matches!(
            resolve_input(jpg.to_str().unwrap()).unwrap(),
            InputKind::Image(_)
        ));
        assert!(matches!(
            resolve_input(png.to_str().unwrap()).unwrap(),
            InputKind::Image(_)
        ));
    }

    #[test]
    fn rejects_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let txt = write_file(&dir, "notes.txt", b"hello");

        let err = resolve_input(txt.to_str().unwrap()).unwrap_err();
        match err {
            Pdf2DoclingError::UnsupportedFormat { extension, .. } => {
                assert_eq!(extension, "txt");
            }
            other => panic!("expected UnsupportedFormat, got {other}"),
        }
    }

    #[test]
    fn rejects_extensionless_file() {
        let dir = tempfile::tempdir().unwrap();
        let bare = write_file(&dir, "README", b"hello");
        assert!(matches!(
            resolve_input(bare.to_str().unwrap()).unwrap_err(),
            Pdf2DoclingError::UnsupportedFormat { .. }
        ));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            resolve_input("/no/such/file.pdf").unwrap_err(),
            Pdf2DoclingError::FileNotFound { .. }
        ));
    }

    #[test]
    fn pdf_magic_is_verified() {
        let dir = tempfile::tempdir().unwrap();
        let fake = write_file(&dir, "fake.pdf", b"GIF89a junk");

        let err = resolve_input(fake.to_str().unwrap()).unwrap_err();
        match err {
            Pdf2DoclingError::NotAPdf { magic, .. } => assert_eq!(&magic, b"GIF8"),
            other => panic!("expected NotAPdf, got {other}"),
        }
    }
}
