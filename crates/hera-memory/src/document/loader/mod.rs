mod text;
pub use text::TextLoader;

#[cfg(feature = "pdf")]
mod pdf;
#[cfg(feature = "pdf")]
pub use pdf::PdfLoader;

use std::path::Path;
use std::pin::Pin;

use super::{Document, DocumentError, DocumentFormat, DocumentLoader};

/// Dispatches to the loader registered for a file's extension.
#[derive(Default)]
pub struct MultiFormatLoader {
    text: TextLoader,
    #[cfg(feature = "pdf")]
    pdf: PdfLoader,
}

impl MultiFormatLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `path` has an extension some registered loader handles.
    #[must_use]
    pub fn supports(&self, path: &Path) -> bool {
        self.loader_for(path).is_ok()
    }

    fn loader_for(&self, path: &Path) -> Result<&dyn DocumentLoader, DocumentError> {
        match DocumentFormat::from_path(path) {
            Some(DocumentFormat::Text | DocumentFormat::Markdown) => Ok(&self.text),
            #[cfg(feature = "pdf")]
            Some(DocumentFormat::Pdf) => Ok(&self.pdf),
            #[cfg(not(feature = "pdf"))]
            Some(DocumentFormat::Pdf) => Err(DocumentError::UnsupportedFormat(
                "pdf (built without the `pdf` feature)".into(),
            )),
            None => Err(DocumentError::UnsupportedFormat(
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("<none>")
                    .to_owned(),
            )),
        }
    }
}

impl DocumentLoader for MultiFormatLoader {
    fn load(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Vec<Document>, DocumentError>> + Send + '_>>
    {
        match self.loader_for(path) {
            Ok(loader) => loader.load(path),
            Err(e) => Box::pin(std::future::ready(Err(e))),
        }
    }

    fn supported_extensions(&self) -> &[&str] {
        #[cfg(feature = "pdf")]
        {
            DocumentFormat::EXTENSIONS
        }
        #[cfg(not(feature = "pdf"))]
        {
            &["md", "markdown", "txt"]
        }
    }
}
