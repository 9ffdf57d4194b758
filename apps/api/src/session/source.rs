use bytes::Bytes;

/// The only media type the revision workflow accepts.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// The originally uploaded résumé.
///
/// Retained unchanged across revision cycles: every revision replays this
/// file against the enhancement service, never the latest artifact. The
/// service re-derives the document from the source on each pass.
#[derive(Debug, Clone)]
pub struct SourceFile {
    file_name: String,
    media_type: String,
    bytes: Bytes,
}

impl SourceFile {
    pub fn new(
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Bytes,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_pdf(&self) -> bool {
        self.media_type == PDF_MEDIA_TYPE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_media_type_accepted() {
        let file = SourceFile::new("resume.pdf", "application/pdf", Bytes::from_static(b"%PDF"));
        assert!(file.is_pdf());
        assert_eq!(file.size(), 4);
    }

    #[test]
    fn test_other_media_types_rejected() {
        let file = SourceFile::new("notes.txt", "text/plain", Bytes::from_static(b"hello"));
        assert!(!file.is_pdf());
    }
}
