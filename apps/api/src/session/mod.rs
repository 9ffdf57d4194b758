//! Revision session controller — the Upload → Review state machine that
//! drives iterative résumé enhancement.
//!
//! A [`Session`] owns the retained source file, the current [`Artifact`]
//! with its single live display handle, the draft instruction, and the
//! in-flight guard. Front ends map their events onto [`Session::submit_upload`],
//! [`Session::submit_revision`] and [`Session::reset`]; the only suspension
//! points are the enhancement-service calls.

mod artifact;
mod source;

pub use artifact::{
    Artifact, ArtifactHandle, ArtifactStore, MemoryArtifactStore, ARTIFACT_FILE_NAME,
};
pub use source::{SourceFile, PDF_MEDIA_TYPE};

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::info;

use crate::enhancer::{EnhancementBackend, EnhancerError};

/// Where the session stands in the upload/review cycle.
/// `Review` is only reachable through a successful artifact creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Upload,
    Review,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Please upload a PDF file only")]
    UnsupportedMediaType,

    #[error("Instruction must not be empty")]
    EmptyInstruction,

    #[error("Another request is already in flight")]
    Busy,

    #[error("No résumé has been uploaded yet")]
    NoSourceFile,

    /// The enhancement service rejected the request; carries the message
    /// it supplied (or a generic status-bearing phrase).
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("The enhancement service could not be reached; please try again")]
    Transport,
}

impl From<EnhancerError> for SessionError {
    fn from(e: EnhancerError) -> Self {
        match e {
            EnhancerError::Service { status, message } => SessionError::Rejected { status, message },
            EnhancerError::Http(e) => {
                tracing::error!("Enhancement request transport failure: {e}");
                SessionError::Transport
            }
            EnhancerError::EmptyBody => {
                tracing::error!("Enhancement service returned an empty document");
                SessionError::Transport
            }
        }
    }
}

/// Borrowed view of the current artifact for saving to disk.
pub struct ArtifactDownload<'a> {
    pub bytes: &'a Bytes,
    pub file_name: &'static str,
}

/// One user's revision session.
///
/// At most one upload or revision request is in flight at a time; attempts
/// made while pending are rejected without touching the network. Every
/// mutating operation either completes fully or leaves the session exactly
/// as it was before the call.
pub struct Session {
    backend: Arc<dyn EnhancementBackend>,
    artifacts: Arc<dyn ArtifactStore>,
    phase: Phase,
    source: Option<SourceFile>,
    artifact: Option<Artifact>,
    instruction: String,
    pending: bool,
}

impl Session {
    pub fn new(backend: Arc<dyn EnhancementBackend>, artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self {
            backend,
            artifacts,
            phase: Phase::Upload,
            source: None,
            artifact: None,
            instruction: String::new(),
            pending: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn set_instruction(&mut self, text: impl Into<String>) {
        self.instruction = text.into();
    }

    pub fn source_file(&self) -> Option<&SourceFile> {
        self.source.as_ref()
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    /// Sends a résumé to the enhancement service's upload operation.
    ///
    /// Non-PDF files are rejected locally before any network call; the
    /// backend is not trusted to validate the type. On success the file is
    /// retained as the session's source, the artifact is replaced and the
    /// session moves to [`Phase::Review`]. On failure nothing changes.
    pub async fn submit_upload(&mut self, file: SourceFile) -> Result<(), SessionError> {
        if self.pending {
            return Err(SessionError::Busy);
        }
        if !file.is_pdf() {
            return Err(SessionError::UnsupportedMediaType);
        }

        self.pending = true;
        let result = self.backend.upload(&file).await;
        self.pending = false;

        let enhanced = result?;
        info!(
            "Résumé '{}' enhanced ({} bytes in, {} bytes out)",
            file.file_name(),
            file.size(),
            enhanced.len()
        );

        self.replace_artifact(enhanced);
        self.source = Some(file);
        self.phase = Phase::Review;
        Ok(())
    }

    /// Applies the drafted instruction against the *original* source file.
    ///
    /// The service re-derives the document from the source on every pass,
    /// so the latest artifact is never resubmitted. On success the artifact
    /// is replaced and the instruction cleared; the phase stays `Review`.
    pub async fn submit_revision(&mut self) -> Result<(), SessionError> {
        if self.pending {
            return Err(SessionError::Busy);
        }
        if self.phase != Phase::Review {
            return Err(SessionError::NoSourceFile);
        }
        let source = self.source.clone().ok_or(SessionError::NoSourceFile)?;
        let instruction = self.instruction.trim().to_owned();
        if instruction.is_empty() {
            return Err(SessionError::EmptyInstruction);
        }

        self.pending = true;
        let result = self.backend.revise(&source, &instruction).await;
        self.pending = false;

        let enhanced = result?;
        info!("Revision applied ({} bytes out)", enhanced.len());

        self.replace_artifact(enhanced);
        self.instruction.clear();
        Ok(())
    }

    /// Returns the session to its initial state, releasing the live handle.
    /// Idempotent.
    pub fn reset(&mut self) {
        self.release_artifact();
        self.source = None;
        self.instruction.clear();
        self.phase = Phase::Upload;
    }

    /// Read-only: the current artifact's bytes with the fixed suggested
    /// filename, or `None` when there is nothing to download.
    pub fn download(&self) -> Option<ArtifactDownload<'_>> {
        self.artifact.as_ref().map(|artifact| ArtifactDownload {
            bytes: artifact.bytes(),
            file_name: ARTIFACT_FILE_NAME,
        })
    }

    /// Read-only: the live display handle, or `None` when no artifact exists.
    pub fn preview(&self) -> Option<&ArtifactHandle> {
        self.artifact.as_ref().map(Artifact::handle)
    }

    // Release-then-create: the prior handle must be retired before a new
    // one is issued so handles never accumulate.
    fn replace_artifact(&mut self, bytes: Bytes) {
        self.release_artifact();
        let handle = self.artifacts.create(&bytes);
        self.artifact = Some(Artifact::new(bytes, handle));
    }

    fn release_artifact(&mut self) {
        if let Some(artifact) = self.artifact.take() {
            self.artifacts.release(artifact.handle());
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.release_artifact();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    /// Backend double that counts calls and hands out a distinct payload
    /// per call, so tests can observe binary identity changes.
    #[derive(Default)]
    struct StubBackend {
        uploads: AtomicUsize,
        revisions: AtomicUsize,
        failure: Mutex<Option<(u16, String)>>,
    }

    impl StubBackend {
        fn fail_with(&self, status: u16, message: &str) {
            *self.failure.lock().unwrap() = Some((status, message.to_string()));
        }

        fn current_failure(&self) -> Option<EnhancerError> {
            self.failure
                .lock()
                .unwrap()
                .as_ref()
                .map(|(status, message)| EnhancerError::Service {
                    status: *status,
                    message: message.clone(),
                })
        }
    }

    #[async_trait]
    impl EnhancementBackend for StubBackend {
        async fn upload(&self, _file: &SourceFile) -> Result<Bytes, EnhancerError> {
            let n = self.uploads.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.current_failure() {
                return Err(err);
            }
            Ok(Bytes::from(format!("enhanced-{n}")))
        }

        async fn revise(
            &self,
            _file: &SourceFile,
            instruction: &str,
        ) -> Result<Bytes, EnhancerError> {
            let n = self.revisions.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.current_failure() {
                return Err(err);
            }
            Ok(Bytes::from(format!("revised-{n}-{instruction}")))
        }
    }

    fn new_session() -> (Session, Arc<StubBackend>, Arc<MemoryArtifactStore>) {
        let backend = Arc::new(StubBackend::default());
        let store = Arc::new(MemoryArtifactStore::new());
        let session = Session::new(backend.clone(), store.clone());
        (session, backend, store)
    }

    fn pdf_file() -> SourceFile {
        SourceFile::new(
            "resume.pdf",
            PDF_MEDIA_TYPE,
            Bytes::from_static(b"%PDF-1.4 original"),
        )
    }

    #[tokio::test]
    async fn test_non_pdf_upload_rejected_without_network_call() {
        let (mut session, backend, store) = new_session();

        let file = SourceFile::new("resume.txt", "text/plain", Bytes::from_static(b"plain"));
        let err = session.submit_upload(file).await.unwrap_err();

        assert!(matches!(err, SessionError::UnsupportedMediaType));
        assert_eq!(backend.uploads.load(Ordering::SeqCst), 0);
        assert_eq!(session.phase(), Phase::Upload);
        assert!(session.download().is_none());
        assert_eq!(store.live_handles(), 0);
    }

    #[tokio::test]
    async fn test_upload_happy_path_enters_review() {
        let (mut session, _backend, store) = new_session();

        session.submit_upload(pdf_file()).await.unwrap();

        assert_eq!(session.phase(), Phase::Review);
        assert!(!session.is_pending());
        assert!(session.source_file().is_some());
        assert_eq!(store.live_handles(), 1);

        let download = session.download().expect("artifact should be downloadable");
        assert_eq!(download.file_name, "enhanced-resume.pdf");
        assert_eq!(download.bytes.as_ref(), b"enhanced-0");
    }

    #[tokio::test]
    async fn test_upload_failure_leaves_session_untouched() {
        let (mut session, backend, store) = new_session();
        backend.fail_with(500, "parser exploded");

        let err = session.submit_upload(pdf_file()).await.unwrap_err();

        assert_eq!(err.to_string(), "parser exploded");
        assert_eq!(session.phase(), Phase::Upload);
        assert!(!session.is_pending());
        assert!(session.source_file().is_none());
        assert!(session.download().is_none());
        assert_eq!(store.live_handles(), 0);
    }

    #[tokio::test]
    async fn test_re_upload_releases_prior_handle() {
        let (mut session, _backend, store) = new_session();

        session.submit_upload(pdf_file()).await.unwrap();
        let first = session.preview().unwrap().clone();

        session.submit_upload(pdf_file()).await.unwrap();
        let second = session.preview().unwrap().clone();

        assert_ne!(first, second);
        assert_eq!(store.live_handles(), 1);
    }

    #[tokio::test]
    async fn test_revision_replays_original_source_and_clears_instruction() {
        let (mut session, _backend, store) = new_session();

        session.submit_upload(pdf_file()).await.unwrap();
        let source_before = session.source_file().unwrap().bytes().clone();
        let artifact_before = session.download().unwrap().bytes.clone();

        session.set_instruction("add more bullet points");
        session.submit_revision().await.unwrap();

        // Source is unchanged: revisions never resubmit the latest artifact.
        assert_eq!(session.source_file().unwrap().bytes(), &source_before);
        assert_ne!(session.download().unwrap().bytes, &artifact_before);
        assert_eq!(session.instruction(), "");
        assert_eq!(session.phase(), Phase::Review);
        assert_eq!(store.live_handles(), 1);
    }

    #[tokio::test]
    async fn test_blank_instruction_rejected_without_network_call() {
        let (mut session, backend, _store) = new_session();

        session.submit_upload(pdf_file()).await.unwrap();
        session.set_instruction("   \n ");
        let err = session.submit_revision().await.unwrap_err();

        assert!(matches!(err, SessionError::EmptyInstruction));
        assert_eq!(backend.revisions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_revision_requires_review_phase() {
        let (mut session, backend, _store) = new_session();

        session.set_instruction("make it shine");
        let err = session.submit_revision().await.unwrap_err();

        assert!(matches!(err, SessionError::NoSourceFile));
        assert_eq!(backend.revisions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pending_guard_rejects_concurrent_submissions() {
        let (mut session, backend, _store) = new_session();

        session.submit_upload(pdf_file()).await.unwrap();
        session.set_instruction("tighten the summary");
        session.pending = true;

        let err = session.submit_revision().await.unwrap_err();
        assert!(matches!(err, SessionError::Busy));
        assert_eq!(backend.revisions.load(Ordering::SeqCst), 0);

        let err = session.submit_upload(pdf_file()).await.unwrap_err();
        assert!(matches!(err, SessionError::Busy));
        assert_eq!(backend.uploads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_service_failure_on_revision_preserves_artifact() {
        let (mut session, backend, store) = new_session();

        session.submit_upload(pdf_file()).await.unwrap();
        let handle_before = session.preview().unwrap().clone();

        backend.fail_with(502, "model timeout");
        session.set_instruction("shorten the intro");
        let err = session.submit_revision().await.unwrap_err();

        assert_eq!(err.to_string(), "model timeout");
        assert_eq!(session.phase(), Phase::Review);
        assert!(!session.is_pending());
        assert_eq!(session.preview().unwrap(), &handle_before);
        assert_eq!(session.instruction(), "shorten the intro");
        assert!(session.download().is_some());
        assert_eq!(store.live_handles(), 1);
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let (mut session, _backend, store) = new_session();

        session.submit_upload(pdf_file()).await.unwrap();
        session.reset();
        session.reset();

        assert_eq!(session.phase(), Phase::Upload);
        assert!(session.source_file().is_none());
        assert!(session.download().is_none());
        assert!(session.preview().is_none());
        assert_eq!(session.instruction(), "");
        assert_eq!(store.live_handles(), 0);
    }

    #[tokio::test]
    async fn test_reset_after_several_revisions_releases_everything() {
        let (mut session, _backend, store) = new_session();

        session.submit_upload(pdf_file()).await.unwrap();
        for instruction in ["bolder headings", "trim education", "reorder skills"] {
            session.set_instruction(instruction);
            session.submit_revision().await.unwrap();
            assert_eq!(store.live_handles(), 1);
        }

        session.reset();

        assert_eq!(session.phase(), Phase::Upload);
        assert!(session.source_file().is_none());
        assert!(session.download().is_none());
        assert_eq!(store.live_handles(), 0);
    }

    #[tokio::test]
    async fn test_dropping_a_session_releases_the_live_handle() {
        let backend = Arc::new(StubBackend::default());
        let store = Arc::new(MemoryArtifactStore::new());

        {
            let mut session = Session::new(backend, store.clone());
            session.submit_upload(pdf_file()).await.unwrap();
            assert_eq!(store.live_handles(), 1);
        }

        assert_eq!(store.live_handles(), 0);
    }
}
