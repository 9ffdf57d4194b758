//! Artifact lifecycle — releasable handles to in-memory binary data.
//!
//! A handle is the generalization of a browser object URL: a transient
//! reference the host platform uses to display or download the current
//! document. The session keeps at most one handle live at a time and
//! releases the prior one before issuing a replacement, so handles never
//! accumulate across revision cycles.

use std::collections::HashSet;
use std::sync::Mutex;

use bytes::Bytes;
use uuid::Uuid;

/// Suggested filename for every document the enhancement service produces.
pub const ARTIFACT_FILE_NAME: &str = "enhanced-resume.pdf";

/// A transient, releasable reference to an artifact's binary data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactHandle {
    id: Uuid,
}

impl ArtifactHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

/// Issues and retires artifact handles.
///
/// Injected as `Arc<dyn ArtifactStore>` so a host platform can bridge
/// handles to its own display mechanism; tests use [`MemoryArtifactStore`]
/// to assert the one-live-handle discipline.
pub trait ArtifactStore: Send + Sync {
    fn create(&self, bytes: &Bytes) -> ArtifactHandle;
    fn release(&self, handle: &ArtifactHandle);
}

/// In-memory store that tracks which handles are still live.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    live: Mutex<HashSet<Uuid>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_handles(&self) -> usize {
        self.live.lock().expect("artifact store lock poisoned").len()
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn create(&self, _bytes: &Bytes) -> ArtifactHandle {
        let id = Uuid::new_v4();
        self.live
            .lock()
            .expect("artifact store lock poisoned")
            .insert(id);
        ArtifactHandle { id }
    }

    fn release(&self, handle: &ArtifactHandle) {
        self.live
            .lock()
            .expect("artifact store lock poisoned")
            .remove(&handle.id);
    }
}

/// The most recently received enhanced PDF plus its live display handle.
#[derive(Debug, Clone)]
pub struct Artifact {
    bytes: Bytes,
    handle: ArtifactHandle,
}

impl Artifact {
    pub(crate) fn new(bytes: Bytes, handle: ArtifactHandle) -> Self {
        Self { bytes, handle }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn handle(&self) -> &ArtifactHandle {
        &self.handle
    }
}
