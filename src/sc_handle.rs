use tracing::warn;

use crate::backend::{RawHandle, ScmBackend};

/// A handle holder that wraps a low level [`RawHandle`] and closes it through the backend that
/// issued it.
pub(crate) struct ScHandle<'b, B: ScmBackend + ?Sized> {
    backend: &'b B,
    handle: RawHandle,
}

impl<'b, B: ScmBackend + ?Sized> ScHandle<'b, B> {
    pub(crate) fn new(backend: &'b B, handle: RawHandle) -> Self {
        debug_assert!(handle.is_valid(), "backend returned an invalid handle as success");
        ScHandle { backend, handle }
    }

    /// Returns underlying [`RawHandle`].
    pub(crate) fn raw_handle(&self) -> RawHandle {
        self.handle
    }
}

impl<B: ScmBackend + ?Sized> Drop for ScHandle<'_, B> {
    fn drop(&mut self) {
        if let Err(e) = self.backend.close_handle(self.handle) {
            warn!(handle = ?self.handle, "Error closing service handle: {e}");
        }
    }
}
