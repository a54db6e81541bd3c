use crate::descriptor::DescriptorStore;
use crate::domain::VersionDescriptor;
use crate::error::Result;

/// Scoped mutation of the persisted descriptor.
///
/// While the guard is alive the store holds the release descriptor. The
/// sentinel is written back by [DescriptorGuard::restore], or by `Drop` if
/// the guard goes out of scope first (early return, `?`, panic unwinding).
pub struct DescriptorGuard<S: DescriptorStore> {
    store: Option<S>,
    sentinel: VersionDescriptor,
}

impl<S: DescriptorStore> DescriptorGuard<S> {
    /// Write `next` into `store` and start guarding it.
    ///
    /// If the write itself fails the sentinel is written back before the
    /// error is returned, so a half-written file is not left behind.
    pub fn acquire(mut store: S, next: &VersionDescriptor, sentinel: VersionDescriptor) -> Result<Self> {
        if let Err(e) = store.store(next) {
            if let Err(restore_err) = store.store(&sentinel) {
                tracing::error!(error = %restore_err, "failed to restore descriptor after write error");
            }
            return Err(e);
        }
        tracing::debug!(descriptor = %next, "persisted release descriptor");

        Ok(DescriptorGuard {
            store: Some(store),
            sentinel,
        })
    }

    pub fn sentinel(&self) -> &VersionDescriptor {
        &self.sentinel
    }

    /// Write the sentinel back and release the store
    pub fn restore(mut self) -> Result<()> {
        match self.store.take() {
            Some(mut store) => {
                store.store(&self.sentinel)?;
                tracing::debug!(descriptor = %self.sentinel, "restored sentinel descriptor");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl<S: DescriptorStore> Drop for DescriptorGuard<S> {
    fn drop(&mut self) {
        if let Some(store) = self.store.as_mut() {
            match store.store(&self.sentinel) {
                Ok(()) => {
                    tracing::warn!(descriptor = %self.sentinel, "descriptor restored on unwind")
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to restore descriptor on unwind")
                }
            }
        }
    }
}
