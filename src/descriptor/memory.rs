use crate::descriptor::DescriptorStore;
use crate::domain::VersionDescriptor;
use crate::error::{ReleaseError, Result};

/// In-memory descriptor store that keeps every value written to it
#[derive(Debug, Clone)]
pub struct MemoryStore {
    current: VersionDescriptor,
    writes: Vec<VersionDescriptor>,
    fail_writes: bool,
}

impl MemoryStore {
    /// Create a store holding `initial`
    pub fn new(initial: VersionDescriptor) -> Self {
        MemoryStore {
            current: initial,
            writes: Vec::new(),
            fail_writes: false,
        }
    }

    /// Make every subsequent write fail
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Values written so far, oldest first
    pub fn writes(&self) -> &[VersionDescriptor] {
        &self.writes
    }

    pub fn current(&self) -> &VersionDescriptor {
        &self.current
    }
}

impl DescriptorStore for MemoryStore {
    fn load(&self) -> Result<VersionDescriptor> {
        Ok(self.current.clone())
    }

    fn store(&mut self, descriptor: &VersionDescriptor) -> Result<()> {
        if self.fail_writes {
            return Err(ReleaseError::descriptor("memory store is read-only"));
        }
        self.current = descriptor.clone();
        self.writes.push(descriptor.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version;

    #[test]
    fn test_memory_store_records_writes() {
        let mut store = MemoryStore::new(VersionDescriptor::new(Version::new(0, 0, 0), 0));
        let next = VersionDescriptor::new(Version::new(1, 0, 0), 1);

        store.store(&next).unwrap();

        assert_eq!(store.load().unwrap(), next);
        assert_eq!(store.writes(), &[next]);
    }

    #[test]
    fn test_memory_store_failing_writes() {
        let initial = VersionDescriptor::new(Version::new(0, 0, 0), 0);
        let mut store = MemoryStore::new(initial.clone());
        store.fail_writes(true);

        assert!(store
            .store(&VersionDescriptor::new(Version::new(1, 0, 0), 1))
            .is_err());
        assert_eq!(store.current(), &initial);
        assert!(store.writes().is_empty());
    }
}
