//! Persisted version descriptor storage
//!
//! The build tool reads the marketing version and build number from a
//! build-settings file. Release runs write the next descriptor into that
//! file for the duration of a build and put the sentinel back afterwards.
//!
//! - [xcconfig::XcconfigStore]: the real file-backed store
//! - [memory::MemoryStore]: an in-memory store that records every write
//! - [guard::DescriptorGuard]: scoped mutation that always restores the sentinel

pub mod guard;
pub mod memory;
pub mod xcconfig;

pub use guard::DescriptorGuard;
pub use memory::MemoryStore;
pub use xcconfig::XcconfigStore;

use crate::domain::VersionDescriptor;
use crate::error::Result;

/// Read/write access to the persisted descriptor
pub trait DescriptorStore {
    /// Read the descriptor currently recorded
    fn load(&self) -> Result<VersionDescriptor>;

    /// Replace the recorded descriptor
    fn store(&mut self, descriptor: &VersionDescriptor) -> Result<()>;
}

impl<T: DescriptorStore + ?Sized> DescriptorStore for &mut T {
    fn load(&self) -> Result<VersionDescriptor> {
        (**self).load()
    }

    fn store(&mut self, descriptor: &VersionDescriptor) -> Result<()> {
        (**self).store(descriptor)
    }
}
