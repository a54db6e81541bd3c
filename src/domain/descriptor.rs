use crate::domain::version::{bump_version, next_build_number, BumpType};
use crate::error::Result;
use semver::Version;
use std::fmt;

/// Version and build number pair, as seen by the build tool or the
/// distribution service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDescriptor {
    pub version: Version,
    pub build: u64,
}

impl VersionDescriptor {
    pub fn new(version: Version, build: u64) -> Self {
        VersionDescriptor { version, build }
    }

    /// Descriptor of the next upload after `self`, with `first_build` as the
    /// base of a fresh version line. Fails when a counter would overflow.
    pub fn next(&self, bump: BumpType, first_build: u64) -> Result<Self> {
        Ok(VersionDescriptor {
            version: bump_version(&self.version, bump)?,
            build: next_build_number(self.build, bump, first_build)?,
        })
    }
}

impl fmt::Display for VersionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.version, self.build)
    }
}
