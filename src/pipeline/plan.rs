use crate::domain::{BuildConfiguration, BumpType, VersionDescriptor};
use crate::error::Result;
use crate::services::BuildArtifacts;

/// What a release run is about to do
#[derive(Debug, Clone, PartialEq)]
pub struct ReleasePlan {
    pub configuration: BuildConfiguration,
    /// Last descriptor accepted by the distribution service
    pub remote: Option<VersionDescriptor>,
    pub bump: BumpType,
    /// Descriptor the build tool will see
    pub next: VersionDescriptor,
}

impl ReleasePlan {
    pub fn is_first_release(&self) -> bool {
        self.remote.is_none()
    }
}

/// Result of a completed release run
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseOutcome {
    pub plan: ReleasePlan,
    /// `None` for dry runs
    pub artifacts: Option<BuildArtifacts>,
    pub symbols_uploaded: bool,
}

/// Context handed to a [BumpResolver] when no bump type was given
#[derive(Debug)]
pub struct BumpRequest<'a> {
    pub configuration: &'a BuildConfiguration,
    pub remote: Option<&'a VersionDescriptor>,
    /// Bump types that would be accepted, most significant first
    pub choices: &'a [BumpType],
    /// Build number a new version line starts after
    pub first_build: u64,
}

/// Picks a bump type when the caller did not specify one
pub trait BumpResolver {
    fn resolve(&mut self, request: &BumpRequest<'_>) -> Result<BumpType>;
}

impl<F> BumpResolver for F
where
    F: FnMut(&BumpRequest<'_>) -> Result<BumpType>,
{
    fn resolve(&mut self, request: &BumpRequest<'_>) -> Result<BumpType> {
        self(request)
    }
}
