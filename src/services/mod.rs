//! External collaborators of the release pipeline
//!
//! Every service the pipeline talks to sits behind its own trait so each can
//! be replaced independently:
//!
//! - [Signer]: code-signing / provisioning authority
//! - [Builder]: the build tool producing the app package
//! - [Distributor]: the distribution service (remote descriptor, uploads)
//! - [CrashReporter]: the crash-symbol store
//!
//! [command] holds the process-backed implementations used by the CLI and
//! [mock] holds recording doubles for tests.

pub mod command;
pub mod mock;

pub use command::{
    CommandBuilder, CommandCrashReporter, CommandDistributor, CommandSigner, CommandTemplate,
    TemplateVars,
};

use crate::domain::{BuildConfiguration, VersionDescriptor};
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Credentials handed out by the signing authority
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningCredentials {
    /// Bundle identifier the profile was issued for
    pub bundle_id: String,
    /// Provisioning profile name, if the authority reported one
    pub profile: Option<String>,
}

/// Output of a successful build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifacts {
    /// The app package to upload
    pub package: PathBuf,
    /// Debug-symbol archive, when the build produced one
    pub symbols: Option<PathBuf>,
}

pub trait Signer {
    /// Obtain signing credentials for `configuration`
    fn fetch_credentials(&self, configuration: &BuildConfiguration) -> Result<SigningCredentials>;
}

pub trait Builder {
    /// Build `configuration`; `descriptor` is what the build tool will read
    fn build(
        &self,
        configuration: &BuildConfiguration,
        descriptor: &VersionDescriptor,
    ) -> Result<BuildArtifacts>;
}

pub trait Distributor {
    /// Last version/build accepted for `bundle_id`, `None` if nothing was
    /// ever uploaded
    fn latest_release(&self, bundle_id: &str) -> Result<Option<VersionDescriptor>>;

    /// Upload a built package
    fn upload(&self, configuration: &BuildConfiguration, artifacts: &BuildArtifacts) -> Result<()>;
}

pub trait CrashReporter {
    /// Upload a debug-symbol archive using `token`
    fn upload_symbols(&self, token: &str, symbols: &Path) -> Result<()>;
}
