use crate::domain::{BuildConfiguration, VersionDescriptor};
use crate::error::{ReleaseError, Result};
use crate::services::{
    BuildArtifacts, Builder, CrashReporter, Distributor, Signer, SigningCredentials,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Ordered record of calls shared between mock services
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: impl Into<String>) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.into());
        }
    }

    /// Snapshot of the calls recorded so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

/// Mock signing authority
pub struct MockSigner {
    log: CallLog,
    bundle_id: Option<String>,
    fail: bool,
}

impl MockSigner {
    /// Signer issuing credentials for whatever configuration asks
    pub fn new(log: CallLog) -> Self {
        MockSigner {
            log,
            bundle_id: None,
            fail: false,
        }
    }

    /// Always issue credentials for `bundle_id`
    pub fn issuing_for(mut self, bundle_id: impl Into<String>) -> Self {
        self.bundle_id = Some(bundle_id.into());
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl Signer for MockSigner {
    fn fetch_credentials(&self, configuration: &BuildConfiguration) -> Result<SigningCredentials> {
        self.log.record(format!("sign {}", configuration.bundle_id));
        if self.fail {
            return Err(ReleaseError::service("signer", "certificate expired"));
        }
        Ok(SigningCredentials {
            bundle_id: self
                .bundle_id
                .clone()
                .unwrap_or_else(|| configuration.bundle_id.clone()),
            profile: Some("mock AppStore".to_string()),
        })
    }
}

/// Mock build tool
pub struct MockBuilder {
    log: CallLog,
    symbols: bool,
    fail: bool,
    panic: bool,
}

impl MockBuilder {
    /// Builder producing a package and a symbol archive
    pub fn new(log: CallLog) -> Self {
        MockBuilder {
            log,
            symbols: true,
            fail: false,
            panic: false,
        }
    }

    pub fn without_symbols(mut self) -> Self {
        self.symbols = false;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Panic mid-build, as an aborting build step would
    pub fn panicking(mut self) -> Self {
        self.panic = true;
        self
    }
}

impl Builder for MockBuilder {
    fn build(
        &self,
        configuration: &BuildConfiguration,
        descriptor: &VersionDescriptor,
    ) -> Result<BuildArtifacts> {
        self.log
            .record(format!("build {} {}", configuration.scheme, descriptor));
        if self.panic {
            panic!("build step aborted");
        }
        if self.fail {
            return Err(ReleaseError::service("builder", "exit code 65"));
        }
        Ok(BuildArtifacts {
            package: PathBuf::from(format!("build/{}.ipa", configuration.scheme)),
            symbols: self
                .symbols
                .then(|| PathBuf::from(format!("build/{}.app.dSYM.zip", configuration.scheme))),
        })
    }
}

/// Mock distribution service
pub struct MockDistributor {
    log: CallLog,
    latest: Option<VersionDescriptor>,
    fail_query: bool,
    fail_upload: bool,
}

impl MockDistributor {
    /// Distributor that has never seen an upload
    pub fn new(log: CallLog) -> Self {
        MockDistributor {
            log,
            latest: None,
            fail_query: false,
            fail_upload: false,
        }
    }

    pub fn with_latest(mut self, latest: VersionDescriptor) -> Self {
        self.latest = Some(latest);
        self
    }

    pub fn failing_query(mut self) -> Self {
        self.fail_query = true;
        self
    }

    pub fn failing_upload(mut self) -> Self {
        self.fail_upload = true;
        self
    }
}

impl Distributor for MockDistributor {
    fn latest_release(&self, bundle_id: &str) -> Result<Option<VersionDescriptor>> {
        self.log.record(format!("query {}", bundle_id));
        if self.fail_query {
            return Err(ReleaseError::service("distributor", "service unavailable"));
        }
        Ok(self.latest.clone())
    }

    fn upload(&self, _configuration: &BuildConfiguration, artifacts: &BuildArtifacts) -> Result<()> {
        self.log
            .record(format!("upload {}", artifacts.package.display()));
        if self.fail_upload {
            return Err(ReleaseError::service("distributor", "upload rejected"));
        }
        Ok(())
    }
}

/// Mock crash-symbol store
pub struct MockCrashReporter {
    log: CallLog,
    fail: bool,
}

impl MockCrashReporter {
    pub fn new(log: CallLog) -> Self {
        MockCrashReporter { log, fail: false }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl CrashReporter for MockCrashReporter {
    fn upload_symbols(&self, _token: &str, symbols: &Path) -> Result<()> {
        self.log.record(format!("symbols {}", symbols.display()));
        if self.fail {
            return Err(ReleaseError::service("crash reporter", "invalid token"));
        }
        Ok(())
    }
}
