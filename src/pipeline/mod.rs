//! Release pipeline orchestration
//!
//! A run resolves the bump type, computes the next version/build, signs,
//! writes the next descriptor, builds, uploads debug symbols and the
//! package, and always puts the sentinel descriptor back:
//!
//! 1. [ReleasePipeline::plan]: validation and numbering, no side effects
//!    beyond querying the distribution service
//! 2. [ReleasePipeline::execute]: signing, then the guarded build/upload region
//!
//! [ReleasePipeline::run] chains both and honours dry runs.

pub mod plan;

pub use plan::{BumpRequest, BumpResolver, ReleaseOutcome, ReleasePlan};

use crate::descriptor::{DescriptorGuard, DescriptorStore};
use crate::domain::{BuildConfiguration, BumpType, VersionDescriptor};
use crate::error::{ReleaseError, Result};
use crate::services::{BuildArtifacts, Builder, CrashReporter, Distributor, Signer};
use tracing::{debug, error, info, warn};

/// Arguments of a single release run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReleaseRequest {
    /// Bump type given by the caller; resolved interactively when `None`
    pub bump: Option<BumpType>,
    /// Compute and report the plan without touching anything
    pub dry_run: bool,
}

/// The release pipeline and its collaborators
pub struct ReleasePipeline<S, B, D, C> {
    signer: S,
    builder: B,
    distributor: D,
    crash_reporter: C,
    sentinel: VersionDescriptor,
    crash_token: Option<String>,
}

impl<S, B, D, C> ReleasePipeline<S, B, D, C>
where
    S: Signer,
    B: Builder,
    D: Distributor,
    C: CrashReporter,
{
    /// Create a pipeline restoring `sentinel` after every run.
    ///
    /// Symbol upload is disabled until a token is set with
    /// [ReleasePipeline::with_crash_token].
    pub fn new(
        signer: S,
        builder: B,
        distributor: D,
        crash_reporter: C,
        sentinel: VersionDescriptor,
    ) -> Self {
        ReleasePipeline {
            signer,
            builder,
            distributor,
            crash_reporter,
            sentinel,
            crash_token: None,
        }
    }

    /// Set the crash-reporting token; blank tokens disable symbol upload
    pub fn with_crash_token(mut self, token: Option<String>) -> Self {
        self.crash_token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self
    }

    pub fn sentinel(&self) -> &VersionDescriptor {
        &self.sentinel
    }

    /// Last descriptor accepted by the distribution service
    pub fn remote_descriptor(
        &self,
        configuration: &BuildConfiguration,
    ) -> Result<Option<VersionDescriptor>> {
        self.distributor.latest_release(&configuration.bundle_id)
    }

    /// Resolve the bump type and compute the next descriptor.
    ///
    /// A requested bump is checked against the allow-list before the
    /// distribution service is contacted. The first release of a
    /// configuration must be a major bump.
    pub fn plan<R>(
        &self,
        configuration: &BuildConfiguration,
        requested: Option<BumpType>,
        resolver: &mut R,
    ) -> Result<ReleasePlan>
    where
        R: BumpResolver + ?Sized,
    {
        if let Some(bump) = requested {
            configuration.check_bump(bump)?;
        }

        let remote = self.remote_descriptor(configuration)?;
        match &remote {
            Some(descriptor) => info!(
                configuration = %configuration.key,
                remote = %descriptor,
                "found remote release"
            ),
            None => info!(configuration = %configuration.key, "no remote release yet"),
        }

        let bump = match requested {
            Some(bump) => bump,
            None => {
                let choices: Vec<BumpType> = configuration
                    .allowed_bumps()
                    .iter()
                    .copied()
                    .filter(|b| remote.is_some() || *b == BumpType::Major)
                    .collect();
                if choices.is_empty() {
                    return Err(first_release_error(configuration));
                }
                resolver.resolve(&BumpRequest {
                    configuration,
                    remote: remote.as_ref(),
                    choices: &choices,
                    first_build: self.sentinel.build,
                })?
            }
        };

        configuration.check_bump(bump)?;
        if remote.is_none() && bump != BumpType::Major {
            return Err(first_release_error(configuration));
        }

        let base = remote.clone().unwrap_or_else(|| self.sentinel.clone());
        let next = base.next(bump, self.sentinel.build)?;
        debug!(%bump, %next, "computed next descriptor");

        Ok(ReleasePlan {
            configuration: configuration.clone(),
            remote,
            bump,
            next,
        })
    }

    /// Sign, then build and upload with the next descriptor in place.
    ///
    /// The sentinel is written back whatever happens between acquiring the
    /// descriptor and returning. An error from the build or upload steps
    /// is returned after restoration, even if restoration itself failed.
    pub fn execute<T>(&self, store: &mut T, plan: ReleasePlan) -> Result<ReleaseOutcome>
    where
        T: DescriptorStore + ?Sized,
    {
        let configuration = &plan.configuration;

        info!(bundle_id = %configuration.bundle_id, "fetching signing credentials");
        let credentials = self.signer.fetch_credentials(configuration)?;
        configuration.check_bundle_id(&credentials.bundle_id)?;

        match store.load() {
            Ok(current) if current == self.sentinel => {}
            Ok(current) => warn!(
                %current,
                sentinel = %self.sentinel,
                "persisted descriptor was not at the sentinel before release"
            ),
            Err(e) => warn!(error = %e, "could not read persisted descriptor"),
        }

        let guard = DescriptorGuard::acquire(&mut *store, &plan.next, self.sentinel.clone())?;
        let result = self.build_and_upload(&plan);
        let restored = guard.restore();

        match (result, restored) {
            (Ok((artifacts, symbols_uploaded)), Ok(())) => {
                info!(descriptor = %plan.next, "release uploaded");
                Ok(ReleaseOutcome {
                    plan,
                    artifacts: Some(artifacts),
                    symbols_uploaded,
                })
            }
            (Ok(_), Err(restore_err)) => Err(restore_err),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(restore_err)) => {
                error!(error = %restore_err, "failed to restore descriptor after failed release");
                Err(e)
            }
        }
    }

    /// [ReleasePipeline::plan] followed by [ReleasePipeline::execute], unless
    /// the request is a dry run
    pub fn run<T, R>(
        &self,
        store: &mut T,
        configuration: &BuildConfiguration,
        request: ReleaseRequest,
        resolver: &mut R,
    ) -> Result<ReleaseOutcome>
    where
        T: DescriptorStore + ?Sized,
        R: BumpResolver + ?Sized,
    {
        let plan = self.plan(configuration, request.bump, resolver)?;
        if request.dry_run {
            info!(descriptor = %plan.next, "dry run, nothing executed");
            return Ok(ReleaseOutcome {
                plan,
                artifacts: None,
                symbols_uploaded: false,
            });
        }
        self.execute(store, plan)
    }

    fn build_and_upload(&self, plan: &ReleasePlan) -> Result<(BuildArtifacts, bool)> {
        let configuration = &plan.configuration;

        info!(scheme = %configuration.scheme, descriptor = %plan.next, "building");
        let artifacts = self.builder.build(configuration, &plan.next)?;

        let mut symbols_uploaded = false;
        match (&self.crash_token, &artifacts.symbols) {
            (Some(token), Some(symbols)) => {
                info!(path = %symbols.display(), "uploading debug symbols");
                self.crash_reporter.upload_symbols(token, symbols)?;
                symbols_uploaded = true;
            }
            (Some(_), None) => warn!("build produced no debug symbols to upload"),
            (None, _) => debug!("no crash reporting token, skipping symbol upload"),
        }

        info!(package = %artifacts.package.display(), "uploading package");
        self.distributor.upload(configuration, &artifacts)?;

        Ok((artifacts, symbols_uploaded))
    }
}

fn first_release_error(configuration: &BuildConfiguration) -> ReleaseError {
    ReleaseError::config(format!(
        "First release of '{}' must be a major bump",
        configuration.key
    ))
}

/// Put the sentinel back into `store`, e.g. after an aborted process
pub fn reset<T>(store: &mut T, sentinel: &VersionDescriptor) -> Result<()>
where
    T: DescriptorStore + ?Sized,
{
    store.store(sentinel)?;
    info!(descriptor = %sentinel, "descriptor reset to sentinel");
    Ok(())
}

/// Resolver for non-interactive use: fails when no bump type was given
pub fn require_explicit_bump(request: &BumpRequest<'_>) -> Result<BumpType> {
    let choices: Vec<&str> = request.choices.iter().map(|b| b.as_str()).collect();
    Err(ReleaseError::config(format!(
        "No bump type given for '{}' (choose one of: {})",
        request.configuration.key,
        choices.join(", ")
    )))
}
