use crate::domain::version::BumpType;
use crate::error::{ReleaseError, Result};
use regex::Regex;
use std::sync::OnceLock;

fn bundle_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)+$").expect("bundle id pattern is valid")
    })
}

/// A deployment target (e.g. internal test, production) with its own bundle
/// identifier and the bump types it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfiguration {
    pub key: String,
    pub bundle_id: String,
    pub scheme: String,
    allowed_bumps: Vec<BumpType>,
}

impl BuildConfiguration {
    /// Create a validated build configuration
    ///
    /// # Returns
    /// * `Err` - if the bundle identifier is not reverse-DNS, or no bump
    ///   type is allowed
    pub fn new(
        key: impl Into<String>,
        bundle_id: impl Into<String>,
        scheme: impl Into<String>,
        allowed_bumps: &[BumpType],
    ) -> Result<Self> {
        let key = key.into();
        let bundle_id = bundle_id.into();

        if !bundle_id_pattern().is_match(&bundle_id) {
            return Err(ReleaseError::config(format!(
                "Configuration '{}' has invalid bundle identifier '{}'",
                key, bundle_id
            )));
        }

        let mut bumps = allowed_bumps.to_vec();
        bumps.sort();
        bumps.dedup();
        if bumps.is_empty() {
            return Err(ReleaseError::config(format!(
                "Configuration '{}' allows no bump types",
                key
            )));
        }

        Ok(BuildConfiguration {
            key,
            bundle_id,
            scheme: scheme.into(),
            allowed_bumps: bumps,
        })
    }

    /// Allowed bump types, most significant first
    pub fn allowed_bumps(&self) -> &[BumpType] {
        &self.allowed_bumps
    }

    pub fn allows(&self, bump: BumpType) -> bool {
        self.allowed_bumps.contains(&bump)
    }

    /// Fail unless `bump` is on this configuration's allow-list
    pub fn check_bump(&self, bump: BumpType) -> Result<()> {
        if self.allows(bump) {
            return Ok(());
        }
        let allowed: Vec<&str> = self.allowed_bumps.iter().map(|b| b.as_str()).collect();
        Err(ReleaseError::config(format!(
            "Bump type '{}' is not allowed for configuration '{}' (allowed: {})",
            bump,
            self.key,
            allowed.join(", ")
        )))
    }

    /// Fail unless `bundle_id` is the one this configuration ships under
    pub fn check_bundle_id(&self, bundle_id: &str) -> Result<()> {
        if bundle_id == self.bundle_id {
            Ok(())
        } else {
            Err(ReleaseError::config(format!(
                "Bundle identifier mismatch for configuration '{}': expected '{}', got '{}'",
                self.key, self.bundle_id, bundle_id
            )))
        }
    }
}
