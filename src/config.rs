use crate::descriptor::xcconfig::{DEFAULT_BUILD_KEY, DEFAULT_VERSION_KEY};
use crate::descriptor::XcconfigStore;
use crate::domain::{parse_version, BuildConfiguration, BumpType, VersionDescriptor};
use crate::error::{ReleaseError, Result};
use crate::services::command::DEFAULT_TOKEN_ENV;
use crate::services::{
    CommandBuilder, CommandCrashReporter, CommandDistributor, CommandSigner, CommandTemplate,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory and the user config directory
pub const CONFIG_FILE_NAME: &str = "release.toml";

/// Environment variable overriding `crash_reporting.access_token`
pub const TOKEN_OVERRIDE_ENV: &str = "CRASH_REPORTER_TOKEN";

/// Represents the complete configuration for app-release.
///
/// Holds the persisted descriptor location, the command templates of every
/// external collaborator and the build configurations that can be released.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub descriptor: DescriptorConfig,

    #[serde(default)]
    pub signing: SigningConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub distribution: DistributionConfig,

    #[serde(default)]
    pub crash_reporting: CrashReportingConfig,

    #[serde(default)]
    pub configurations: BTreeMap<String, ConfigurationEntry>,
}

fn default_descriptor_path() -> PathBuf {
    PathBuf::from("Config/Version.xcconfig")
}

fn default_version_key() -> String {
    DEFAULT_VERSION_KEY.to_string()
}

fn default_build_key() -> String {
    DEFAULT_BUILD_KEY.to_string()
}

fn default_first_version() -> String {
    "0.0.0".to_string()
}

/// Where the build tool reads the version from, and the sentinel it holds
/// between releases.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DescriptorConfig {
    #[serde(default = "default_descriptor_path")]
    pub path: PathBuf,

    #[serde(default = "default_version_key")]
    pub version_key: String,

    #[serde(default = "default_build_key")]
    pub build_key: String,

    #[serde(default = "default_first_version")]
    pub first_version: String,

    #[serde(default)]
    pub first_build: u64,
}

impl Default for DescriptorConfig {
    fn default() -> Self {
        DescriptorConfig {
            path: default_descriptor_path(),
            version_key: default_version_key(),
            build_key: default_build_key(),
            first_version: default_first_version(),
            first_build: 0,
        }
    }
}

impl DescriptorConfig {
    /// The sentinel descriptor `{first_version, first_build}`
    pub fn sentinel(&self) -> Result<VersionDescriptor> {
        Ok(VersionDescriptor::new(
            parse_version(&self.first_version)?,
            self.first_build,
        ))
    }

    pub fn store(&self) -> XcconfigStore {
        XcconfigStore::with_keys(&self.path, &self.version_key, &self.build_key)
    }
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

fn default_signing_command() -> Vec<String> {
    strings(&[
        "bundle",
        "exec",
        "fastlane",
        "match",
        "appstore",
        "--app_identifier",
        "{bundle_id}",
        "--readonly",
    ])
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SigningConfig {
    #[serde(default = "default_signing_command")]
    pub command: Vec<String>,
}

impl Default for SigningConfig {
    fn default() -> Self {
        SigningConfig {
            command: default_signing_command(),
        }
    }
}

fn default_build_command() -> Vec<String> {
    strings(&[
        "bundle",
        "exec",
        "fastlane",
        "gym",
        "--scheme",
        "{scheme}",
        "--output_directory",
        "build",
        "--output_name",
        "{scheme}.ipa",
    ])
}

fn default_package() -> String {
    "build/{scheme}.ipa".to_string()
}

fn default_symbols() -> Option<String> {
    Some("build/{scheme}.app.dSYM.zip".to_string())
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BuildConfig {
    #[serde(default = "default_build_command")]
    pub command: Vec<String>,

    /// Path template of the produced package
    #[serde(default = "default_package")]
    pub package: String,

    /// Path template of the debug-symbol archive
    #[serde(default = "default_symbols")]
    pub symbols: Option<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            command: default_build_command(),
            package: default_package(),
            symbols: default_symbols(),
        }
    }
}

fn default_upload_command() -> Vec<String> {
    strings(&["xcrun", "altool", "--upload-app", "-t", "ios", "-f", "{artifact}"])
}

/// Distribution service commands.
///
/// `query_command` must print `<version> <build>` for the bundle identifier,
/// or nothing if it was never uploaded. There is no default.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DistributionConfig {
    #[serde(default)]
    pub query_command: Vec<String>,

    #[serde(default = "default_upload_command")]
    pub upload_command: Vec<String>,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        DistributionConfig {
            query_command: Vec::new(),
            upload_command: default_upload_command(),
        }
    }
}

fn default_symbols_command() -> Vec<String> {
    strings(&["sentry-cli", "debug-files", "upload", "{symbols}"])
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CrashReportingConfig {
    /// Symbol upload is skipped while this is empty
    #[serde(default)]
    pub access_token: String,

    #[serde(default = "default_symbols_command")]
    pub command: Vec<String>,

    /// Variable the token is passed in to `command`
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for CrashReportingConfig {
    fn default() -> Self {
        CrashReportingConfig {
            access_token: String::new(),
            command: default_symbols_command(),
            token_env: default_token_env(),
        }
    }
}

fn default_allowed_bumps() -> Vec<BumpType> {
    BumpType::ALL.to_vec()
}

/// One `[configurations.<key>]` table
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConfigurationEntry {
    pub bundle_id: String,

    /// Build scheme; defaults to the configuration key
    #[serde(default)]
    pub scheme: Option<String>,

    #[serde(default = "default_allowed_bumps")]
    pub allowed_bumps: Vec<BumpType>,
}

impl Default for Config {
    fn default() -> Self {
        let mut configurations = BTreeMap::new();
        configurations.insert(
            "test".to_string(),
            ConfigurationEntry {
                bundle_id: "com.example.library.test".to_string(),
                scheme: Some("Library-Test".to_string()),
                allowed_bumps: default_allowed_bumps(),
            },
        );
        configurations.insert(
            "production".to_string(),
            ConfigurationEntry {
                bundle_id: "com.example.library".to_string(),
                scheme: Some("Library".to_string()),
                allowed_bumps: vec![BumpType::Major, BumpType::Minor, BumpType::Patch],
            },
        );

        Config {
            descriptor: DescriptorConfig::default(),
            signing: SigningConfig::default(),
            build: BuildConfig::default(),
            distribution: DistributionConfig::default(),
            crash_reporting: CrashReportingConfig::default(),
            configurations,
        }
    }
}

impl Config {
    /// Resolve the build configuration named `key`
    pub fn configuration(&self, key: &str) -> Result<BuildConfiguration> {
        let entry = self.configurations.get(key).ok_or_else(|| {
            let known: Vec<&str> = self.configurations.keys().map(String::as_str).collect();
            ReleaseError::config(format!(
                "Unknown build configuration '{}' (configured: {})",
                key,
                known.join(", ")
            ))
        })?;

        BuildConfiguration::new(
            key,
            &entry.bundle_id,
            entry.scheme.clone().unwrap_or_else(|| key.to_string()),
            &entry.allowed_bumps,
        )
    }

    /// Every configured build configuration, validated, sorted by key
    pub fn build_configurations(&self) -> Result<Vec<BuildConfiguration>> {
        self.configurations
            .keys()
            .map(|key| self.configuration(key))
            .collect()
    }

    /// Token for the crash reporter.
    ///
    /// `CRASH_REPORTER_TOKEN` in the environment wins over the file. Blank
    /// values count as absent.
    pub fn crash_token(&self) -> Option<String> {
        let token = std::env::var(TOKEN_OVERRIDE_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| self.crash_reporting.access_token.clone());
        let token = token.trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    pub fn signer(&self) -> CommandSigner {
        CommandSigner::new(CommandTemplate::new(self.signing.command.clone()))
    }

    pub fn builder(&self) -> CommandBuilder {
        CommandBuilder::new(
            CommandTemplate::new(self.build.command.clone()),
            self.build.package.clone(),
            self.build.symbols.clone(),
        )
    }

    pub fn distributor(&self) -> CommandDistributor {
        CommandDistributor::new(
            CommandTemplate::new(self.distribution.query_command.clone()),
            CommandTemplate::new(self.distribution.upload_command.clone()),
        )
    }

    pub fn crash_reporter(&self) -> CommandCrashReporter {
        CommandCrashReporter::new(
            CommandTemplate::new(self.crash_reporting.command.clone()),
            self.crash_reporting.token_env.clone(),
        )
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `release.toml` in current directory
/// 3. `<config dir>/app-release/release.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        fs::read_to_string(CONFIG_FILE_NAME)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join("app-release").join(CONFIG_FILE_NAME);
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            tracing::debug!("no config file found, using defaults");
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config: Config = toml::from_str(&config_str)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version;

    #[test]
    fn test_default_sentinel() {
        let sentinel = DescriptorConfig::default().sentinel().unwrap();
        assert_eq!(sentinel, VersionDescriptor::new(Version::new(0, 0, 0), 0));
    }

    #[test]
    fn test_invalid_sentinel_version() {
        let descriptor = DescriptorConfig {
            first_version: "one".to_string(),
            ..DescriptorConfig::default()
        };
        assert!(descriptor.sentinel().is_err());
    }

    #[test]
    fn test_default_configurations() {
        let config = Config::default();
        let production = config.configuration("production").unwrap();
        assert!(!production.allows(BumpType::Build));
        let test = config.configuration("test").unwrap();
        assert!(test.allows(BumpType::Build));
    }

    #[test]
    fn test_unknown_configuration() {
        let err = Config::default().configuration("staging").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("staging"));
        assert!(msg.contains("production, test"));
    }

    #[test]
    fn test_scheme_defaults_to_key() {
        let config: Config = toml::from_str(
            r#"
[configurations.beta]
bundle_id = "com.example.library.beta"
"#,
        )
        .unwrap();
        let beta = config.configuration("beta").unwrap();
        assert_eq!(beta.scheme, "beta");
        assert_eq!(beta.allowed_bumps(), &BumpType::ALL);
    }

    #[test]
    fn test_invalid_bundle_id_surfaces() {
        let config: Config = toml::from_str(
            r#"
[configurations.bad]
bundle_id = "not a bundle id"
"#,
        )
        .unwrap();
        assert!(config.build_configurations().is_err());
    }
}
