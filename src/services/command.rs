use crate::domain::{parse_version, BuildConfiguration, VersionDescriptor};
use crate::error::{ReleaseError, Result};
use crate::services::{
    BuildArtifacts, Builder, CrashReporter, Distributor, Signer, SigningCredentials,
};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::OnceLock;

/// Default environment variable carrying the crash-reporting token to the
/// upload process
pub const DEFAULT_TOKEN_ENV: &str = "SENTRY_AUTH_TOKEN";

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{(bundle_id|scheme|configuration|version|build|artifact|symbols)\}")
            .expect("placeholder pattern is valid")
    })
}

/// Values substituted into command templates
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    pairs: Vec<(&'static str, String)>,
}

impl TemplateVars {
    /// Variables describing a build configuration
    pub fn for_configuration(configuration: &BuildConfiguration) -> Self {
        TemplateVars::default()
            .with("bundle_id", &configuration.bundle_id)
            .with("scheme", &configuration.scheme)
            .with("configuration", &configuration.key)
    }

    pub fn with(mut self, name: &'static str, value: impl ToString) -> Self {
        self.pairs.retain(|(k, _)| *k != name);
        self.pairs.push((name, value.to_string()));
        self
    }

    pub fn with_descriptor(self, descriptor: &VersionDescriptor) -> Self {
        self.with("version", &descriptor.version)
            .with("build", descriptor.build)
    }

    /// Substitute every known placeholder in `input`.
    ///
    /// A placeholder with no value is an error rather than being passed
    /// through literally.
    pub fn render(&self, input: &str) -> Result<String> {
        let mut rendered = input.to_string();
        for (name, value) in &self.pairs {
            rendered = rendered.replace(&format!("{{{}}}", name), value);
        }
        if let Some(m) = placeholder_pattern().find(&rendered) {
            return Err(ReleaseError::config(format!(
                "No value for placeholder {} in '{}'",
                m.as_str(),
                input
            )));
        }
        Ok(rendered)
    }
}

/// Program and arguments with `{placeholder}` substitution
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandTemplate {
    args: Vec<String>,
}

impl CommandTemplate {
    pub fn new<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        CommandTemplate {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Render every argument with `vars`
    pub fn render(&self, vars: &TemplateVars) -> Result<Vec<String>> {
        self.args.iter().map(|arg| vars.render(arg)).collect()
    }

    /// Render and run the command, failing on a non-zero exit status.
    ///
    /// # Arguments
    /// * `service` - collaborator name used in error messages
    /// * `vars` - placeholder values
    /// * `envs` - extra environment variables for the child process
    pub fn run(&self, service: &str, vars: &TemplateVars, envs: &[(&str, &str)]) -> Result<Output> {
        if self.is_empty() {
            return Err(ReleaseError::config(format!(
                "No command configured for {}",
                service
            )));
        }

        let args = self.render(vars)?;
        tracing::debug!(service, command = %args.join(" "), "running command");

        let mut cmd = Command::new(&args[0]);
        cmd.args(&args[1..]);
        for (key, value) in envs {
            cmd.env(key, value);
        }

        let output = cmd.output().map_err(|e| {
            ReleaseError::service(service, format!("could not start '{}': {}", args[0], e))
        })?;

        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReleaseError::service(
                service,
                format!(
                    "exit code {}\nStdout: {}\nStderr: {}",
                    output.status.code().unwrap_or(-1),
                    stdout.trim_end(),
                    stderr.trim_end()
                ),
            ));
        }

        Ok(output)
    }
}

/// Signing authority driven by an external command.
///
/// Stdout lines of the form `bundle_id=...` and `profile=...` are read back
/// as the issued credentials. Without a `bundle_id` line the credentials are
/// assumed to be for the requested configuration.
#[derive(Debug, Clone)]
pub struct CommandSigner {
    command: CommandTemplate,
}

impl CommandSigner {
    pub fn new(command: CommandTemplate) -> Self {
        CommandSigner { command }
    }
}

fn parse_credentials(stdout: &str, fallback_bundle_id: &str) -> SigningCredentials {
    let mut bundle_id = None;
    let mut profile = None;
    for line in stdout.lines() {
        if let Some((key, value)) = line.trim().split_once('=') {
            match key.trim() {
                "bundle_id" => bundle_id = Some(value.trim().to_string()),
                "profile" => profile = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }
    SigningCredentials {
        bundle_id: bundle_id.unwrap_or_else(|| fallback_bundle_id.to_string()),
        profile,
    }
}

impl Signer for CommandSigner {
    fn fetch_credentials(&self, configuration: &BuildConfiguration) -> Result<SigningCredentials> {
        let vars = TemplateVars::for_configuration(configuration);
        let output = self.command.run("signer", &vars, &[])?;
        Ok(parse_credentials(
            &String::from_utf8_lossy(&output.stdout),
            &configuration.bundle_id,
        ))
    }
}

/// Build tool driven by an external command
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    command: CommandTemplate,
    package: String,
    symbols: Option<String>,
}

impl CommandBuilder {
    /// # Arguments
    /// * `command` - build command template
    /// * `package` - path template of the produced package
    /// * `symbols` - path template of the debug-symbol archive, if any
    pub fn new(command: CommandTemplate, package: impl Into<String>, symbols: Option<String>) -> Self {
        CommandBuilder {
            command,
            package: package.into(),
            symbols,
        }
    }
}

impl Builder for CommandBuilder {
    fn build(
        &self,
        configuration: &BuildConfiguration,
        descriptor: &VersionDescriptor,
    ) -> Result<BuildArtifacts> {
        let vars = TemplateVars::for_configuration(configuration).with_descriptor(descriptor);
        self.command.run("builder", &vars, &[])?;

        let package = PathBuf::from(vars.render(&self.package)?);
        if !package.exists() {
            return Err(ReleaseError::service(
                "builder",
                format!("package not found at {}", package.display()),
            ));
        }

        let symbols = match &self.symbols {
            Some(template) => {
                let path = PathBuf::from(vars.render(template)?);
                if path.exists() {
                    Some(path)
                } else {
                    tracing::warn!(path = %path.display(), "debug symbols not produced");
                    None
                }
            }
            None => None,
        };

        Ok(BuildArtifacts { package, symbols })
    }
}

/// Distribution service driven by external commands
#[derive(Debug, Clone)]
pub struct CommandDistributor {
    query: CommandTemplate,
    upload: CommandTemplate,
}

impl CommandDistributor {
    pub fn new(query: CommandTemplate, upload: CommandTemplate) -> Self {
        CommandDistributor { query, upload }
    }
}

/// Parse `<version> <build>` as printed by the query command; empty output
/// means nothing has been uploaded yet.
pub fn parse_latest_release(stdout: &str) -> Result<Option<VersionDescriptor>> {
    let tokens: Vec<&str> = stdout.split_whitespace().collect();
    match tokens.as_slice() {
        [] => Ok(None),
        [version, build] => {
            let build = build.parse::<u64>().map_err(|_| {
                ReleaseError::service(
                    "distributor",
                    format!("invalid build number '{}' in query output", build),
                )
            })?;
            Ok(Some(VersionDescriptor::new(parse_version(version)?, build)))
        }
        _ => Err(ReleaseError::service(
            "distributor",
            format!("unexpected query output '{}'", stdout.trim()),
        )),
    }
}

impl Distributor for CommandDistributor {
    fn latest_release(&self, bundle_id: &str) -> Result<Option<VersionDescriptor>> {
        let vars = TemplateVars::default().with("bundle_id", bundle_id);
        let output = self.query.run("distributor", &vars, &[])?;
        parse_latest_release(&String::from_utf8_lossy(&output.stdout))
    }

    fn upload(&self, configuration: &BuildConfiguration, artifacts: &BuildArtifacts) -> Result<()> {
        let vars = TemplateVars::for_configuration(configuration)
            .with("artifact", artifacts.package.display());
        self.upload.run("distributor", &vars, &[])?;
        Ok(())
    }
}

/// Crash-symbol store driven by an external command.
///
/// The token travels in an environment variable so it never shows up in the
/// process list or in logged command lines.
#[derive(Debug, Clone)]
pub struct CommandCrashReporter {
    command: CommandTemplate,
    token_env: String,
}

impl CommandCrashReporter {
    pub fn new(command: CommandTemplate, token_env: impl Into<String>) -> Self {
        CommandCrashReporter {
            command,
            token_env: token_env.into(),
        }
    }
}

impl CrashReporter for CommandCrashReporter {
    fn upload_symbols(&self, token: &str, symbols: &Path) -> Result<()> {
        let vars = TemplateVars::default().with("symbols", symbols.display());
        self.command
            .run("crash reporter", &vars, &[(self.token_env.as_str(), token)])?;
        Ok(())
    }
}
