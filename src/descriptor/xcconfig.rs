use crate::descriptor::DescriptorStore;
use crate::domain::{parse_version, VersionDescriptor};
use crate::error::{ReleaseError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_VERSION_KEY: &str = "MARKETING_VERSION";
pub const DEFAULT_BUILD_KEY: &str = "CURRENT_PROJECT_VERSION";

/// Descriptor kept in an xcconfig build-settings file.
///
/// Only the version and build assignments are rewritten; every other line,
/// comments included, is preserved as is. A trailing comment on a rewritten
/// assignment stays on that line.
#[derive(Debug, Clone)]
pub struct XcconfigStore {
    path: PathBuf,
    version_key: String,
    build_key: String,
}

impl XcconfigStore {
    /// Store using the standard Xcode keys
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_keys(path, DEFAULT_VERSION_KEY, DEFAULT_BUILD_KEY)
    }

    pub fn with_keys(
        path: impl Into<PathBuf>,
        version_key: impl Into<String>,
        build_key: impl Into<String>,
    ) -> Self {
        XcconfigStore {
            path: path.into(),
            version_key: version_key.into(),
            build_key: build_key.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn find_value<'a>(&self, contents: &'a str, key: &str) -> Option<&'a str> {
        contents
            .lines()
            .filter_map(parse_assignment)
            .filter(|(k, _)| *k == key)
            .map(|(_, v)| v)
            .last()
    }
}

/// Split an xcconfig line into `(key, value)`, ignoring comments.
fn parse_assignment(line: &str) -> Option<(&str, &str)> {
    let line = match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    };
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() || key.starts_with('#') {
        return None;
    }
    Some((key, value.trim().trim_end_matches(';').trim()))
}

/// `assignment` followed by the trailing comment of `original`, if any.
fn keep_comment(original: &str, assignment: &str) -> String {
    match original.find("//") {
        Some(idx) => format!("{} {}", assignment, &original[idx..]),
        None => assignment.to_string(),
    }
}

impl DescriptorStore for XcconfigStore {
    fn load(&self) -> Result<VersionDescriptor> {
        let contents = fs::read_to_string(&self.path)?;

        let version = self.find_value(&contents, &self.version_key).ok_or_else(|| {
            ReleaseError::descriptor(format!(
                "'{}' not found in {}",
                self.version_key,
                self.path.display()
            ))
        })?;
        let build = self.find_value(&contents, &self.build_key).ok_or_else(|| {
            ReleaseError::descriptor(format!(
                "'{}' not found in {}",
                self.build_key,
                self.path.display()
            ))
        })?;

        let build = build.parse::<u64>().map_err(|_| {
            ReleaseError::descriptor(format!(
                "Invalid build number '{}' in {}",
                build,
                self.path.display()
            ))
        })?;

        Ok(VersionDescriptor::new(parse_version(version)?, build))
    }

    fn store(&mut self, descriptor: &VersionDescriptor) -> Result<()> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let version_line = format!("{} = {}", self.version_key, descriptor.version);
        let build_line = format!("{} = {}", self.build_key, descriptor.build);

        let mut wrote_version = false;
        let mut wrote_build = false;
        let mut lines: Vec<String> = Vec::new();

        for line in contents.lines() {
            match parse_assignment(line).map(|(k, _)| k) {
                Some(k) if k == self.version_key => {
                    lines.push(keep_comment(line, &version_line));
                    wrote_version = true;
                }
                Some(k) if k == self.build_key => {
                    lines.push(keep_comment(line, &build_line));
                    wrote_build = true;
                }
                _ => lines.push(line.to_string()),
            }
        }

        if !wrote_version {
            lines.push(version_line);
        }
        if !wrote_build {
            lines.push(build_line);
        }

        let mut output = lines.join("\n");
        output.push('\n');
        fs::write(&self.path, output)?;
        Ok(())
    }
}
