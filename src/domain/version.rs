use crate::error::{ReleaseError, Result};
use semver::{BuildMetadata, Prerelease, Version};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which part of the release number moves on a release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpType {
    Major,
    Minor,
    Patch,
    Build,
}

impl BumpType {
    /// All bump types, most significant first
    pub const ALL: [BumpType; 4] = [
        BumpType::Major,
        BumpType::Minor,
        BumpType::Patch,
        BumpType::Build,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BumpType::Major => "major",
            BumpType::Minor => "minor",
            BumpType::Patch => "patch",
            BumpType::Build => "build",
        }
    }

    /// True for bumps that change the marketing version
    pub fn is_semantic(&self) -> bool {
        !matches!(self, BumpType::Build)
    }
}

impl fmt::Display for BumpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BumpType {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" => Ok(BumpType::Major),
            "minor" => Ok(BumpType::Minor),
            "patch" => Ok(BumpType::Patch),
            "build" => Ok(BumpType::Build),
            other => Err(ReleaseError::version(format!(
                "Unknown bump type '{}' - expected major, minor, patch or build",
                other
            ))),
        }
    }
}

/// Parse a marketing version.
///
/// App store versions are frequently written with fewer than three
/// components, so `1.2` reads as `1.2.0` and `3` as `3.0.0`. A leading
/// `v` or `V` is ignored.
pub fn parse_version(input: &str) -> Result<Version> {
    let trimmed = input.trim();
    let clean = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);

    let parts: Vec<&str> = clean.split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(ReleaseError::version(format!(
            "Invalid version format: '{}' - expected X.Y.Z",
            input
        )));
    }

    let mut numbers = [0u64; 3];
    for (slot, part) in numbers.iter_mut().zip(parts.iter()) {
        *slot = part.parse::<u64>().map_err(|_| {
            ReleaseError::version(format!(
                "Invalid version component '{}' in '{}'",
                part, input
            ))
        })?;
    }

    Ok(Version::new(numbers[0], numbers[1], numbers[2]))
}

/// Apply a bump to a marketing version.
///
/// `build` leaves the version as is. Any semantic bump drops pre-release and
/// build metadata. Fails when the bumped component would overflow.
pub fn bump_version(version: &Version, bump: BumpType) -> Result<Version> {
    if !bump.is_semantic() {
        return Ok(version.clone());
    }

    let mut next = match bump {
        BumpType::Major => Version::new(increment(version.major, "major version")?, 0, 0),
        BumpType::Minor => Version::new(
            version.major,
            increment(version.minor, "minor version")?,
            0,
        ),
        _ => Version::new(
            version.major,
            version.minor,
            increment(version.patch, "patch version")?,
        ),
    };
    next.pre = Prerelease::EMPTY;
    next.build = BuildMetadata::EMPTY;
    Ok(next)
}

/// Build number for the next upload.
///
/// A `build` bump continues the remote counter; every other bump opens a new
/// version line at `first_build + 1`.
pub fn next_build_number(remote_build: u64, bump: BumpType, first_build: u64) -> Result<u64> {
    if bump.is_semantic() {
        increment(first_build, "first build number")
    } else {
        increment(remote_build, "build number")
    }
}

fn increment(value: u64, what: &str) -> Result<u64> {
    value.checked_add(1).ok_or_else(|| {
        ReleaseError::version(format!("Cannot increment {} {}: out of range", what, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_full() {
        let v = parse_version("1.2.3").unwrap();
        assert_eq!(v, Version::new(1, 2, 3));
    }

    #[test]
    fn test_parse_version_with_prefix() {
        assert_eq!(parse_version("v1.2.3").unwrap(), Version::new(1, 2, 3));
        assert_eq!(parse_version("V0.9.0").unwrap(), Version::new(0, 9, 0));
    }

    #[test]
    fn test_parse_version_short_forms() {
        assert_eq!(parse_version("1.2").unwrap(), Version::new(1, 2, 0));
        assert_eq!(parse_version("3").unwrap(), Version::new(3, 0, 0));
    }

    #[test]
    fn test_parse_version_invalid() {
        assert!(parse_version("").is_err());
        assert!(parse_version("vv1.2.3").is_err());
        assert!(parse_version("vV1.2.3").is_err());
        assert!(parse_version("1.2.3.4").is_err());
        assert!(parse_version("1.x.0").is_err());
        assert!(parse_version("1..0").is_err());
    }

    #[test]
    fn test_bump_major() {
        let v = Version::new(1, 2, 3);
        assert_eq!(bump_version(&v, BumpType::Major).unwrap(), Version::new(2, 0, 0));
    }

    #[test]
    fn test_bump_minor() {
        let v = Version::new(1, 2, 0);
        assert_eq!(bump_version(&v, BumpType::Minor).unwrap(), Version::new(1, 3, 0));
    }

    #[test]
    fn test_bump_patch() {
        let v = Version::new(1, 2, 3);
        assert_eq!(bump_version(&v, BumpType::Patch).unwrap(), Version::new(1, 2, 4));
    }

    #[test]
    fn test_bump_build_keeps_version() {
        let v = Version::new(1, 2, 0);
        assert_eq!(bump_version(&v, BumpType::Build).unwrap(), v);
    }

    #[test]
    fn test_bump_clears_prerelease() {
        let v = Version::parse("1.2.0-beta.1").unwrap();
        let bumped = bump_version(&v, BumpType::Patch).unwrap();
        assert_eq!(bumped.to_string(), "1.2.1");
    }

    #[test]
    fn test_next_build_number() {
        assert_eq!(next_build_number(5, BumpType::Build, 0).unwrap(), 6);
        assert_eq!(next_build_number(5, BumpType::Minor, 0).unwrap(), 1);
        assert_eq!(next_build_number(5, BumpType::Major, 0).unwrap(), 1);
        assert_eq!(next_build_number(5, BumpType::Patch, 10).unwrap(), 11);
    }

    #[test]
    fn test_next_build_number_overflow() {
        let err = next_build_number(u64::MAX, BumpType::Build, 0).unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert!(next_build_number(u64::MAX, BumpType::Minor, 0).is_ok());
        assert!(next_build_number(0, BumpType::Minor, u64::MAX).is_err());
    }

    #[test]
    fn test_bump_version_overflow() {
        let v = Version::new(u64::MAX, 0, 0);
        let err = bump_version(&v, BumpType::Major).unwrap_err();
        assert!(err.to_string().contains("major version"));
        assert!(bump_version(&v, BumpType::Minor).is_ok());

        let v = Version::new(1, 2, u64::MAX);
        assert!(bump_version(&v, BumpType::Patch).is_err());
        assert_eq!(bump_version(&v, BumpType::Build).unwrap(), v);
    }

    #[test]
    fn test_is_semantic() {
        assert!(BumpType::Major.is_semantic());
        assert!(BumpType::Patch.is_semantic());
        assert!(!BumpType::Build.is_semantic());
    }

    #[test]
    fn test_bump_type_from_str() {
        assert_eq!("major".parse::<BumpType>().unwrap(), BumpType::Major);
        assert_eq!("Minor".parse::<BumpType>().unwrap(), BumpType::Minor);
        assert_eq!(" PATCH ".parse::<BumpType>().unwrap(), BumpType::Patch);
        assert_eq!("build".parse::<BumpType>().unwrap(), BumpType::Build);
        assert!("hotfix".parse::<BumpType>().is_err());
    }

    #[test]
    fn test_bump_type_display() {
        for bump in BumpType::ALL {
            assert_eq!(bump.to_string().parse::<BumpType>().unwrap(), bump);
        }
    }

    #[test]
    fn test_bump_type_serde() {
        #[derive(Deserialize)]
        struct Holder {
            bumps: Vec<BumpType>,
        }
        let holder: Holder = toml::from_str(r#"bumps = ["major", "build"]"#).unwrap();
        assert_eq!(holder.bumps, vec![BumpType::Major, BumpType::Build]);
    }
}
