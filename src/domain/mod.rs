//! Domain logic - pure release-numbering rules independent of any service

pub mod configuration;
pub mod descriptor;
pub mod version;

pub use configuration::BuildConfiguration;
pub use descriptor::VersionDescriptor;
pub use version::{bump_version, next_build_number, parse_version, BumpType};
