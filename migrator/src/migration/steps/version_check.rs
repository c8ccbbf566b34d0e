//! VersionCheck: refuse models newer than the destination understands

use crate::migration::types::ResourceDescriptor;
use crate::services::client::ApiVersion;
use crate::services::errors::{MigrationError, MigrationResult};

pub fn check_version(
    resource: &ResourceDescriptor,
    destination_best: &ApiVersion,
) -> MigrationResult<()> {
    if resource.source_version().is_newer_than(destination_best) {
        return Err(MigrationError::VersionIncompatible {
            resource_id: resource.resource_id().to_string(),
            source_version: resource.source_version().to_string(),
            destination_version: destination_best.to_string(),
        });
    }
    Ok(())
}
