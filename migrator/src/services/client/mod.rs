// Management-plane client for the migration engine
//
// This module provides:
// - The versioned API catalog and chronological version ordering
// - The ManagementApi collaborator trait and its HTTPS implementation
// - Credential resolution with per-run caching
// - Explicit domain contexts for every remote call

pub mod api;
pub mod context;
pub mod credentials;
pub mod errors;
pub mod management_client;
pub mod traits;
pub mod types;
pub mod versions;

pub use types::{
    AuthorizeCopyRequest, Credential, ListResourcesResponse, OperationHandle, OperationStatus,
    ProviderError, ProviderErrorBody, ResourceSummary, ServiceInstance, TransferAuthorization,
};

pub use errors::{ClientError, ClientResult};

pub use context::{ActiveContext, ContextSwitcher, SessionContextSwitcher};
pub use credentials::{
    CachedCredentialResolver, CredentialResolver, KeySource, StaticCredentialResolver,
};
pub use management_client::HttpManagementClient;
pub use traits::ManagementApi;
pub use versions::{
    default_catalog, ApiVersion, ApiVersionCapability, OperationKind, VersionCatalog,
    VersionParseError,
};
