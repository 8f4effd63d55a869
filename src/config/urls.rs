//! Remote service URLs

/// Artifact catalog base URL
pub const CATALOG_BASE: &str = "https://catalog.depot-project.dev/api/v1";

/// Identity service endpoint used for credential validation
pub const IDENTITY_CHECK: &str = "https://identity.depot-project.dev/api/v1/validate";
