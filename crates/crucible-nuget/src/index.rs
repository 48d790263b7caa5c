//! NuGet v3 service index types
//!
//! Response types for the feed's entry-point document, which maps resource
//! types to endpoint URLs.

use serde::Deserialize;

/// The resource type that serves flat-container package downloads.
pub const PACKAGE_BASE_ADDRESS: &str = "PackageBaseAddress/3.0.0";

/// Service index document.
///
/// Response from `GET {index_url}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceIndex {
    /// Advertised resources.
    pub resources: Vec<ServiceResource>,
}

/// A single advertised resource.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceResource {
    /// Endpoint base URL.
    #[serde(rename = "@id")]
    pub id: String,

    /// Resource type tag, e.g. `PackageBaseAddress/3.0.0`.
    #[serde(rename = "@type")]
    pub resource_type: String,
}

impl ServiceIndex {
    /// Locate the flat-container base URL. Exact type match wins; a
    /// versioned successor (`PackageBaseAddress/...`) is accepted as a
    /// fallback.
    pub fn package_base_address(&self) -> Option<&str> {
        self.resources
            .iter()
            .find(|r| r.resource_type == PACKAGE_BASE_ADDRESS)
            .or_else(|| {
                self.resources
                    .iter()
                    .find(|r| r.resource_type.starts_with("PackageBaseAddress/"))
            })
            .map(|r| r.id.as_str())
    }
}
