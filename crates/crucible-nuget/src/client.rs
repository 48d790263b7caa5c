//! Package fetching
//!
//! Provides a blocking HTTP client for NuGet v3 feeds and the
//! [`PackageSource`] seam the resolver walks through.

use crate::archive::{ArchiveError, PackageArchive};
use crate::index::ServiceIndex;
use std::io::Read;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// The canonical public feed, used when the caller passes an empty source.
pub const DEFAULT_PACKAGE_SOURCE: &str = "https://api.nuget.org/v3/index.json";

/// Maximum size for a package archive download (100 MB).
const MAX_ARCHIVE_SIZE: u64 = 100 * 1024 * 1024;

/// Errors that can occur while talking to a package feed.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status (other than not-found, which is a normal
    /// "no match" outcome)
    #[error("package source returned HTTP {status} for {url}")]
    Unavailable { status: u16, url: String },

    /// The service index does not advertise a download endpoint
    #[error("package source {0} advertises no flat-container resource")]
    NoDownloadResource(String),

    /// Downloaded archive exceeds the size bound
    #[error("package archive too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },

    /// Downloaded bytes are not a usable package archive
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// IO error while reading the response body
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where package archives come from.
///
/// `Ok(None)` means the source has no match for the coordinate, which the
/// resolver treats as "not resolvable here"; errors are transport or
/// corruption faults and abort the compile call.
pub trait PackageSource: Send + Sync {
    /// Fetch the archive for `(id, version)` into memory.
    fn fetch(&self, id: &str, version: &str) -> Result<Option<PackageArchive>, SourceError>;
}

/// Blocking client for a NuGet v3 feed.
pub struct NugetClient {
    client: reqwest::blocking::Client,
    index_url: String,
    base_address: OnceLock<String>,
}

impl NugetClient {
    /// Create a client for the given service index URL; an empty URL selects
    /// the canonical public feed.
    pub fn new(index_url: &str) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("crucible-nuget/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let index_url = if index_url.trim().is_empty() {
            DEFAULT_PACKAGE_SOURCE.to_string()
        } else {
            index_url.trim().to_string()
        };

        Ok(Self {
            client,
            index_url,
            base_address: OnceLock::new(),
        })
    }

    /// Resolve (and cache) the flat-container base URL from the service
    /// index.
    fn base_address(&self) -> Result<&str, SourceError> {
        if let Some(base) = self.base_address.get() {
            return Ok(base);
        }

        let response = self.client.get(&self.index_url).send()?;
        if !response.status().is_success() {
            return Err(SourceError::Unavailable {
                status: response.status().as_u16(),
                url: self.index_url.clone(),
            });
        }

        let index: ServiceIndex = response.json()?;
        let base = index
            .package_base_address()
            .ok_or_else(|| SourceError::NoDownloadResource(self.index_url.clone()))?
            .trim_end_matches('/')
            .to_string();

        // A concurrent caller may have raced us here; either value is the
        // same endpoint.
        let _ = self.base_address.set(base);
        Ok(self.base_address.get().expect("base address just set"))
    }

    /// Download raw nupkg bytes for a coordinate; `None` on HTTP 404.
    fn download(&self, id: &str, version: &str) -> Result<Option<Vec<u8>>, SourceError> {
        let base = self.base_address()?;
        let id = id.trim().to_ascii_lowercase();
        let version = version.trim().to_ascii_lowercase();
        let url = format!("{base}/{id}/{version}/{id}.{version}.nupkg");

        tracing::info!(%url, "downloading package archive");
        let response = self.client.get(&url).send()?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SourceError::Unavailable {
                status: status.as_u16(),
                url,
            });
        }

        if let Some(len) = response.content_length() {
            if len > MAX_ARCHIVE_SIZE {
                return Err(SourceError::TooLarge { size: len, max: MAX_ARCHIVE_SIZE });
            }
        }

        let mut bytes = Vec::new();
        response.take(MAX_ARCHIVE_SIZE + 1).read_to_end(&mut bytes)?;
        if bytes.len() as u64 > MAX_ARCHIVE_SIZE {
            return Err(SourceError::TooLarge {
                size: bytes.len() as u64,
                max: MAX_ARCHIVE_SIZE,
            });
        }

        Ok(Some(bytes))
    }
}

impl PackageSource for NugetClient {
    fn fetch(&self, id: &str, version: &str) -> Result<Option<PackageArchive>, SourceError> {
        match self.download(id, version)? {
            Some(bytes) => Ok(Some(PackageArchive::from_bytes(bytes)?)),
            None => Ok(None),
        }
    }
}
