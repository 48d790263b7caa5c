//! NuGet package reference resolution for the Crucible script compiler
//!
//! This crate turns symbolic package references (`"Newtonsoft.Json,13.0.1"`)
//! into an ordered list of module references a compiler backend can consume:
//! - Package coordinate parsing (`id,version[,framework]`)
//! - Framework moniker normalization and asset-folder selection
//! - Package archive (.nupkg) reading and manifest (.nuspec) parsing
//! - NuGet v3 flat-container downloads
//! - Transitive dependency walking with extraction into a caller-owned
//!   staging directory

pub mod archive;
pub mod client;
pub mod coordinate;
pub mod framework;
pub mod index;
pub mod nuspec;
pub mod resolver;
pub mod runtime;

pub use archive::{ArchiveError, PackageArchive};
pub use client::{NugetClient, PackageSource, SourceError, DEFAULT_PACKAGE_SOURCE};
pub use coordinate::PackageCoordinate;
pub use framework::{select_framework, FrameworkMoniker};
pub use nuspec::{DependencyGroup, Nuspec, NuspecError, PackageDependency};
pub use resolver::{Reference, ReferenceResolver, ResolveError};
pub use runtime::is_provided_by_runtime;
