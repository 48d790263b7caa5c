//! Reference set building
//!
//! The resolver maintains the ordered reference list handed to the compile
//! step and drives the transitive package walk: fetch the archive, pick a
//! framework, stage the framework's binaries into the caller's temp
//! directory, then recurse into declared dependencies.

use crate::archive::ArchiveError;
use crate::client::{PackageSource, SourceError};
use crate::coordinate::PackageCoordinate;
use crate::framework::{select_framework, FrameworkMoniker};
use crate::runtime::is_provided_by_runtime;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while building the reference set.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A top-level package reference could not be fetched, parsed, or
    /// matched to a framework
    #[error("cannot resolve package reference `{coordinate}` (argument: package_references)")]
    UnresolvablePackage { coordinate: String },

    /// Feed transport or protocol fault
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Archive corruption or extraction fault
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// IO error while staging assets
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single module reference for the compile step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// A module the host runtime provides; the compiler resolves the bare
    /// file name against its runtime reference path.
    Runtime(String),

    /// A module file on local disk (extracted from a package or supplied by
    /// the caller).
    File(PathBuf),
}

impl Reference {
    /// Leaf file name of the referenced module.
    pub fn file_name(&self) -> &str {
        match self {
            Reference::Runtime(name) => name,
            Reference::File(path) => path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default(),
        }
    }
}

/// Ordered reference list with duplicate suppression, plus the transitive
/// package walk that fills it.
///
/// Insertion order is the depth-first pre-order of the walk: caller-supplied
/// assemblies first, then each package's own assets before the assets of its
/// dependencies. Duplicate file names are suppressed, first occurrence wins.
pub struct ReferenceResolver<'a> {
    source: &'a dyn PackageSource,
    references: Vec<Reference>,
    seen_names: HashSet<String>,
    in_flight: HashSet<(String, String)>,
    resolved_ids: HashSet<String>,
}

impl<'a> ReferenceResolver<'a> {
    /// Create a resolver that fetches archives from `source`.
    pub fn new(source: &'a dyn PackageSource) -> Self {
        Self {
            source,
            references: Vec::new(),
            seen_names: HashSet::new(),
            in_flight: HashSet::new(),
            resolved_ids: HashSet::new(),
        }
    }

    /// Normalize and insert caller-supplied precompiled references.
    ///
    /// A string containing a comma is treated as a strong-name-like token:
    /// everything before the first comma plus `.dll` becomes the file
    /// reference. Anything else is a filesystem path used verbatim.
    pub fn add_local_assemblies<I, S>(&mut self, assemblies: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for assembly in assemblies {
            let assembly = assembly.as_ref();
            let path = match assembly.split_once(',') {
                Some((name, _)) => PathBuf::from(format!("{}.dll", name.trim())),
                None => PathBuf::from(assembly),
            };
            self.push_reference(Reference::File(path));
        }
    }

    /// Resolve each package coordinate and its transitive dependencies into
    /// the reference set, staging binaries under `temp_dir`.
    ///
    /// The first top-level coordinate that cannot be resolved fails the call.
    pub fn add_packages<I, S>(&mut self, packages: I, temp_dir: &Path) -> Result<(), ResolveError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for package in packages {
            let coordinate = package.as_ref();
            if !self.resolve_package(coordinate, temp_dir)? {
                return Err(ResolveError::UnresolvablePackage {
                    coordinate: coordinate.to_string(),
                });
            }
        }
        Ok(())
    }

    /// The accumulated, ordered reference list.
    pub fn into_references(self) -> Vec<Reference> {
        self.references
    }

    /// Resolve one coordinate string. `Ok(false)` means "not resolvable";
    /// the caller decides whether that is fatal (top level) or retryable
    /// (dependency with a framework pin).
    fn resolve_package(&mut self, coordinate: &str, temp_dir: &Path) -> Result<bool, ResolveError> {
        let Some(coord) = PackageCoordinate::parse(coordinate) else {
            tracing::debug!(coordinate, "malformed package coordinate");
            return Ok(false);
        };

        // A package already resolved (or currently being resolved higher up
        // the walk) is satisfied by definition.
        if self.resolved_ids.contains(&coord.id_key()) {
            return Ok(true);
        }
        if !self.in_flight.insert(coord.walk_key()) {
            return Ok(true);
        }

        let resolved = self.resolve_fetched(&coord, temp_dir)?;
        self.in_flight.remove(&coord.walk_key());
        if resolved {
            self.resolved_ids.insert(coord.id_key());
        } else {
            tracing::debug!(coordinate, "package coordinate not resolvable");
        }
        Ok(resolved)
    }

    fn resolve_fetched(
        &mut self,
        coord: &PackageCoordinate,
        temp_dir: &Path,
    ) -> Result<bool, ResolveError> {
        let Some(mut archive) = self.source.fetch(&coord.id, &coord.version)? else {
            return Ok(false);
        };

        let requested = coord.framework.as_deref().and_then(FrameworkMoniker::parse);
        let Some(selected) =
            select_framework(archive.supported_frameworks(), requested.as_ref()).cloned()
        else {
            return Ok(false);
        };
        tracing::debug!(
            id = %coord.id,
            version = %coord.version,
            framework = %selected,
            "resolving package"
        );

        // The package's own binaries come first; dependency assets follow in
        // depth-first order.
        let short = selected.short_folder_name();
        let mut assets = archive.files_under(&format!("lib/{short}"));
        if assets.is_empty() {
            assets = archive.files_under(&format!("build/{short}"));
        }
        for entry in assets {
            self.stage_asset(&mut archive, &entry, temp_dir)?;
        }

        for dep in archive.dependencies_for(&selected) {
            // First with the parent's framework pinned, then letting the
            // dependency select its own.
            let pinned = format!("{},{},{}", dep.id, dep.version, selected);
            if !self.resolve_package(&pinned, temp_dir)? {
                let unpinned = format!("{},{}", dep.id, dep.version);
                if !self.resolve_package(&unpinned, temp_dir)? {
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }

    /// Reference one archive entry, extracting it when the runtime does not
    /// already provide a module of the same name.
    fn stage_asset(
        &mut self,
        archive: &mut crate::archive::PackageArchive,
        entry: &str,
        temp_dir: &Path,
    ) -> Result<(), ResolveError> {
        let leaf = entry.rsplit('/').next().unwrap_or(entry);
        let lower = leaf.to_ascii_lowercase();

        // Placeholder and tooling entries carry no loadable code.
        if leaf == "_._" || lower.ends_with(".xml") || lower.ends_with(".targets") {
            return Ok(());
        }
        if !lower.ends_with(".dll") {
            return Ok(());
        }

        if is_provided_by_runtime(leaf) {
            tracing::debug!(module = leaf, "runtime-provided, not extracting");
            self.push_reference(Reference::Runtime(leaf.to_string()));
            return Ok(());
        }

        let destination = temp_dir.join(leaf);
        if !destination.exists() {
            archive.extract(entry, &destination)?;
        }
        self.push_reference(Reference::File(destination));
        Ok(())
    }

    fn push_reference(&mut self, reference: Reference) {
        let key = reference.file_name().to_ascii_lowercase();
        if self.seen_names.insert(key) {
            self.references.push(reference);
        }
    }
}
