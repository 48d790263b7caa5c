//! Package archive (.nupkg) reading
//!
//! A nupkg is a zip archive carrying a nuspec manifest at its root and
//! per-framework asset folders (`lib/<short>`, `build/<short>`). The reader
//! owns the archive bytes for its lifetime; extraction writes single entries
//! to caller-chosen destinations.

use crate::framework::FrameworkMoniker;
use crate::nuspec::{Nuspec, NuspecError, PackageDependency};
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::Path;
use thiserror::Error;
use zip::ZipArchive;

/// Errors raised while opening or extracting a package archive. Archive
/// corruption is fatal to the enclosing compile call.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The zip container is corrupt or truncated
    #[error("invalid package archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// IO error while extracting
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The archive carries no nuspec entry
    #[error("package archive has no nuspec manifest")]
    MissingManifest,

    /// The nuspec entry is unreadable
    #[error("package manifest: {0}")]
    Manifest(#[from] NuspecError),
}

/// A read-only view over an in-memory package archive.
pub struct PackageArchive {
    zip: ZipArchive<Cursor<Vec<u8>>>,
    nuspec: Nuspec,
    entries: Vec<String>,
    supported: Vec<FrameworkMoniker>,
}

impl PackageArchive {
    /// Open an archive from its raw bytes and parse the embedded manifest.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ArchiveError> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;

        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            entries.push(zip.by_index_raw(i)?.name().to_owned());
        }

        let nuspec_entry = entries
            .iter()
            .find(|name| {
                !name.contains('/') && name.to_ascii_lowercase().ends_with(".nuspec")
            })
            .cloned()
            .ok_or(ArchiveError::MissingManifest)?;

        let mut xml = String::new();
        zip.by_name(&nuspec_entry)?.read_to_string(&mut xml)?;
        let nuspec = Nuspec::parse(&xml)?;

        let supported = supported_frameworks(&nuspec, &entries);

        Ok(Self { zip, nuspec, entries, supported })
    }

    /// Frameworks this package can serve, in archive order: nuspec dependency
    /// groups first, then `lib/<short>` folders not already declared.
    pub fn supported_frameworks(&self) -> &[FrameworkMoniker] {
        &self.supported
    }

    /// Declared dependencies for a framework; empty when the archive has no
    /// matching dependency group.
    pub fn dependencies_for(&self, framework: &FrameworkMoniker) -> Vec<PackageDependency> {
        self.nuspec.dependencies_for(framework).to_vec()
    }

    /// Package id from the manifest.
    pub fn id(&self) -> &str {
        &self.nuspec.id
    }

    /// Entry paths whose containing folder equals `prefix` (direct children
    /// only; folder comparison is case-insensitive).
    pub fn files_under(&self, prefix: &str) -> Vec<String> {
        let prefix_lower = format!("{}/", prefix.to_ascii_lowercase());
        self.entries
            .iter()
            .filter(|entry| {
                let lower = entry.to_ascii_lowercase();
                match lower.strip_prefix(&prefix_lower) {
                    Some(rest) => !rest.is_empty() && !rest.contains('/'),
                    None => false,
                }
            })
            .cloned()
            .collect()
    }

    /// Write a single entry's bytes to `destination`, creating parent
    /// directories as needed.
    pub fn extract(&mut self, entry_path: &str, destination: &Path) -> Result<(), ArchiveError> {
        let mut entry = self.zip.by_name(entry_path)?;
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(destination)?;
        io::copy(&mut entry, &mut out)?;
        Ok(())
    }
}

fn supported_frameworks(nuspec: &Nuspec, entries: &[String]) -> Vec<FrameworkMoniker> {
    let mut supported: Vec<FrameworkMoniker> = nuspec.group_frameworks().cloned().collect();

    for entry in entries {
        let mut segments = entry.split('/');
        if !segments.next().is_some_and(|s| s.eq_ignore_ascii_case("lib")) {
            continue;
        }
        let Some(folder) = segments.next() else { continue };
        // Only folders that actually contain files count.
        if segments.next().is_none() && !entry.ends_with('/') {
            continue;
        }
        if let Some(fw) = FrameworkMoniker::parse(folder) {
            if !supported.contains(&fw) {
                supported.push(fw);
            }
        }
    }

    supported
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn build_nupkg(nuspec: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        writer.start_file("test.nuspec", options).unwrap();
        writer.write_all(nuspec.as_bytes()).unwrap();
        for (name, contents) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    const NUSPEC: &str = r#"<package><metadata>
        <id>Sample.Lib</id><version>1.0.0</version>
        <dependencies>
          <group targetFramework=".NETStandard2.0">
            <dependency id="Dep.One" version="1.1.0" />
          </group>
        </dependencies>
    </metadata></package>"#;

    #[test]
    fn test_open_and_read_manifest() {
        let bytes = build_nupkg(NUSPEC, &[("lib/netstandard2.0/Sample.Lib.dll", b"MZ")]);
        let archive = PackageArchive::from_bytes(bytes).unwrap();
        assert_eq!(archive.id(), "Sample.Lib");

        let fw = FrameworkMoniker::parse("netstandard2.0").unwrap();
        let deps = archive.dependencies_for(&fw);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].id, "Dep.One");
    }

    #[test]
    fn test_supported_frameworks_union() {
        // net45 appears only as a lib folder, netstandard2.0 only as a group.
        let bytes = build_nupkg(NUSPEC, &[("lib/net45/Sample.Lib.dll", b"MZ")]);
        let archive = PackageArchive::from_bytes(bytes).unwrap();
        let names: Vec<String> = archive
            .supported_frameworks()
            .iter()
            .map(|fw| fw.short_folder_name())
            .collect();
        assert_eq!(names, vec!["netstandard2.0", "net45"]);
    }

    #[test]
    fn test_files_under_direct_children_only() {
        let bytes = build_nupkg(
            NUSPEC,
            &[
                ("lib/netstandard2.0/Sample.Lib.dll", b"MZ".as_slice()),
                ("lib/netstandard2.0/Sample.Lib.xml", b"<doc/>".as_slice()),
                ("lib/netstandard2.0/cs/Sample.Lib.resources.dll", b"MZ".as_slice()),
                ("lib/net45/Sample.Lib.dll", b"MZ".as_slice()),
            ],
        );
        let archive = PackageArchive::from_bytes(bytes).unwrap();

        let mut files = archive.files_under("lib/netstandard2.0");
        files.sort();
        assert_eq!(
            files,
            vec![
                "lib/netstandard2.0/Sample.Lib.dll",
                "lib/netstandard2.0/Sample.Lib.xml",
            ]
        );
        assert!(archive.files_under("lib/net20").is_empty());
    }

    #[test]
    fn test_extract_writes_entry_bytes() {
        let bytes = build_nupkg(NUSPEC, &[("lib/netstandard2.0/Sample.Lib.dll", b"MZpayload")]);
        let mut archive = PackageArchive::from_bytes(bytes).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("Sample.Lib.dll");
        archive
            .extract("lib/netstandard2.0/Sample.Lib.dll", &dest)
            .unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"MZpayload");
    }

    #[test]
    fn test_corrupt_archive_is_fatal() {
        let result = PackageArchive::from_bytes(b"not a zip".to_vec());
        assert!(matches!(result, Err(ArchiveError::Zip(_))));
    }

    #[test]
    fn test_missing_manifest() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.start_file("lib/net45/x.dll", options).unwrap();
        writer.write_all(b"MZ").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let result = PackageArchive::from_bytes(bytes);
        assert!(matches!(result, Err(ArchiveError::MissingManifest)));
    }
}
