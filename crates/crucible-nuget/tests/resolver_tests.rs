//! Integration tests for the transitive package walk

use crucible_nuget::{PackageArchive, PackageSource, Reference, ReferenceResolver, SourceError};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Declarative nupkg fixture.
struct PackageSpec {
    id: &'static str,
    version: &'static str,
    /// (target framework attribute, [(dep id, dep version)])
    groups: Vec<(&'static str, Vec<(&'static str, &'static str)>)>,
    /// archive entry paths; contents are synthesized
    files: Vec<&'static str>,
}

fn build_nupkg(spec: &PackageSpec) -> Vec<u8> {
    let mut nuspec = String::from("<package><metadata>");
    nuspec.push_str(&format!("<id>{}</id>", spec.id));
    nuspec.push_str(&format!("<version>{}</version>", spec.version));
    nuspec.push_str("<dependencies>");
    for (framework, deps) in &spec.groups {
        nuspec.push_str(&format!("<group targetFramework=\"{}\">", framework));
        for (id, version) in deps {
            nuspec.push_str(&format!(
                "<dependency id=\"{}\" version=\"{}\" />",
                id, version
            ));
        }
        nuspec.push_str("</group>");
    }
    nuspec.push_str("</dependencies></metadata></package>");

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    writer
        .start_file(format!("{}.nuspec", spec.id), options)
        .unwrap();
    writer.write_all(nuspec.as_bytes()).unwrap();
    for file in &spec.files {
        writer.start_file(*file, options).unwrap();
        writer.write_all(format!("binary:{}", file).as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// In-memory package feed.
struct InMemorySource {
    packages: HashMap<(String, String), Vec<u8>>,
}

impl InMemorySource {
    fn new(specs: &[PackageSpec]) -> Self {
        let packages = specs
            .iter()
            .map(|spec| {
                let key = (spec.id.to_lowercase(), spec.version.to_lowercase());
                (key, build_nupkg(spec))
            })
            .collect();
        Self { packages }
    }
}

impl PackageSource for InMemorySource {
    fn fetch(&self, id: &str, version: &str) -> Result<Option<PackageArchive>, SourceError> {
        let key = (id.to_lowercase(), version.to_lowercase());
        match self.packages.get(&key) {
            Some(bytes) => Ok(Some(PackageArchive::from_bytes(bytes.clone())?)),
            None => Ok(None),
        }
    }
}

fn file_names(references: &[Reference]) -> Vec<String> {
    references.iter().map(|r| r.file_name().to_string()).collect()
}

#[test]
fn test_single_package_extracts_assets() {
    let source = InMemorySource::new(&[PackageSpec {
        id: "Sample.Lib",
        version: "1.0.0",
        groups: vec![(".NETStandard2.0", vec![])],
        files: vec!["lib/netstandard2.0/Sample.Lib.dll"],
    }]);
    let temp = tempfile::tempdir().unwrap();

    let mut resolver = ReferenceResolver::new(&source);
    resolver
        .add_packages(["Sample.Lib,1.0.0"], temp.path())
        .unwrap();

    let refs = resolver.into_references();
    let expected = temp.path().join("Sample.Lib.dll");
    assert_eq!(refs, vec![Reference::File(expected.clone())]);
    assert_eq!(
        std::fs::read(expected).unwrap(),
        b"binary:lib/netstandard2.0/Sample.Lib.dll"
    );
}

#[test]
fn test_transitive_walk_is_preorder() {
    let source = InMemorySource::new(&[
        PackageSpec {
            id: "Root",
            version: "2.0.0",
            groups: vec![(".NETStandard2.0", vec![("Mid", "1.5.0")])],
            files: vec!["lib/netstandard2.0/Root.dll"],
        },
        PackageSpec {
            id: "Mid",
            version: "1.5.0",
            groups: vec![(".NETStandard2.0", vec![("Leaf", "1.0.0")])],
            files: vec!["lib/netstandard2.0/Mid.dll"],
        },
        PackageSpec {
            id: "Leaf",
            version: "1.0.0",
            groups: vec![(".NETStandard2.0", vec![])],
            files: vec!["lib/netstandard2.0/Leaf.dll"],
        },
    ]);
    let temp = tempfile::tempdir().unwrap();

    let mut resolver = ReferenceResolver::new(&source);
    resolver.add_packages(["Root,2.0.0"], temp.path()).unwrap();

    assert_eq!(
        file_names(&resolver.into_references()),
        vec!["Root.dll", "Mid.dll", "Leaf.dll"]
    );
}

#[test]
fn test_caller_assemblies_precede_packages() {
    let source = InMemorySource::new(&[PackageSpec {
        id: "Sample.Lib",
        version: "1.0.0",
        groups: vec![(".NETStandard2.0", vec![])],
        files: vec!["lib/netstandard2.0/Sample.Lib.dll"],
    }]);
    let temp = tempfile::tempdir().unwrap();

    let mut resolver = ReferenceResolver::new(&source);
    resolver.add_local_assemblies(["Host.Tests.dll"]);
    resolver
        .add_packages(["Sample.Lib,1.0.0"], temp.path())
        .unwrap();

    assert_eq!(
        file_names(&resolver.into_references()),
        vec!["Host.Tests.dll", "Sample.Lib.dll"]
    );
}

#[test]
fn test_runtime_provided_modules_are_not_extracted() {
    let source = InMemorySource::new(&[PackageSpec {
        id: "NETStandard.Library",
        version: "2.0.3",
        groups: vec![(".NETStandard2.0", vec![])],
        files: vec![
            "lib/netstandard2.0/netstandard.dll",
            "lib/netstandard2.0/System.Runtime.dll",
            "lib/netstandard2.0/My.Facade.dll",
        ],
    }]);
    let temp = tempfile::tempdir().unwrap();

    let mut resolver = ReferenceResolver::new(&source);
    resolver
        .add_packages(
            ["NETStandard.Library,2.0.3,.NETStandard,Version=v2.0"],
            temp.path(),
        )
        .unwrap();

    let refs = resolver.into_references();
    assert!(refs.contains(&Reference::Runtime("netstandard.dll".into())));
    assert!(refs.contains(&Reference::Runtime("System.Runtime.dll".into())));
    assert!(refs.contains(&Reference::File(temp.path().join("My.Facade.dll"))));

    // Nothing runtime-provided lands in the staging directory.
    assert!(!temp.path().join("netstandard.dll").exists());
    assert!(!temp.path().join("System.Runtime.dll").exists());
    assert!(temp.path().join("My.Facade.dll").exists());
}

#[test]
fn test_same_name_across_packages_first_wins() {
    let source = InMemorySource::new(&[
        PackageSpec {
            id: "First",
            version: "1.0.0",
            groups: vec![(".NETStandard2.0", vec![])],
            files: vec!["lib/netstandard2.0/Shared.dll"],
        },
        PackageSpec {
            id: "Second",
            version: "1.0.0",
            groups: vec![(".NETStandard2.0", vec![])],
            files: vec!["lib/netstandard2.0/Shared.dll", "lib/netstandard2.0/Second.dll"],
        },
    ]);
    let temp = tempfile::tempdir().unwrap();

    let mut resolver = ReferenceResolver::new(&source);
    resolver
        .add_packages(["First,1.0.0", "Second,1.0.0"], temp.path())
        .unwrap();

    assert_eq!(
        file_names(&resolver.into_references()),
        vec!["Shared.dll", "Second.dll"]
    );
}

#[test]
fn test_non_binary_entries_are_skipped() {
    let source = InMemorySource::new(&[PackageSpec {
        id: "Docs.Heavy",
        version: "1.0.0",
        groups: vec![(".NETStandard2.0", vec![])],
        files: vec![
            "lib/netstandard2.0/_._",
            "lib/netstandard2.0/Docs.Heavy.xml",
            "lib/netstandard2.0/Docs.Heavy.targets",
            "lib/netstandard2.0/Docs.Heavy.pdb",
            "lib/netstandard2.0/Docs.Heavy.dll",
        ],
    }]);
    let temp = tempfile::tempdir().unwrap();

    let mut resolver = ReferenceResolver::new(&source);
    resolver
        .add_packages(["Docs.Heavy,1.0.0"], temp.path())
        .unwrap();

    assert_eq!(file_names(&resolver.into_references()), vec!["Docs.Heavy.dll"]);
    assert!(!temp.path().join("Docs.Heavy.xml").exists());
    assert!(!temp.path().join("_._").exists());
}

#[test]
fn test_dependency_framework_pin_falls_back() {
    // Mid only supports net45; pinning the parent's netstandard2.0 fails,
    // the unpinned retry lets it select its own framework.
    let source = InMemorySource::new(&[
        PackageSpec {
            id: "Root",
            version: "1.0.0",
            groups: vec![(".NETStandard2.0", vec![("Mid", "1.0.0")])],
            files: vec!["lib/netstandard2.0/Root.dll"],
        },
        PackageSpec {
            id: "Mid",
            version: "1.0.0",
            groups: vec![(".NETFramework4.5", vec![])],
            files: vec!["lib/net45/Mid.dll"],
        },
    ]);
    let temp = tempfile::tempdir().unwrap();

    let mut resolver = ReferenceResolver::new(&source);
    resolver.add_packages(["Root,1.0.0"], temp.path()).unwrap();

    assert_eq!(
        file_names(&resolver.into_references()),
        vec!["Root.dll", "Mid.dll"]
    );
}

#[test]
fn test_unresolvable_dependency_fails_root() {
    let source = InMemorySource::new(&[PackageSpec {
        id: "Root",
        version: "1.0.0",
        groups: vec![(".NETStandard2.0", vec![("Missing", "1.0.0")])],
        files: vec!["lib/netstandard2.0/Root.dll"],
    }]);
    let temp = tempfile::tempdir().unwrap();

    let mut resolver = ReferenceResolver::new(&source);
    let result = resolver.add_packages(["Root,1.0.0"], temp.path());
    assert!(result.is_err());
}

#[test]
fn test_build_folder_fallback() {
    let source = InMemorySource::new(&[PackageSpec {
        id: "Build.Only",
        version: "1.0.0",
        groups: vec![(".NETStandard2.0", vec![])],
        files: vec!["build/netstandard2.0/Build.Only.dll"],
    }]);
    let temp = tempfile::tempdir().unwrap();

    let mut resolver = ReferenceResolver::new(&source);
    resolver
        .add_packages(["Build.Only,1.0.0"], temp.path())
        .unwrap();

    assert_eq!(file_names(&resolver.into_references()), vec!["Build.Only.dll"]);
}

#[test]
fn test_assetless_package_still_resolves_dependencies() {
    let source = InMemorySource::new(&[
        PackageSpec {
            id: "Meta",
            version: "1.0.0",
            groups: vec![(".NETStandard2.0", vec![("Real", "1.0.0")])],
            files: vec![],
        },
        PackageSpec {
            id: "Real",
            version: "1.0.0",
            groups: vec![(".NETStandard2.0", vec![])],
            files: vec!["lib/netstandard2.0/Real.dll"],
        },
    ]);
    let temp = tempfile::tempdir().unwrap();

    let mut resolver = ReferenceResolver::new(&source);
    resolver.add_packages(["Meta,1.0.0"], temp.path()).unwrap();

    assert_eq!(file_names(&resolver.into_references()), vec!["Real.dll"]);
}

#[test]
fn test_cycle_terminates() {
    let source = InMemorySource::new(&[
        PackageSpec {
            id: "A",
            version: "1.0.0",
            groups: vec![(".NETStandard2.0", vec![("B", "1.0.0")])],
            files: vec!["lib/netstandard2.0/A.dll"],
        },
        PackageSpec {
            id: "B",
            version: "1.0.0",
            groups: vec![(".NETStandard2.0", vec![("A", "1.0.0")])],
            files: vec!["lib/netstandard2.0/B.dll"],
        },
    ]);
    let temp = tempfile::tempdir().unwrap();

    let mut resolver = ReferenceResolver::new(&source);
    resolver.add_packages(["A,1.0.0"], temp.path()).unwrap();

    assert_eq!(
        file_names(&resolver.into_references()),
        vec!["A.dll", "B.dll"]
    );
}

#[test]
fn test_repeated_coordinate_is_skipped() {
    let source = InMemorySource::new(&[PackageSpec {
        id: "Sample.Lib",
        version: "1.0.0",
        groups: vec![(".NETStandard2.0", vec![])],
        files: vec!["lib/netstandard2.0/Sample.Lib.dll"],
    }]);
    let temp = tempfile::tempdir().unwrap();

    let mut resolver = ReferenceResolver::new(&source);
    resolver
        .add_packages(["Sample.Lib,1.0.0", "sample.lib,1.0.0"], temp.path())
        .unwrap();

    assert_eq!(file_names(&resolver.into_references()), vec!["Sample.Lib.dll"]);
}

#[test]
fn test_existing_staged_file_is_trusted() {
    let source = InMemorySource::new(&[PackageSpec {
        id: "Sample.Lib",
        version: "1.0.0",
        groups: vec![(".NETStandard2.0", vec![])],
        files: vec!["lib/netstandard2.0/Sample.Lib.dll"],
    }]);
    let temp = tempfile::tempdir().unwrap();
    let staged = temp.path().join("Sample.Lib.dll");
    std::fs::write(&staged, b"already staged").unwrap();

    let mut resolver = ReferenceResolver::new(&source);
    resolver
        .add_packages(["Sample.Lib,1.0.0"], temp.path())
        .unwrap();

    // The pre-existing file is treated as already extracted.
    assert_eq!(std::fs::read(&staged).unwrap(), b"already staged");
    assert_eq!(
        resolver.into_references(),
        vec![Reference::File(staged)]
    );
}

#[test]
fn test_unpinned_root_uses_first_framework() {
    let source = InMemorySource::new(&[PackageSpec {
        id: "Multi",
        version: "1.0.0",
        groups: vec![(".NETFramework4.5", vec![]), (".NETStandard2.0", vec![])],
        files: vec!["lib/net45/Multi45.dll", "lib/netstandard2.0/MultiStd.dll"],
    }]);
    let temp = tempfile::tempdir().unwrap();

    let mut resolver = ReferenceResolver::new(&source);
    resolver.add_packages(["Multi,1.0.0"], temp.path()).unwrap();

    assert_eq!(file_names(&resolver.into_references()), vec!["Multi45.dll"]);
}

#[test]
fn test_pinned_framework_mismatch_is_unresolvable() {
    let source = InMemorySource::new(&[PackageSpec {
        id: "NetOnly",
        version: "1.0.0",
        groups: vec![(".NETFramework4.5", vec![])],
        files: vec!["lib/net45/NetOnly.dll"],
    }]);
    let temp = tempfile::tempdir().unwrap();

    let mut resolver = ReferenceResolver::new(&source);
    let result = resolver.add_packages(["NetOnly,1.0.0,netstandard2.0"], temp.path());
    assert!(result.is_err());
}
