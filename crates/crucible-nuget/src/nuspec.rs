//! Package manifest (.nuspec) parsing
//!
//! Reads the dependency declaration out of a package's embedded nuspec:
//! the `<dependencies>` element contains either `<group targetFramework=...>`
//! blocks or flat `<dependency>` entries that apply to every framework.

use crate::framework::FrameworkMoniker;
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

/// Errors raised while parsing a nuspec document.
#[derive(Debug, Error)]
pub enum NuspecError {
    /// Malformed XML
    #[error("invalid nuspec XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Structurally valid XML that is not a nuspec
    #[error("nuspec has no <metadata> element")]
    MissingMetadata,
}

/// A single declared dependency: id plus the declared minimum version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDependency {
    /// Dependency package id.
    pub id: String,

    /// Declared minimum version (range syntax is collapsed to its lower
    /// bound).
    pub version: String,
}

/// A dependency group tied to a target framework.
#[derive(Debug, Clone)]
pub struct DependencyGroup {
    /// Target framework of the group; `None` for flat dependencies, which
    /// apply to every framework.
    pub target_framework: Option<FrameworkMoniker>,

    /// Dependencies declared in the group.
    pub dependencies: Vec<PackageDependency>,
}

/// Parsed nuspec manifest.
#[derive(Debug, Clone)]
pub struct Nuspec {
    /// Package id from `<metadata><id>`.
    pub id: String,

    /// Package version from `<metadata><version>`.
    pub version: String,

    /// Dependency groups in document order.
    pub groups: Vec<DependencyGroup>,
}

impl Nuspec {
    /// Parse a nuspec document.
    pub fn parse(xml: &str) -> Result<Self, NuspecError> {
        let mut reader = Reader::from_str(xml);

        let mut id = String::new();
        let mut version = String::new();
        let mut groups: Vec<DependencyGroup> = Vec::new();
        let mut flat = DependencyGroup {
            target_framework: None,
            dependencies: Vec::new(),
        };

        let mut saw_metadata = false;
        let mut in_group = false;
        // Path of element names from the root, used to scope <id>/<version>
        // to <metadata> (the <files> section can also contain those names).
        let mut path: Vec<String> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => {
                    let tag = local_name(e.name().as_ref());
                    match tag.as_str() {
                        "metadata" => saw_metadata = true,
                        "group" => {
                            in_group = true;
                            groups.push(DependencyGroup {
                                target_framework: attribute(e, "targetFramework")
                                    .and_then(|v| FrameworkMoniker::parse(&v)),
                                dependencies: Vec::new(),
                            });
                        }
                        "dependency" => {
                            push_dependency(e, in_group, &mut groups, &mut flat);
                        }
                        _ => {}
                    }
                    path.push(tag);
                }
                Event::Empty(ref e) => {
                    let tag = local_name(e.name().as_ref());
                    match tag.as_str() {
                        "dependency" => {
                            push_dependency(e, in_group, &mut groups, &mut flat);
                        }
                        "group" => {
                            groups.push(DependencyGroup {
                                target_framework: attribute(e, "targetFramework")
                                    .and_then(|v| FrameworkMoniker::parse(&v)),
                                dependencies: Vec::new(),
                            });
                        }
                        _ => {}
                    }
                }
                Event::End(ref e) => {
                    if local_name(e.name().as_ref()) == "group" {
                        in_group = false;
                    }
                    path.pop();
                }
                Event::Text(ref t) => {
                    if path.ends_with(&["metadata".to_string(), "id".to_string()]) {
                        id = t.unescape()?.trim().to_string();
                    } else if path.ends_with(&["metadata".to_string(), "version".to_string()]) {
                        version = t.unescape()?.trim().to_string();
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !saw_metadata {
            return Err(NuspecError::MissingMetadata);
        }

        if !flat.dependencies.is_empty() {
            groups.push(flat);
        }

        Ok(Self { id, version, groups })
    }

    /// Dependencies for a framework: the group whose target framework equals
    /// it, falling back to the flat group. Empty when neither exists.
    pub fn dependencies_for(&self, framework: &FrameworkMoniker) -> &[PackageDependency] {
        self.groups
            .iter()
            .find(|g| g.target_framework.as_ref() == Some(framework))
            .or_else(|| self.groups.iter().find(|g| g.target_framework.is_none()))
            .map(|g| g.dependencies.as_slice())
            .unwrap_or(&[])
    }

    /// Target frameworks declared by dependency groups, in document order.
    pub fn group_frameworks(&self) -> impl Iterator<Item = &FrameworkMoniker> {
        self.groups.iter().filter_map(|g| g.target_framework.as_ref())
    }
}

fn push_dependency(
    e: &quick_xml::events::BytesStart<'_>,
    in_group: bool,
    groups: &mut [DependencyGroup],
    flat: &mut DependencyGroup,
) {
    let Some(id) = attribute(e, "id") else { return };
    let version = attribute(e, "version")
        .map(|v| min_version(&v))
        .unwrap_or_default();
    let dep = PackageDependency { id, version };

    if in_group {
        if let Some(group) = groups.last_mut() {
            group.dependencies.push(dep);
            return;
        }
    }
    flat.dependencies.push(dep);
}

fn local_name(name: &[u8]) -> String {
    let name = String::from_utf8_lossy(name);
    name.rsplit(':').next().unwrap_or(&name).to_string()
}

fn attribute(e: &quick_xml::events::BytesStart<'_>, key: &str) -> Option<String> {
    e.attributes().filter_map(|a| a.ok()).find_map(|attr| {
        let attr_key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        if local_name(attr_key.as_bytes()) == key {
            Some(String::from_utf8_lossy(&attr.value).to_string())
        } else {
            None
        }
    })
}

/// Collapse NuGet range syntax to the declared minimum: `[1.0.0, )` and
/// `[1.0.0]` both yield `1.0.0`; a bare version is returned as-is.
fn min_version(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') || trimmed.starts_with('(') {
        trimmed
            .trim_start_matches(['[', '('])
            .trim_end_matches([']', ')'])
            .split(',')
            .next()
            .unwrap_or("")
            .trim()
            .to_string()
    } else {
        trimmed.to_string()
    }
}
