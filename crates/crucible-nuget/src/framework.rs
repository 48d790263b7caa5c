//! Target framework monikers
//!
//! A framework moniker names an ABI/stdlib profile. The same framework is
//! spelled three ways in the wild: the long form `.NETStandard,Version=v2.0`,
//! the nuspec attribute form `.NETStandard2.0`, and the short folder name
//! `netstandard2.0`. All three normalize to the same token here, so equality
//! works across caller input, archive manifests, and asset folder names.

use std::fmt;

/// Framework families with distinct short-name rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FrameworkId {
    NetStandard,
    NetFramework,
    NetCoreApp,
    Other(String),
}

/// A normalized target framework moniker.
///
/// Observable operations are equality and [`short_folder_name`], which names
/// the asset subfolder inside a package archive (`lib/netstandard2.0`).
///
/// [`short_folder_name`]: FrameworkMoniker::short_folder_name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameworkMoniker {
    id: FrameworkId,
    version: Vec<u32>,
}

impl FrameworkMoniker {
    /// Parse any of the three moniker spellings. Returns `None` for blank
    /// input; unknown framework identifiers are preserved rather than
    /// rejected so novel targets degrade to plain string matching.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let (name_part, version_part) = match raw.split_once(',') {
            // Long form: ".NETStandard,Version=v2.0[,Profile=...]"
            Some((name, rest)) => {
                let version = rest
                    .split(',')
                    .map(str::trim)
                    .find_map(|field| {
                        let (key, value) = field.split_once('=')?;
                        key.eq_ignore_ascii_case("version").then_some(value)
                    })
                    .unwrap_or("");
                (name.trim(), version.trim())
            }
            // Attribute/short form: ".NETStandard2.0", "netstandard2.0", "net472"
            None => match raw.find(|c: char| c.is_ascii_digit()) {
                Some(idx) => (&raw[..idx], &raw[idx..]),
                None => (raw, ""),
            },
        };

        let normalized = name_part
            .trim_start_matches('.')
            .replace(' ', "")
            .to_ascii_lowercase();
        let version = parse_version(version_part);

        let id = match normalized.as_str() {
            "netstandard" => FrameworkId::NetStandard,
            "netcoreapp" => FrameworkId::NetCoreApp,
            "netframework" => FrameworkId::NetFramework,
            // Bare "net" is the .NET Framework below 5.0 and modern .NET
            // from 5.0 up; nuspec files use both meanings.
            "net" => {
                if version.first().copied().unwrap_or(0) >= 5 {
                    FrameworkId::NetCoreApp
                } else {
                    FrameworkId::NetFramework
                }
            }
            "" => return None,
            other => FrameworkId::Other(other.to_string()),
        };

        Some(Self { id, version })
    }

    /// The archive-internal folder suffix for this framework, e.g.
    /// `netstandard2.0`, `netcoreapp3.1`, `net472`, `net6.0`.
    pub fn short_folder_name(&self) -> String {
        match &self.id {
            FrameworkId::NetStandard => format!("netstandard{}", dotted(&self.version)),
            FrameworkId::NetCoreApp => {
                if self.version.first().copied().unwrap_or(0) >= 5 {
                    format!("net{}", dotted(&self.version))
                } else {
                    format!("netcoreapp{}", dotted(&self.version))
                }
            }
            FrameworkId::NetFramework => {
                let digits: String = self.version.iter().map(|c| c.to_string()).collect();
                format!("net{}", digits)
            }
            FrameworkId::Other(name) => format!("{}{}", name, dotted(&self.version)),
        }
    }
}

impl fmt::Display for FrameworkMoniker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The short folder name round-trips through `parse`, which matters
        // when a parent's moniker is spliced into a dependency coordinate.
        write!(f, "{}", self.short_folder_name())
    }
}

/// Parse a version fragment: `v2.0`, `2.0`, `472` (digit-per-component).
/// Trailing zero components beyond major.minor are dropped so `2.0.0`
/// equals `2.0`.
fn parse_version(raw: &str) -> Vec<u32> {
    let raw = raw.trim().trim_start_matches(['v', 'V']);
    if raw.is_empty() {
        return Vec::new();
    }

    let mut parts: Vec<u32> = if raw.contains('.') {
        raw.split('.').filter_map(|p| p.trim().parse().ok()).collect()
    } else {
        // Short-name convention packs one digit per component: 472 = 4.7.2
        raw.chars().filter_map(|c| c.to_digit(10)).collect()
    };

    while parts.len() > 2 && parts.last() == Some(&0) {
        parts.pop();
    }
    if parts.len() == 1 {
        parts.push(0);
    }
    parts
}

fn dotted(version: &[u32]) -> String {
    version
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// Select the archive framework to use for a request.
///
/// A pinned request matches only a framework equal to it; an unpinned request
/// takes the first framework in archive order. No declared frameworks means
/// the package cannot be used.
pub fn select_framework<'a>(
    supported: &'a [FrameworkMoniker],
    requested: Option<&FrameworkMoniker>,
) -> Option<&'a FrameworkMoniker> {
    match requested {
        Some(requested) => supported.iter().find(|fw| *fw == requested),
        None => supported.first(),
    }
}
