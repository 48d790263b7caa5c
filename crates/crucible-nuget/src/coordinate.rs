//! Package coordinate parsing
//!
//! A coordinate is the caller-supplied reference string `id,version[,framework]`.
//! The framework moniker may itself contain commas (`.NETStandard,Version=v2.0`),
//! so everything after the second field is re-joined verbatim.

/// A parsed package reference string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageCoordinate {
    /// Package id as supplied by the caller.
    pub id: String,

    /// Exact version to fetch (packages declare minimum versions, which are
    /// pinned as-is).
    pub version: String,

    /// Raw framework moniker text, when the caller pinned one.
    pub framework: Option<String>,
}

impl PackageCoordinate {
    /// Parse a coordinate by splitting on `,`.
    ///
    /// The first two fields are mandatory; fields `[2..]` are re-joined with
    /// `,` to form the framework moniker. Returns `None` when fewer than two
    /// fields are present, which callers treat as "coordinate not resolvable".
    pub fn parse(raw: &str) -> Option<Self> {
        let fields: Vec<&str> = raw.split(',').collect();
        if fields.len() < 2 {
            return None;
        }

        let framework = if fields.len() > 2 {
            let moniker = fields[2..].join(",");
            if moniker.trim().is_empty() {
                None
            } else {
                Some(moniker)
            }
        } else {
            None
        };

        Some(Self {
            id: fields[0].trim().to_string(),
            version: fields[1].trim().to_string(),
            framework,
        })
    }

    /// Key identifying this coordinate during a walk (case-insensitive id).
    pub(crate) fn walk_key(&self) -> (String, String) {
        (self.id.to_ascii_lowercase(), self.version.to_ascii_lowercase())
    }

    /// Case-insensitive id key.
    pub(crate) fn id_key(&self) -> String {
        self.id.to_ascii_lowercase()
    }
}
