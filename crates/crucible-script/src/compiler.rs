//! The compile driver
//!
//! Orchestrates one `load_to_memory` call: validate arguments, build the
//! reference list (local assemblies first, then the transitive package
//! closure), parse, emit, and hand the bytes to the isolation scope.

use crate::backend::{
    CompilerBackend, EmitRequest, Optimization, OutputKind, ParseOptions, Platform,
};
use crate::diagnostics::{has_errors, CompilationResult};
use crate::loader::{LoadError, LoadScope, ProcessScope};
use crucible_nuget::{NugetClient, PackageSource, ReferenceResolver, ResolveError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors raised by [`ScriptCompiler::load_to_memory`]. Compiler diagnostics
/// are data in the [`CompilationResult`], never errors.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The source argument was absent
    #[error("source must be a non-empty string (argument: source)")]
    MissingSource,

    /// Package resolution failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The isolation scope rejected the emitted module
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Arguments for one compile call.
#[derive(Default)]
pub struct LoadRequest<'a> {
    source: &'a str,
    assemblies: Vec<String>,
    packages: Vec<String>,
    temp_dir: Option<PathBuf>,
    package_source: Option<String>,
    scope: Option<Arc<dyn LoadScope>>,
}

impl<'a> LoadRequest<'a> {
    /// A request compiling `source` with no references.
    pub fn new(source: &'a str) -> Self {
        Self { source, ..Default::default() }
    }

    /// Precompiled module references: filesystem paths or strong-name-like
    /// tokens.
    pub fn with_assemblies<I, S>(mut self, assemblies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assemblies = assemblies.into_iter().map(Into::into).collect();
        self
    }

    /// Package references of the form `id,version[,framework]`.
    pub fn with_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages = packages.into_iter().map(Into::into).collect();
        self
    }

    /// Staging directory for extracted package binaries; the platform temp
    /// directory when unset. The directory is caller-managed state: nothing
    /// is deleted from it, and pre-existing files with expected names are
    /// treated as already extracted.
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(temp_dir.into());
        self
    }

    /// Package feed service-index URL; the canonical public feed when unset.
    pub fn with_package_source(mut self, url: impl Into<String>) -> Self {
        self.package_source = Some(url.into());
        self
    }

    /// Isolation scope receiving the emitted module; the compiler's default
    /// scope when unset.
    pub fn with_scope(mut self, scope: Arc<dyn LoadScope>) -> Self {
        self.scope = Some(scope);
        self
    }
}

/// Compiles script source into in-memory modules.
pub struct ScriptCompiler {
    backend: Arc<dyn CompilerBackend>,
    default_scope: Arc<dyn LoadScope>,
    package_source: Option<Arc<dyn PackageSource>>,
}

impl ScriptCompiler {
    /// A compiler over the given backend, loading into the process-global
    /// scope by default.
    pub fn new(backend: Arc<dyn CompilerBackend>) -> Self {
        Self {
            backend,
            default_scope: Arc::new(ProcessScope),
            package_source: None,
        }
    }

    /// Replace the default isolation scope.
    pub fn with_default_scope(mut self, scope: Arc<dyn LoadScope>) -> Self {
        self.default_scope = scope;
        self
    }

    /// Replace the package feed (for testing or offline mirrors); when set,
    /// the request's package source URL is ignored.
    pub fn with_package_feed(mut self, source: Arc<dyn PackageSource>) -> Self {
        self.package_source = Some(source);
        self
    }

    /// Compile `request.source` and load the emitted module.
    ///
    /// Blocking: returns when the module is loaded or the compilation has
    /// failed. Emit failures are data in the returned envelope; argument and
    /// package-resolution failures are errors.
    pub fn load_to_memory(&self, request: LoadRequest<'_>) -> Result<CompilationResult, ScriptError> {
        if request.source.trim().is_empty() {
            return Err(ScriptError::MissingSource);
        }

        let unit = self.backend.parse(request.source, &ParseOptions::default());

        let references = {
            let client;
            let source: &dyn PackageSource = match &self.package_source {
                Some(feed) => feed.as_ref(),
                None => {
                    let url = request.package_source.as_deref().unwrap_or("");
                    client = NugetClient::new(url).map_err(ResolveError::from)?;
                    &client
                }
            };

            let mut resolver = ReferenceResolver::new(source);
            resolver.add_local_assemblies(&request.assemblies);
            let temp_dir = request.temp_dir.clone().unwrap_or_else(std::env::temp_dir);
            resolver.add_packages(&request.packages, &temp_dir)?;
            resolver.into_references()
        };

        let assembly_name = next_assembly_name();
        tracing::debug!(
            assembly = %assembly_name,
            references = references.len(),
            "emitting module"
        );
        let emit = self.backend.emit(
            unit.as_ref(),
            &EmitRequest {
                assembly_name,
                references: &references,
                optimization: Optimization::Debug,
                platform: Platform::Portable,
                output: OutputKind::DynamicLibrary,
            },
        );

        match emit.bytes {
            Some(bytes) if !has_errors(&emit.diagnostics) => {
                let scope = request.scope.as_ref().unwrap_or(&self.default_scope);
                let module = scope.load_bytes(&bytes)?;
                Ok(CompilationResult::loaded(emit.diagnostics, module))
            }
            _ => Ok(CompilationResult::failed(emit.diagnostics)),
        }
    }
}

static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

/// `ScriptAssembly<timestamp>`, strictly increasing within the process even
/// when the wall clock steps backwards.
fn next_assembly_name() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let previous = LAST_STAMP
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(last.max(now) + 1)
        })
        .unwrap_or(0);
    format!("ScriptAssembly{}", previous.max(now) + 1)
}
