//! In-memory script compilation with NuGet package resolution
//!
//! This crate compiles a single source string into an in-memory module:
//! caller-supplied assembly references and NuGet package references (with
//! their transitive dependency closure) are resolved into an ordered
//! reference list, handed to a pluggable compiler backend, and the emitted
//! bytes are materialized through an isolation scope.
//!
//! # Example
//!
//! ```rust,ignore
//! use crucible_script::{LoadRequest, ScriptCompiler};
//!
//! let compiler = ScriptCompiler::new(backend);
//! let result = compiler.load_to_memory(
//!     LoadRequest::new(source)
//!         .with_packages(["NETStandard.Library,2.0.3,.NETStandard,Version=v2.0"]),
//! )?;
//! assert!(result.success());
//! ```

pub mod backend;
pub mod compiler;
pub mod diagnostics;
pub mod loader;
pub mod service;

pub use backend::{
    CompilerBackend, EmitOutput, EmitRequest, Optimization, OutputKind, ParseOptions, Platform,
    SyntaxUnit, DIAGNOSTIC_TRACE_SYMBOL,
};
pub use compiler::{LoadRequest, ScriptCompiler, ScriptError};
pub use diagnostics::{has_errors, CompilationResult, Diagnostic, Severity, SourceLocation};
pub use loader::{InMemoryModule, LoadError, LoadScope, LoadedModule, ModuleHandle, ProcessScope};

pub use crucible_nuget::{Reference, DEFAULT_PACKAGE_SOURCE};
