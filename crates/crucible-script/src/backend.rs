//! Compiler backend contract
//!
//! The language front-end is an external collaborator: it parses the source
//! into an opaque syntax unit and later emits module bytes against the
//! accumulated reference list. Backends are expected to wrap a real compiler
//! library; this crate only drives them.

use crate::diagnostics::Diagnostic;
use crucible_nuget::Reference;
use std::any::Any;

/// Preprocessor symbol enabling the backend's diagnostic-tracing support.
pub const DIAGNOSTIC_TRACE_SYMBOL: &str = "TRACE";

/// An opaque parsed syntax tree, meaningful only to the backend that
/// produced it.
pub trait SyntaxUnit: Any + Send {
    /// Downcast support for backends recovering their concrete tree.
    fn as_any(&self) -> &dyn Any;
}

/// Options for the parse step.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Preprocessor symbols defined for the parse; the diagnostic-tracing
    /// symbol is always on.
    pub preprocessor_symbols: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            preprocessor_symbols: vec![DIAGNOSTIC_TRACE_SYMBOL.to_string()],
        }
    }
}

/// Optimization level for the emit step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Optimization {
    Debug,
    Release,
}

/// Platform target for the emitted module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Platform-agnostic module, loadable wherever the runtime runs.
    Portable,
    X64,
}

/// Output shape of the emitted module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// A dynamically loadable library, the only kind the in-memory loader
    /// accepts.
    DynamicLibrary,
    ConsoleApplication,
}

/// Everything the backend needs to emit one module.
#[derive(Debug)]
pub struct EmitRequest<'a> {
    /// Name for the emitted module, unique per compile call.
    pub assembly_name: String,

    /// Ordered module references, as produced by the reference resolver.
    pub references: &'a [Reference],

    /// Optimization level.
    pub optimization: Optimization,

    /// Platform target.
    pub platform: Platform,

    /// Output shape.
    pub output: OutputKind,
}

/// Result of the emit step: diagnostics plus the module image when emit
/// succeeded.
#[derive(Debug)]
pub struct EmitOutput {
    /// Full diagnostic sequence.
    pub diagnostics: Vec<Diagnostic>,

    /// Emitted module bytes; `None` when emit failed.
    pub bytes: Option<Vec<u8>>,
}

/// The language front-end: parse once, emit with references.
pub trait CompilerBackend: Send + Sync {
    /// Parse the source into a backend-private syntax unit.
    fn parse(&self, source: &str, options: &ParseOptions) -> Box<dyn SyntaxUnit>;

    /// Compile a parsed unit and emit module bytes into memory.
    fn emit(&self, unit: &dyn SyntaxUnit, request: &EmitRequest<'_>) -> EmitOutput;
}
