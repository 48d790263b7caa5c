//! Compilation diagnostics and the result envelope

use crate::loader::ModuleHandle;

/// Diagnostic severity as reported by the compiler backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Hidden,
    Info,
    Warning,
    Error,
}

/// A position in the compiled source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    /// 1-based line.
    pub line: u32,

    /// 1-based column.
    pub column: u32,
}

/// A single compiler diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Reported severity.
    pub severity: Severity,

    /// Whether the backend escalated a warning to an error.
    pub warning_as_error: bool,

    /// Human-readable message.
    pub message: String,

    /// Source position, when the backend attributes one.
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    /// An error diagnostic without a source location.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            warning_as_error: false,
            message: message.into(),
            location: None,
        }
    }

    /// A warning diagnostic without a source location.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            warning_as_error: false,
            message: message.into(),
            location: None,
        }
    }

    /// Attach a source position.
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.location = Some(SourceLocation { line, column });
        self
    }

    /// Whether this diagnostic fails the compilation: severity is `Error`,
    /// or a warning escalated to an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error || self.warning_as_error
    }
}

/// Whether any diagnostic in the sequence fails the compilation.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// Outcome of a compile call: the full diagnostic sequence, the success
/// flag, and on success the loaded module.
///
/// Invariants: success implies a module is present and [`errors`] is empty;
/// failure implies no module.
///
/// [`errors`]: CompilationResult::errors
pub struct CompilationResult {
    diagnostics: Vec<Diagnostic>,
    success: bool,
    module: Option<ModuleHandle>,
}

impl std::fmt::Debug for CompilationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilationResult")
            .field("success", &self.success)
            .field("diagnostics", &self.diagnostics)
            .field("module", &self.module.as_ref().map(|_| "<loaded module>"))
            .finish()
    }
}

impl CompilationResult {
    /// A failed compilation carrying its diagnostics.
    pub fn failed(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics, success: false, module: None }
    }

    /// A successful compilation carrying the loaded module.
    pub fn loaded(diagnostics: Vec<Diagnostic>, module: ModuleHandle) -> Self {
        Self { diagnostics, success: true, module: Some(module) }
    }

    /// Whether the compilation succeeded.
    pub fn success(&self) -> bool {
        self.success
    }

    /// The full diagnostic sequence, in backend order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The failing subset of the diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// The loaded module, when the compilation succeeded.
    pub fn module(&self) -> Option<&ModuleHandle> {
        self.module.as_ref()
    }

    /// The loaded module.
    ///
    /// # Panics
    ///
    /// Panics when `success()` is false; check [`module`] instead when the
    /// outcome is uncertain.
    ///
    /// [`module`]: CompilationResult::module
    pub fn loaded_module(&self) -> &ModuleHandle {
        self.module
            .as_ref()
            .expect("compilation failed; no module was loaded")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity_is_error() {
        assert!(Diagnostic::error("bad").is_error());
        assert!(!Diagnostic::warning("meh").is_error());
    }

    #[test]
    fn test_warning_as_error_counts() {
        let mut diag = Diagnostic::warning("strict");
        diag.warning_as_error = true;
        assert!(diag.is_error());
    }

    #[test]
    fn test_has_errors() {
        assert!(!has_errors(&[]));
        assert!(!has_errors(&[Diagnostic::warning("w")]));
        assert!(has_errors(&[Diagnostic::warning("w"), Diagnostic::error("e")]));
    }

    #[test]
    fn test_failed_result_has_no_module() {
        let result = CompilationResult::failed(vec![Diagnostic::error("e")]);
        assert!(!result.success());
        assert!(result.module().is_none());
        assert_eq!(result.errors().count(), 1);
    }

    #[test]
    #[should_panic(expected = "no module was loaded")]
    fn test_loaded_module_panics_on_failure() {
        let result = CompilationResult::failed(vec![Diagnostic::error("e")]);
        let _ = result.loaded_module();
    }

    #[test]
    fn test_location_attachment() {
        let diag = Diagnostic::error("e").at(3, 14);
        assert_eq!(diag.location, Some(SourceLocation { line: 3, column: 14 }));
    }
}
