//! Module loading and isolation scopes
//!
//! The loader is a one-method capability: materialize emitted bytes into a
//! callable module. Hosts with a real isolation concept (per-tenant
//! unloadable contexts, sandboxes) implement [`LoadScope`]; the default
//! scope is the process-global loader, which keeps the module image in
//! memory.

use std::any::Any;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a load scope.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The scope could not materialize the module
    #[error("failed to load module: {0}")]
    Failed(String),
}

/// A module materialized by a [`LoadScope`]. The handle outlives the compile
/// call and is owned by the caller.
pub trait LoadedModule: Send + Sync {
    /// Downcast support for hosts recovering their concrete module type.
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a loaded module.
pub type ModuleHandle = Arc<dyn LoadedModule>;

/// Isolation scope into which compiled bytes are materialized.
pub trait LoadScope: Send + Sync {
    /// Materialize module bytes into a callable module.
    fn load_bytes(&self, bytes: &[u8]) -> Result<ModuleHandle, LoadError>;
}

/// Module representation used by the default scope: the raw image, retained
/// in memory.
#[derive(Debug, Default)]
pub struct InMemoryModule {
    bytes: Vec<u8>,
}

impl InMemoryModule {
    /// A module over the given image bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// The module image as emitted by the backend.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl LoadedModule for InMemoryModule {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The process-global default scope.
#[derive(Debug, Default)]
pub struct ProcessScope;

impl LoadScope for ProcessScope {
    fn load_bytes(&self, bytes: &[u8]) -> Result<ModuleHandle, LoadError> {
        Ok(Arc::new(InMemoryModule::new(bytes.to_vec())))
    }
}
