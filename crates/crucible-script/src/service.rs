//! Process-wide compiler registration
//!
//! Binds a [`ScriptCompiler`] instance under singleton lifetime for hosts
//! that wire capabilities through a service registry rather than passing
//! instances around.

use crate::compiler::ScriptCompiler;
use std::sync::{Arc, OnceLock};

static SHARED: OnceLock<Arc<ScriptCompiler>> = OnceLock::new();

/// Register the shared compiler. Idempotent: the first registration wins and
/// later calls return the already-installed instance.
pub fn install(compiler: ScriptCompiler) -> Arc<ScriptCompiler> {
    SHARED.get_or_init(|| Arc::new(compiler)).clone()
}

/// The registered shared compiler, when one has been installed.
pub fn shared() -> Option<Arc<ScriptCompiler>> {
    SHARED.get().cloned()
}
