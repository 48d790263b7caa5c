//! Host-runtime asset registry
//!
//! The host runtime ships a closed set of assemblies that are always loaded;
//! packages re-shipping one of them (the portable base package does this for
//! every facade) must not be extracted or referenced by path. The table is
//! seeded from the netstandard2.0 reference-assembly manifest plus the
//! runtime's own core libraries, lowercased.

use std::collections::HashSet;
use std::sync::OnceLock;

static RUNTIME_PROVIDED: &[&str] = &[
    "microsoft.csharp.dll",
    "microsoft.visualbasic.dll",
    "microsoft.win32.primitives.dll",
    "mscorlib.dll",
    "netstandard.dll",
    "system.appcontext.dll",
    "system.buffers.dll",
    "system.collections.concurrent.dll",
    "system.collections.dll",
    "system.collections.nongeneric.dll",
    "system.collections.specialized.dll",
    "system.componentmodel.composition.dll",
    "system.componentmodel.dll",
    "system.componentmodel.eventbasedasync.dll",
    "system.componentmodel.primitives.dll",
    "system.componentmodel.typeconverter.dll",
    "system.console.dll",
    "system.core.dll",
    "system.data.common.dll",
    "system.data.dll",
    "system.diagnostics.contracts.dll",
    "system.diagnostics.debug.dll",
    "system.diagnostics.fileversioninfo.dll",
    "system.diagnostics.process.dll",
    "system.diagnostics.stacktrace.dll",
    "system.diagnostics.textwritertracelistener.dll",
    "system.diagnostics.tools.dll",
    "system.diagnostics.tracesource.dll",
    "system.diagnostics.tracing.dll",
    "system.dll",
    "system.drawing.dll",
    "system.drawing.primitives.dll",
    "system.dynamic.runtime.dll",
    "system.globalization.calendars.dll",
    "system.globalization.dll",
    "system.globalization.extensions.dll",
    "system.io.compression.dll",
    "system.io.compression.filesystem.dll",
    "system.io.compression.zipfile.dll",
    "system.io.dll",
    "system.io.filesystem.dll",
    "system.io.filesystem.driveinfo.dll",
    "system.io.filesystem.primitives.dll",
    "system.io.filesystem.watcher.dll",
    "system.io.isolatedstorage.dll",
    "system.io.memorymappedfiles.dll",
    "system.io.pipes.dll",
    "system.io.unmanagedmemorystream.dll",
    "system.linq.dll",
    "system.linq.expressions.dll",
    "system.linq.parallel.dll",
    "system.linq.queryable.dll",
    "system.memory.dll",
    "system.net.dll",
    "system.net.http.dll",
    "system.net.nameresolution.dll",
    "system.net.networkinformation.dll",
    "system.net.ping.dll",
    "system.net.primitives.dll",
    "system.net.requests.dll",
    "system.net.security.dll",
    "system.net.sockets.dll",
    "system.net.webheadercollection.dll",
    "system.net.websockets.client.dll",
    "system.net.websockets.dll",
    "system.numerics.dll",
    "system.numerics.vectors.dll",
    "system.objectmodel.dll",
    "system.reflection.dll",
    "system.reflection.extensions.dll",
    "system.reflection.primitives.dll",
    "system.resources.reader.dll",
    "system.resources.resourcemanager.dll",
    "system.resources.writer.dll",
    "system.runtime.compilerservices.unsafe.dll",
    "system.runtime.compilerservices.visualc.dll",
    "system.runtime.dll",
    "system.runtime.extensions.dll",
    "system.runtime.handles.dll",
    "system.runtime.interopservices.dll",
    "system.runtime.interopservices.runtimeinformation.dll",
    "system.runtime.numerics.dll",
    "system.runtime.serialization.dll",
    "system.runtime.serialization.formatters.dll",
    "system.runtime.serialization.json.dll",
    "system.runtime.serialization.primitives.dll",
    "system.runtime.serialization.xml.dll",
    "system.security.claims.dll",
    "system.security.cryptography.algorithms.dll",
    "system.security.cryptography.csp.dll",
    "system.security.cryptography.encoding.dll",
    "system.security.cryptography.primitives.dll",
    "system.security.cryptography.x509certificates.dll",
    "system.security.principal.dll",
    "system.security.securestring.dll",
    "system.servicemodel.web.dll",
    "system.text.encoding.dll",
    "system.text.encoding.extensions.dll",
    "system.text.regularexpressions.dll",
    "system.threading.dll",
    "system.threading.overlapped.dll",
    "system.threading.tasks.dll",
    "system.threading.tasks.extensions.dll",
    "system.threading.tasks.parallel.dll",
    "system.threading.thread.dll",
    "system.threading.threadpool.dll",
    "system.threading.timer.dll",
    "system.transactions.dll",
    "system.valuetuple.dll",
    "system.web.dll",
    "system.windows.dll",
    "system.xml.dll",
    "system.xml.linq.dll",
    "system.xml.readerwriter.dll",
    "system.xml.serialization.dll",
    "system.xml.xdocument.dll",
    "system.xml.xmldocument.dll",
    "system.xml.xmlserializer.dll",
    "system.xml.xpath.dll",
    "system.xml.xpath.xdocument.dll",
];

static LOOKUP: OnceLock<HashSet<&'static str>> = OnceLock::new();

/// Whether the host runtime already provides a module with this file name.
pub fn is_provided_by_runtime(file_name: &str) -> bool {
    let lookup = LOOKUP.get_or_init(|| RUNTIME_PROVIDED.iter().copied().collect());
    lookup.contains(file_name.to_ascii_lowercase().as_str())
}
