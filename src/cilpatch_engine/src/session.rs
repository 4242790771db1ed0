use cilpatch_model::{ModuleGraph, ModuleId};

use crate::arch::ArchSelector;
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollection};

/// Per-run patching session.
///
/// Owns everything that is mutable for the duration of a run: the module
/// graph, the selector, and the accumulated diagnostics. Components receive
/// a mutable borrow of the session instead of keeping state of their own.
pub struct PatchSession<'g> {
    pub graph: &'g mut ModuleGraph,
    pub target: ModuleId,
    pub plugs: Vec<ModuleId>,
    pub arch: ArchSelector,
    pub diagnostics: DiagnosticCollection,
}

impl<'g> PatchSession<'g> {
    pub fn new(
        graph: &'g mut ModuleGraph,
        target: ModuleId,
        arch: ArchSelector,
        plugs: &[ModuleId],
    ) -> PatchSession<'g> {
        PatchSession {
            graph,
            target,
            plugs: plugs.to_vec(),
            arch,
            diagnostics: DiagnosticCollection::new(),
        }
    }

    pub fn target_assembly_name(&self) -> &str {
        &self.graph.module(self.target).assembly_name
    }

    pub fn warn(&mut self, code: DiagnosticCode, message: String) {
        log::warn!("{code}: {message}");
        self.diagnostics.add_warning(code, message);
    }

    pub fn error(&mut self, code: DiagnosticCode, message: String) {
        log::error!("{code}: {message}");
        self.diagnostics.add_error(code, message);
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}: {}", diagnostic.code, diagnostic.message);
        self.diagnostics.add(diagnostic);
    }
}
