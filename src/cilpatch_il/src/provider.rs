use std::fs;
use std::path::Path;

use cilpatch_model::ModuleGraph;

use crate::errors::Result;

/// The metadata I/O collaborator the patching engine is written against.
///
/// Implementations own the on-disk format; the engine only ever sees the
/// loaded [`ModuleGraph`]. The ECMA-335 PE codec lives behind this trait in
/// the build toolchain; [`JsonAssemblyIo`] below is the in-tree reference
/// implementation.
pub trait AssemblyIo {
    fn load(&mut self, path: &Path) -> Result<ModuleGraph>;
    fn save(&mut self, graph: &ModuleGraph, path: &Path) -> Result<()>;
}

/// Persists the serde form of the module graph. Loading a saved graph yields
/// a structurally identical graph, which is what the round-trip guarantees of
/// the engine are stated against.
#[derive(Debug, Default)]
pub struct JsonAssemblyIo;

impl JsonAssemblyIo {
    pub fn new() -> JsonAssemblyIo {
        JsonAssemblyIo
    }
}

impl AssemblyIo for JsonAssemblyIo {
    fn load(&mut self, path: &Path) -> Result<ModuleGraph> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn save(&mut self, graph: &ModuleGraph, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(graph)?;
        fs::write(path, text)?;
        Ok(())
    }
}
