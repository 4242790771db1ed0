use serde::{Deserialize, Serialize};

use crate::handles::TypeId;

/// Entry in a module's external-assembly reference table.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct AssemblyRef {
    pub name: String,
    pub version: Option<String>,
}

impl AssemblyRef {
    pub fn new(name: &str) -> AssemblyRef {
        AssemblyRef {
            name: name.to_string(),
            version: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub assembly_name: String,
    pub types: Vec<TypeId>,
    pub assembly_refs: Vec<AssemblyRef>,
    /// Native modules named by P/Invoke stubs (the ModuleRef table).
    pub native_modules: Vec<String>,
}
