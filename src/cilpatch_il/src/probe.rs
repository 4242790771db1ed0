use std::path::Path;

use dotscope::metadata::cilobject::CilObject;

use crate::errors::Result;

/// Full names of the type definitions in an on-disk managed binary.
///
/// Non-managed or unreadable files come back as `Err`; callers deciding which
/// candidate assemblies need patching treat that as "skip this file".
pub fn probe_type_names(path: &Path) -> Result<Vec<String>> {
    let obj = CilObject::from_file(path)?;
    let mut names = Vec::new();
    let types = obj.types();
    for entry in types.iter() {
        let t = entry.value();
        let ns = &t.namespace;
        let name = &t.name;
        names.push(if ns.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", ns, name)
        });
    }
    Ok(names)
}
