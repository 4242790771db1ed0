use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use cilpatch_model::{CustomAttribute, ModuleGraph, TypeId};

use cilpatch_il::probe_type_names;

use crate::arch;
use crate::attrs;
use crate::diagnostics::DiagnosticCode;
use crate::errors::PatchError;
use crate::session::PatchSession;

/// Walks the plug modules and maps each declared target type name to the
/// plug types that claim it, in declaration order.
///
/// Types filtered out by the architecture selector never make it into the
/// map; plugs whose attribute yields no readable target name are dropped
/// with a warning.
pub fn scan_plugs(session: &mut PatchSession) -> BTreeMap<String, Vec<TypeId>> {
    let mut map: BTreeMap<String, Vec<TypeId>> = BTreeMap::new();
    let plug_modules = session.plugs.clone();
    for module in plug_modules {
        let types = session.graph.module(module).types.clone();
        for ty in types {
            if !arch::include_type(session.graph, ty, session.arch) {
                continue;
            }
            let resolved = {
                let attributes = &session.graph.ty(ty).attributes;
                match attrs::find_attribute(session.graph, attributes, attrs::PLUG_ATTRIBUTE) {
                    None => continue,
                    Some(attr) => resolve_target_name(session.graph, attr),
                }
            };
            match resolved {
                Some(name) => {
                    log::debug!(
                        "plug {} targets {name}",
                        session.graph.type_full_name(ty)
                    );
                    map.entry(name).or_default().push(ty);
                }
                None => {
                    let plug_name = session.graph.type_full_name(ty);
                    session.warn(
                        DiagnosticCode::AmbiguousTargetName,
                        format!("plug {plug_name} declares no readable target name; dropped"),
                    );
                }
            }
        }
    }
    map
}

/// Resolution order for the plug attribute's target name: a single
/// positional argument (and nothing named), then the named `Target`, then
/// `TargetName`.
fn resolve_target_name(graph: &ModuleGraph, attr: &CustomAttribute) -> Option<String> {
    if attr.args.len() == 1 && attr.named.is_empty() {
        if let Some(name) = attr.args[0].as_string(graph)
            && !name.is_empty()
        {
            return Some(name);
        }
        return None;
    }
    attrs::target_name_argument(graph, attr)
}

/// Reports which candidate assemblies in `dir` declare at least one type
/// named as a patch target. Files the metadata prober cannot read are
/// silently skipped.
pub fn candidates_needing_patch(
    dir: &Path,
    target_names: &BTreeSet<String>,
) -> Result<Vec<PathBuf>, PatchError> {
    let entries = fs::read_dir(dir).map_err(|source| PatchError::CandidateScan {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| PatchError::CandidateScan {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut needing = Vec::new();
    for path in paths {
        match probe_type_names(&path) {
            Ok(names) => {
                if names.iter().any(|n| target_names.contains(n)) {
                    needing.push(path);
                }
            }
            Err(err) => {
                log::debug!("skipping unreadable candidate {}: {err}", path.display());
            }
        }
    }
    Ok(needing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::ArchSelector;
    use cilpatch_model::{
        AttrValue, ExternalMethodRef, MethodRef, NamedArg, TypeFlags, TypeRef,
    };

    fn plug_attr() -> CustomAttribute {
        CustomAttribute::new(MethodRef::External(ExternalMethodRef {
            declaring: TypeRef::external(
                "Cosmos.Build.API",
                "Cosmos.Build.API.Attributes.PlugAttribute",
            ),
            name: ".ctor".to_string(),
            return_type: TypeRef::void(),
            params: Vec::new(),
            has_this: true,
        }))
    }

    #[test]
    fn positional_argument_wins_over_nothing() {
        let mut graph = ModuleGraph::new();
        let target = graph.add_module("Target.dll", "Target");
        let plugs = graph.add_module("Plugs.dll", "Plugs");
        let ty = graph.add_type(plugs, "P", "TPlug", TypeFlags::empty());
        let mut attr = plug_attr();
        attr.args.push(AttrValue::Str("N.T".to_string()));
        graph.ty_mut(ty).attributes.push(attr);

        let mut session = PatchSession::new(&mut graph, target, ArchSelector::Any, &[plugs]);
        let map = scan_plugs(&mut session);
        assert_eq!(map.get("N.T"), Some(&vec![ty]));
    }

    #[test]
    fn positional_type_reference_is_rendered_to_a_full_name() {
        let mut graph = ModuleGraph::new();
        let target = graph.add_module("Target.dll", "Target");
        let plugs = graph.add_module("Plugs.dll", "Plugs");
        let ty = graph.add_type(plugs, "P", "TPlug", TypeFlags::empty());
        let mut attr = plug_attr();
        attr.args.push(AttrValue::Type(TypeRef::external("Target", "N.T")));
        graph.ty_mut(ty).attributes.push(attr);

        let mut session = PatchSession::new(&mut graph, target, ArchSelector::Any, &[plugs]);
        let map = scan_plugs(&mut session);
        assert_eq!(map.get("N.T"), Some(&vec![ty]));
    }

    #[test]
    fn named_target_beats_target_name() {
        let mut graph = ModuleGraph::new();
        let target = graph.add_module("Target.dll", "Target");
        let plugs = graph.add_module("Plugs.dll", "Plugs");
        let ty = graph.add_type(plugs, "P", "TPlug", TypeFlags::empty());
        let mut attr = plug_attr();
        attr.named.push(NamedArg {
            name: "TargetName".to_string(),
            value: AttrValue::Str("N.Second".to_string()),
        });
        attr.named.push(NamedArg {
            name: "Target".to_string(),
            value: AttrValue::Str("N.First".to_string()),
        });
        graph.ty_mut(ty).attributes.push(attr);

        let mut session = PatchSession::new(&mut graph, target, ArchSelector::Any, &[plugs]);
        let map = scan_plugs(&mut session);
        assert!(map.contains_key("N.First"));
        assert!(!map.contains_key("N.Second"));
    }

    #[test]
    fn unreadable_plug_is_dropped_with_a_warning() {
        let mut graph = ModuleGraph::new();
        let target = graph.add_module("Target.dll", "Target");
        let plugs = graph.add_module("Plugs.dll", "Plugs");
        let ty = graph.add_type(plugs, "P", "TPlug", TypeFlags::empty());
        graph.ty_mut(ty).attributes.push(plug_attr());

        let mut session = PatchSession::new(&mut graph, target, ArchSelector::Any, &[plugs]);
        let map = scan_plugs(&mut session);
        assert!(map.is_empty());
        assert_eq!(
            session
                .diagnostics
                .of_code(DiagnosticCode::AmbiguousTargetName)
                .count(),
            1
        );
    }

    #[test]
    fn arch_excluded_plug_types_are_not_scanned() {
        let mut graph = ModuleGraph::new();
        let target = graph.add_module("Target.dll", "Target");
        let plugs = graph.add_module("Plugs.dll", "Plugs");
        let ty = graph.add_type(plugs, "P", "TPlug", TypeFlags::empty());
        let mut attr = plug_attr();
        attr.args.push(AttrValue::Str("N.T".to_string()));
        graph.ty_mut(ty).attributes.push(attr);

        let platform_ctor = MethodRef::External(ExternalMethodRef {
            declaring: TypeRef::external(
                "Cosmos.Build.API",
                "Cosmos.Build.API.Attributes.PlatformSpecificAttribute",
            ),
            name: ".ctor".to_string(),
            return_type: TypeRef::void(),
            params: Vec::new(),
            has_this: true,
        });
        let mut platform = CustomAttribute::new(platform_ctor);
        platform.named.push(NamedArg {
            name: "Architecture".to_string(),
            value: AttrValue::Int(1),
        });
        graph.ty_mut(ty).attributes.push(platform);

        let mut session = PatchSession::new(&mut graph, target, ArchSelector::Arm64, &[plugs]);
        assert!(scan_plugs(&mut session).is_empty());
    }

    #[test]
    fn empty_candidate_directory_yields_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let targets: BTreeSet<String> = ["N.T".to_string()].into();
        let found = candidates_needing_patch(dir.path(), &targets).expect("scan");
        assert!(found.is_empty());
    }

    #[test]
    fn non_managed_files_are_silently_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("not-a-pe.dll"), b"plain text").expect("write");
        let targets: BTreeSet<String> = ["N.T".to_string()].into();
        let found = candidates_needing_patch(dir.path(), &targets).expect("scan");
        assert!(found.is_empty());
    }

    #[test]
    fn missing_directory_is_fatal() {
        let targets: BTreeSet<String> = BTreeSet::new();
        let err = candidates_needing_patch(Path::new("/nonexistent/candidates"), &targets);
        assert!(matches!(err, Err(PatchError::CandidateScan { .. })));
    }
}
