use cilpatch_model::{CustomAttribute, FieldId, MethodId, ModuleGraph, PropertyId, TypeId};

use crate::attrs;

/// First parameter name that marks a static plug method as standing in for
/// an instance method of the target.
pub const THIS_PARAMETER: &str = "aThis";

/// Plug method names reserved for constructor matching.
pub const CTOR_NAME: &str = "Ctor";
pub const CCTOR_NAME: &str = "CCtor";

pub fn is_instance_plug(graph: &ModuleGraph, plug: MethodId) -> bool {
    let m = graph.method(plug);
    m.is_static() && m.params.first().is_some_and(|p| p.name == THIS_PARAMETER)
}

/// The name a plug member targets: the plug-member attribute's `Target` /
/// `TargetName` argument when given, the member's own name otherwise.
pub fn member_target_name(
    graph: &ModuleGraph,
    attributes: &[CustomAttribute],
    own_name: &str,
) -> String {
    attrs::find_attribute(graph, attributes, attrs::PLUG_MEMBER_ATTRIBUTE)
        .and_then(|attr| attrs::target_name_argument(graph, attr))
        .unwrap_or_else(|| own_name.to_string())
}

/// Finds the target method a plug method replaces.
///
/// Matching is by name (with `Ctor` / `CCtor` standing for the instance and
/// static constructors), by arity after dropping a leading `aThis`, and by
/// element-wise equality of parameter-type full names. The first match in
/// declaration order wins.
pub fn find_target_method(
    graph: &ModuleGraph,
    target_type: TypeId,
    plug: MethodId,
    name: &str,
) -> Option<MethodId> {
    let shift = usize::from(is_instance_plug(graph, plug));
    let want: Vec<String> = graph
        .method(plug)
        .params
        .iter()
        .skip(shift)
        .map(|p| p.ty.full_name(graph))
        .collect();

    for &mid in &graph.ty(target_type).methods {
        let m = graph.method(mid);
        let name_matches = match name {
            CTOR_NAME => m.name == ".ctor" && !m.is_static(),
            CCTOR_NAME => m.name == ".cctor" && m.is_static(),
            _ => m.name == name,
        };
        if !name_matches || m.params.len() != want.len() {
            continue;
        }
        if m.params
            .iter()
            .zip(&want)
            .all(|(p, w)| p.ty.full_name(graph) == *w)
        {
            return Some(mid);
        }
    }
    None
}

pub fn find_target_property(
    graph: &ModuleGraph,
    target_type: TypeId,
    name: &str,
) -> Option<PropertyId> {
    graph
        .ty(target_type)
        .properties
        .iter()
        .copied()
        .find(|&p| graph.property(p).name == name)
}

pub fn find_target_field(graph: &ModuleGraph, target_type: TypeId, name: &str) -> Option<FieldId> {
    graph
        .ty(target_type)
        .fields
        .iter()
        .copied()
        .find(|&f| graph.field(f).name == name)
}

/// Same-name overloads on the target type, for the no-match diagnostic.
pub fn describe_candidates(graph: &ModuleGraph, target_type: TypeId, name: &str) -> String {
    let mut out = Vec::new();
    for &mid in &graph.ty(target_type).methods {
        let m = graph.method(mid);
        if m.name == name
            || (name == CTOR_NAME && m.name == ".ctor")
            || (name == CCTOR_NAME && m.name == ".cctor")
        {
            let kind = if m.is_static() { "static" } else { "instance" };
            out.push(format!("{}/{} ({kind})", m.name, m.params.len()));
        }
    }
    if out.is_empty() {
        "no same-name candidates".to_string()
    } else {
        out.join(", ")
    }
}
