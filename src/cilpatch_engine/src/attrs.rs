use cilpatch_model::{AttrValue, CustomAttribute, ModuleGraph};

/// Marks a type in a plug assembly as a plug; its argument names the target
/// type.
pub const PLUG_ATTRIBUTE: &str = "Cosmos.Build.API.Attributes.PlugAttribute";

/// Marks a member of a plug type as participating in patching.
pub const PLUG_MEMBER_ATTRIBUTE: &str = "Cosmos.Build.API.Attributes.PlugMemberAttribute";

/// Restricts a type or member to a subset of target architectures.
pub const PLATFORM_SPECIFIC_ATTRIBUTE: &str =
    "Cosmos.Build.API.Attributes.PlatformSpecificAttribute";

/// The engine recognizes attributes by full name only; it never depends on a
/// particular assembly supplying them.
pub fn find_attribute<'a>(
    graph: &ModuleGraph,
    attributes: &'a [CustomAttribute],
    full_name: &str,
) -> Option<&'a CustomAttribute> {
    attributes
        .iter()
        .find(|a| a.type_full_name(graph) == full_name)
}

/// String value of the named argument `Target`, falling back to `TargetName`.
pub fn target_name_argument(graph: &ModuleGraph, attr: &CustomAttribute) -> Option<String> {
    for name in ["Target", "TargetName"] {
        if let Some(value) = attr.named_arg(name)
            && let Some(s) = value.as_string(graph)
            && !s.is_empty()
        {
            return Some(s);
        }
    }
    None
}

pub fn named_int(attr: &CustomAttribute, name: &str) -> Option<i64> {
    attr.named_arg(name).and_then(AttrValue::as_int)
}
