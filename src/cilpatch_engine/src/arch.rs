use bitflags::bitflags;

use cilpatch_model::{CustomAttribute, ModuleGraph, TypeId};

use crate::attrs;

bitflags! {
    /// Target architectures a plug type or member may be restricted to.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
    pub struct Architecture: u8 {
        const X64 = 1;
        const ARM64 = 1 << 1;
        const RISCV64 = 1 << 2;
    }
}

/// The architecture a build is patching for. `Any` (and any selector the
/// attribute mask does not know about) includes everything.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum ArchSelector {
    #[default]
    Any,
    X64,
    Arm64,
    Riscv64,
}

impl ArchSelector {
    pub fn mask(self) -> Option<Architecture> {
        match self {
            ArchSelector::Any => None,
            ArchSelector::X64 => Some(Architecture::X64),
            ArchSelector::Arm64 => Some(Architecture::ARM64),
            ArchSelector::Riscv64 => Some(Architecture::RISCV64),
        }
    }
}

/// Decision carried by a platform-specific attribute, if one is present.
/// `None` means the annotated entity is platform-agnostic.
fn attribute_decision(
    graph: &ModuleGraph,
    attributes: &[CustomAttribute],
    selector: ArchSelector,
) -> Option<bool> {
    let attr = attrs::find_attribute(graph, attributes, attrs::PLATFORM_SPECIFIC_ATTRIBUTE)?;
    let Some(mask) = selector.mask() else {
        return Some(true);
    };
    let allowed = attrs::named_int(attr, "Architecture").unwrap_or(0);
    let allowed = Architecture::from_bits_truncate(allowed as u8);
    Some(allowed.intersects(mask))
}

pub fn include_type(graph: &ModuleGraph, ty: TypeId, selector: ArchSelector) -> bool {
    attribute_decision(graph, &graph.ty(ty).attributes, selector).unwrap_or(true)
}

/// A member without its own platform attribute inherits the declaring type's
/// decision.
pub fn include_member(
    graph: &ModuleGraph,
    attributes: &[CustomAttribute],
    type_decision: bool,
    selector: ArchSelector,
) -> bool {
    attribute_decision(graph, attributes, selector).unwrap_or(type_decision)
}
