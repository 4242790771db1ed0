use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::attributes::CustomAttribute;
use crate::graph::ModuleGraph;
use crate::handles::{FieldId, MethodId, ModuleId, PropertyId, TypeId};

/// Assembly name used for primitive type references built by the helpers below.
pub const CORLIB: &str = "System.Private.CoreLib";

bitflags! {
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
    pub struct TypeFlags: u32 {
        const INTERFACE = 1;
        const VALUE_TYPE = 1 << 1;
        const SEALED = 1 << 2;
        const ABSTRACT = 1 << 3;
        const GENERIC = 1 << 4;
    }
}

/// A type definition owned by a module in the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDef {
    pub namespace: String,
    pub name: String,
    #[serde(with = "bitflags::serde")]
    pub flags: TypeFlags,
    pub module: ModuleId,
    pub base: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub fields: Vec<FieldId>,
    pub methods: Vec<MethodId>,
    pub properties: Vec<PropertyId>,
    pub nested: Vec<TypeId>,
    pub enclosing: Option<TypeId>,
    pub attributes: Vec<CustomAttribute>,
}

/// A type reference as it appears in signatures and instruction operands.
///
/// `Def` points at a definition somewhere in the graph; `External` is an
/// unresolved handle scoped to a named assembly. The remaining variants are
/// structural and carry their components inline, which is what lets the
/// import layer rewrite a reference leaf by leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeRef {
    Def(TypeId),
    External(ExternalTypeRef),
    Pointer(Box<TypeRef>),
    ByRef(Box<TypeRef>),
    SzArray(Box<TypeRef>),
    GenericInst { head: Box<TypeRef>, args: Vec<TypeRef> },
    GenericParam { method: bool, index: u16 },
}

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ExternalTypeRef {
    pub assembly: String,
    pub full_name: String,
}

impl TypeRef {
    pub fn external(assembly: &str, full_name: &str) -> TypeRef {
        TypeRef::External(ExternalTypeRef {
            assembly: assembly.to_string(),
            full_name: full_name.to_string(),
        })
    }

    pub fn void() -> TypeRef {
        TypeRef::external(CORLIB, "System.Void")
    }

    pub fn boolean() -> TypeRef {
        TypeRef::external(CORLIB, "System.Boolean")
    }

    pub fn int32() -> TypeRef {
        TypeRef::external(CORLIB, "System.Int32")
    }

    pub fn int64() -> TypeRef {
        TypeRef::external(CORLIB, "System.Int64")
    }

    pub fn intptr() -> TypeRef {
        TypeRef::external(CORLIB, "System.IntPtr")
    }

    pub fn object() -> TypeRef {
        TypeRef::external(CORLIB, "System.Object")
    }

    pub fn string() -> TypeRef {
        TypeRef::external(CORLIB, "System.String")
    }

    /// Renders the reference the way metadata spells it: `Ns.Name`, nested
    /// types joined with `/`, and `*` / `&` / `[]` / `<...>` suffixes.
    pub fn full_name(&self, graph: &ModuleGraph) -> String {
        match self {
            TypeRef::Def(id) => graph.type_full_name(*id),
            TypeRef::External(e) => e.full_name.clone(),
            TypeRef::Pointer(inner) => format!("{}*", inner.full_name(graph)),
            TypeRef::ByRef(inner) => format!("{}&", inner.full_name(graph)),
            TypeRef::SzArray(inner) => format!("{}[]", inner.full_name(graph)),
            TypeRef::GenericInst { head, args } => {
                let args = args
                    .iter()
                    .map(|a| a.full_name(graph))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("{}<{}>", head.full_name(graph), args)
            }
            TypeRef::GenericParam { method: false, index } => format!("!{index}"),
            TypeRef::GenericParam { method: true, index } => format!("!!{index}"),
        }
    }
}
