use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::attributes::CustomAttribute;
use crate::graph::ModuleGraph;
use crate::handles::{InstrId, MethodId, TypeId};
use crate::il::Instruction;
use crate::ty::TypeRef;

bitflags! {
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
    pub struct MethodFlags: u32 {
        const STATIC = 1;
        const VIRTUAL = 1 << 1;
        const PUBLIC = 1 << 2;
        const PRIVATE = 1 << 3;
        const ABSTRACT = 1 << 4;
        const SPECIAL_NAME = 1 << 5;
        const RT_SPECIAL_NAME = 1 << 6;
        const PINVOKE_IMPL = 1 << 7;
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
    pub struct MethodImplFlags: u32 {
        const NATIVE = 1;
        const RUNTIME = 1 << 1;
        const UNMANAGED = 1 << 2;
        const INTERNAL_CALL = 1 << 3;
        const PRESERVE_SIG = 1 << 4;
        const NO_INLINING = 1 << 5;
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
    pub struct ParamFlags: u32 {
        const IN = 1;
        const OUT = 1 << 1;
        const OPTIONAL = 1 << 2;
    }
}

/// P/Invoke stub descriptor: the native module and entry point the runtime
/// would bind the method to.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PInvokeInfo {
    pub module: String,
    pub entry_point: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    #[serde(with = "bitflags::serde")]
    pub flags: MethodFlags,
    #[serde(with = "bitflags::serde")]
    pub impl_flags: MethodImplFlags,
    pub declaring: TypeId,
    pub return_type: TypeRef,
    pub params: Vec<Parameter>,
    pub body: Option<MethodBody>,
    pub attributes: Vec<CustomAttribute>,
    pub pinvoke: Option<PInvokeInfo>,
    pub overrides: Vec<MethodRef>,
}

impl MethodDef {
    /// A detached definition; `ModuleGraph::add_method` fills in `declaring`.
    pub fn new(name: &str, return_type: TypeRef) -> MethodDef {
        MethodDef {
            name: name.to_string(),
            flags: MethodFlags::empty(),
            impl_flags: MethodImplFlags::empty(),
            declaring: TypeId(0),
            return_type,
            params: Vec::new(),
            body: None,
            attributes: Vec::new(),
            pinvoke: None,
            overrides: Vec::new(),
        }
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == ".ctor" || self.name == ".cctor"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub index: u16,
    pub name: String,
    pub ty: TypeRef,
    #[serde(with = "bitflags::serde")]
    pub flags: ParamFlags,
}

impl Parameter {
    pub fn new(index: u16, name: &str, ty: TypeRef) -> Parameter {
        Parameter {
            index,
            name: name.to_string(),
            ty,
            flags: ParamFlags::empty(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodBody {
    pub instructions: Vec<Instruction>,
    pub locals: Vec<LocalVar>,
    pub exception_regions: Vec<ExceptionRegion>,
    pub max_stack: u16,
    pub init_locals: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalVar {
    pub index: u16,
    pub ty: TypeRef,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum HandlerKind {
    Catch,
    Filter,
    Finally,
    Fault,
}

/// Protected region of a method body. All positions are instruction
/// identities within the owning body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionRegion {
    pub kind: HandlerKind,
    pub try_start: InstrId,
    pub try_end: InstrId,
    pub handler_start: InstrId,
    pub handler_end: InstrId,
    pub catch_type: Option<TypeRef>,
    pub filter_start: Option<InstrId>,
}

/// A method reference: either a definition in the graph or an external
/// descriptor whose declaring type carries the assembly scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MethodRef {
    Def(MethodId),
    External(ExternalMethodRef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalMethodRef {
    pub declaring: TypeRef,
    pub name: String,
    pub return_type: TypeRef,
    pub params: Vec<TypeRef>,
    pub has_this: bool,
}

impl MethodRef {
    pub fn name<'a>(&'a self, graph: &'a ModuleGraph) -> &'a str {
        match self {
            MethodRef::Def(id) => &graph.method(*id).name,
            MethodRef::External(e) => &e.name,
        }
    }

    pub fn declaring_full_name(&self, graph: &ModuleGraph) -> String {
        match self {
            MethodRef::Def(id) => graph.type_full_name(graph.method(*id).declaring),
            MethodRef::External(e) => e.declaring.full_name(graph),
        }
    }
}
