pub mod attributes;
pub mod field;
pub mod graph;
pub mod handles;
pub mod il;
pub mod method;
pub mod module;
pub mod property;
pub mod ty;

pub use attributes::{AttrValue, CustomAttribute, NamedArg};
pub use field::{Constant, ExternalFieldRef, FieldDef, FieldFlags, FieldRef};
pub use graph::ModuleGraph;
pub use handles::{FieldId, InstrId, MethodId, ModuleId, PropertyId, TypeId};
pub use il::{CallSite, Instruction, OpCode, Operand, OperandKind};
pub use method::{
    ExceptionRegion, ExternalMethodRef, HandlerKind, LocalVar, MethodBody, MethodDef, MethodFlags,
    MethodImplFlags, MethodRef, PInvokeInfo, ParamFlags, Parameter,
};
pub use module::{AssemblyRef, Module};
pub use property::PropertyDef;
pub use ty::{ExternalTypeRef, TypeDef, TypeFlags, TypeRef, CORLIB};
