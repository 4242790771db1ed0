use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::attributes::CustomAttribute;
use crate::handles::{FieldId, TypeId};
use crate::ty::TypeRef;

bitflags! {
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
    pub struct FieldFlags: u32 {
        const STATIC = 1;
        const INIT_ONLY = 1 << 1;
        const LITERAL = 1 << 2;
        const PUBLIC = 1 << 3;
        const PRIVATE = 1 << 4;
    }
}

/// Compile-time constant attached to a literal field or a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Null,
    Bool(bool),
    I4(i32),
    I8(i64),
    R8(f64),
    Str(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(with = "bitflags::serde")]
    pub flags: FieldFlags,
    pub declaring: TypeId,
    pub ty: TypeRef,
    pub constant: Option<Constant>,
    /// Raw bytes backing a field with an RVA-mapped initial value.
    pub initial_value: Option<Vec<u8>>,
    pub marshal: Option<String>,
    pub attributes: Vec<CustomAttribute>,
}

impl FieldDef {
    pub fn new(name: &str, ty: TypeRef) -> FieldDef {
        FieldDef {
            name: name.to_string(),
            flags: FieldFlags::empty(),
            declaring: TypeId(0),
            ty,
            constant: None,
            initial_value: None,
            marshal: None,
            attributes: Vec::new(),
        }
    }

}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldRef {
    Def(FieldId),
    External(ExternalFieldRef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalFieldRef {
    pub declaring: TypeRef,
    pub name: String,
    pub field_type: TypeRef,
}
