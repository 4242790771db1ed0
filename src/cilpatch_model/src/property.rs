use serde::{Deserialize, Serialize};

use crate::attributes::CustomAttribute;
use crate::field::Constant;
use crate::handles::{MethodId, TypeId};
use crate::method::Parameter;
use crate::ty::TypeRef;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    pub declaring: TypeId,
    pub ty: TypeRef,
    pub getter: Option<MethodId>,
    pub setter: Option<MethodId>,
    /// Indexer parameters; empty for plain properties.
    pub params: Vec<Parameter>,
    pub constant: Option<Constant>,
    pub attributes: Vec<CustomAttribute>,
}

impl PropertyDef {
    pub fn new(name: &str, ty: TypeRef) -> PropertyDef {
        PropertyDef {
            name: name.to_string(),
            declaring: TypeId(0),
            ty,
            getter: None,
            setter: None,
            params: Vec::new(),
            constant: None,
            attributes: Vec::new(),
        }
    }
}
