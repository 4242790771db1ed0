use serde::{Deserialize, Serialize};

use crate::graph::ModuleGraph;
use crate::method::MethodRef;
use crate::ty::TypeRef;

/// A decoded custom attribute blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomAttribute {
    pub constructor: MethodRef,
    pub args: Vec<AttrValue>,
    pub named: Vec<NamedArg>,
}

impl CustomAttribute {
    pub fn new(constructor: MethodRef) -> CustomAttribute {
        CustomAttribute {
            constructor,
            args: Vec::new(),
            named: Vec::new(),
        }
    }

    /// Full name of the attribute type, taken from the constructor reference.
    pub fn type_full_name(&self, graph: &ModuleGraph) -> String {
        self.constructor.declaring_full_name(graph)
    }

    pub fn named_arg(&self, name: &str) -> Option<&AttrValue> {
        self.named.iter().find(|n| n.name == name).map(|n| &n.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedArg {
    pub name: String,
    pub value: AttrValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Type(TypeRef),
}

impl AttrValue {
    /// String form of the value where one exists: literal strings as-is,
    /// type references as their full name.
    pub fn as_string(&self, graph: &ModuleGraph) -> Option<String> {
        match self {
            AttrValue::Str(s) => Some(s.clone()),
            AttrValue::Type(t) => Some(t.full_name(graph)),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}
