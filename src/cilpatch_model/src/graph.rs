use serde::{Deserialize, Serialize};

use crate::field::FieldDef;
use crate::handles::{FieldId, InstrId, MethodId, ModuleId, PropertyId, TypeId};
use crate::il::{Instruction, OpCode, Operand};
use crate::method::MethodDef;
use crate::module::Module;
use crate::property::PropertyDef;
use crate::ty::{TypeDef, TypeFlags};

/// The mutable metadata graph a patch run operates on.
///
/// Entities live in flat arenas and are addressed by the handle types in
/// [`crate::handles`]; containment edges (module → type → member) are handle
/// lists on the owning entity, and all cross-edges are handles or structural
/// reference values. The graph also owns the instruction-id allocator, so an
/// instruction keeps its identity when a body is rebuilt around it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleGraph {
    modules: Vec<Module>,
    types: Vec<TypeDef>,
    methods: Vec<MethodDef>,
    fields: Vec<FieldDef>,
    properties: Vec<PropertyDef>,
    next_instr: u32,
}

impl ModuleGraph {
    pub fn new() -> ModuleGraph {
        ModuleGraph::default()
    }

    pub fn add_module(&mut self, name: &str, assembly_name: &str) -> ModuleId {
        let id = ModuleId(self.modules.len());
        self.modules.push(Module {
            name: name.to_string(),
            assembly_name: assembly_name.to_string(),
            types: Vec::new(),
            assembly_refs: Vec::new(),
            native_modules: Vec::new(),
        });
        id
    }

    pub fn add_type(
        &mut self,
        module: ModuleId,
        namespace: &str,
        name: &str,
        flags: TypeFlags,
    ) -> TypeId {
        let id = TypeId(self.types.len());
        self.types.push(TypeDef {
            namespace: namespace.to_string(),
            name: name.to_string(),
            flags,
            module,
            base: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            nested: Vec::new(),
            enclosing: None,
            attributes: Vec::new(),
        });
        debug_assert!(
            self.modules[module.0]
                .types
                .iter()
                .all(|&t| self.type_full_name(t) != self.type_full_name(id)),
            "duplicate type full name in module"
        );
        self.modules[module.0].types.push(id);
        id
    }

    pub fn add_method(&mut self, ty: TypeId, mut method: MethodDef) -> MethodId {
        let id = MethodId(self.methods.len());
        method.declaring = ty;
        self.methods.push(method);
        self.types[ty.0].methods.push(id);
        id
    }

    pub fn add_field(&mut self, ty: TypeId, mut field: FieldDef) -> FieldId {
        let id = FieldId(self.fields.len());
        field.declaring = ty;
        self.fields.push(field);
        self.types[ty.0].fields.push(id);
        id
    }

    pub fn add_property(&mut self, ty: TypeId, mut property: PropertyDef) -> PropertyId {
        let id = PropertyId(self.properties.len());
        property.declaring = ty;
        self.properties.push(property);
        self.types[ty.0].properties.push(id);
        id
    }

    /// A fresh instruction with a graph-unique identity.
    pub fn new_instr(&mut self, op: OpCode, operand: Operand) -> Instruction {
        let id = InstrId(self.next_instr);
        self.next_instr += 1;
        Instruction::new(id, op, operand)
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.0]
    }

    pub fn ty(&self, id: TypeId) -> &TypeDef {
        &self.types[id.0]
    }

    pub fn ty_mut(&mut self, id: TypeId) -> &mut TypeDef {
        &mut self.types[id.0]
    }

    pub fn method(&self, id: MethodId) -> &MethodDef {
        &self.methods[id.0]
    }

    pub fn method_mut(&mut self, id: MethodId) -> &mut MethodDef {
        &mut self.methods[id.0]
    }

    pub fn field(&self, id: FieldId) -> &FieldDef {
        &self.fields[id.0]
    }

    pub fn field_mut(&mut self, id: FieldId) -> &mut FieldDef {
        &mut self.fields[id.0]
    }

    pub fn property(&self, id: PropertyId) -> &PropertyDef {
        &self.properties[id.0]
    }

    pub fn property_mut(&mut self, id: PropertyId) -> &mut PropertyDef {
        &mut self.properties[id.0]
    }

    /// Full name of a type definition, nested types joined with `/`.
    pub fn type_full_name(&self, id: TypeId) -> String {
        let ty = &self.types[id.0];
        if let Some(enclosing) = ty.enclosing {
            return format!("{}/{}", self.type_full_name(enclosing), ty.name);
        }
        if ty.namespace.is_empty() {
            ty.name.clone()
        } else {
            format!("{}.{}", ty.namespace, ty.name)
        }
    }

    /// Looks a type definition up by full name within one module.
    pub fn find_type(&self, module: ModuleId, full_name: &str) -> Option<TypeId> {
        self.modules[module.0]
            .types
            .iter()
            .copied()
            .find(|&t| self.type_full_name(t) == full_name)
    }

    pub fn type_module(&self, id: TypeId) -> ModuleId {
        self.types[id.0].module
    }

    pub fn method_module(&self, id: MethodId) -> ModuleId {
        self.type_module(self.methods[id.0].declaring)
    }

    pub fn field_module(&self, id: FieldId) -> ModuleId {
        self.type_module(self.fields[id.0].declaring)
    }
}
