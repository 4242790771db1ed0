use engine::{patch, ArchSelector};
use model::{
    FieldDef, FieldFlags, FieldId, FieldRef, MethodId, ModuleGraph, ModuleId, OpCode, Operand,
    PropertyDef, PropertyId, TypeFlags, TypeId, TypeRef,
};

use crate::common::{assemblies, body, method, plug_attribute, plug_member_attribute};

struct PropertyFixture {
    ty: TypeId,
    backing: FieldId,
    getter: MethodId,
    setter: MethodId,
    property: PropertyId,
}

/// A static int property over a static backing field, the shape compilers
/// emit for auto-properties.
fn static_property(
    graph: &mut ModuleGraph,
    module: ModuleId,
    namespace: &str,
    type_name: &str,
) -> PropertyFixture {
    let ty = graph.add_type(module, namespace, type_name, TypeFlags::empty());
    let mut backing = FieldDef::new("_value", TypeRef::int32());
    backing.flags |= FieldFlags::STATIC | FieldFlags::PRIVATE;
    let backing = graph.add_field(ty, backing);

    let mut getter = method("get_Value", true, TypeRef::int32(), &[]);
    getter.body = Some(body(
        graph,
        &[
            (OpCode::Ldsfld, Operand::Field(FieldRef::Def(backing))),
            (OpCode::Ret, Operand::None),
        ],
    ));
    let getter = graph.add_method(ty, getter);

    let mut setter = method("set_Value", true, TypeRef::void(), &[("value", TypeRef::int32())]);
    setter.body = Some(body(
        graph,
        &[
            (OpCode::Ldarg, Operand::Param(0)),
            (OpCode::Stsfld, Operand::Field(FieldRef::Def(backing))),
            (OpCode::Ret, Operand::None),
        ],
    ));
    let setter = graph.add_method(ty, setter);

    let mut property = PropertyDef::new("Value", TypeRef::int32());
    property.getter = Some(getter);
    property.setter = Some(setter);
    let property = graph.add_property(ty, property);

    PropertyFixture {
        ty,
        backing,
        getter,
        setter,
        property,
    }
}

#[test]
fn property_plug_redirects_accessors_to_the_target_backing_field() {
    let mut fx = assemblies();
    let target = static_property(&mut fx.graph, fx.target, "N", "S");
    let plug = static_property(&mut fx.graph, fx.plugs, "P", "SPlug");
    fx.graph
        .ty_mut(plug.ty)
        .attributes
        .push(plug_attribute("N.S"));
    fx.graph
        .property_mut(plug.property)
        .attributes
        .push(plug_member_attribute());

    let outcome = patch(&mut fx.graph, fx.target, ArchSelector::Any, &[fx.plugs]).expect("patch");
    assert_eq!(outcome.members_patched, 1);
    assert!(!outcome.diagnostics.has_errors());

    // Every field access in both cloned accessors targets the *target's*
    // backing field, with the static opcode forms.
    for accessor in [target.getter, target.setter] {
        let accessor_body = fx.graph.method(accessor).body.as_ref().expect("body");
        for instr in &accessor_body.instructions {
            if let Operand::Field(field) = &instr.operand {
                assert_eq!(field, &FieldRef::Def(target.backing));
                assert!(matches!(instr.op, OpCode::Ldsfld | OpCode::Stsfld));
            }
        }
    }
    let getter_body = fx.graph.method(target.getter).body.as_ref().expect("body");
    assert!(getter_body
        .instructions
        .iter()
        .any(|i| i.op == OpCode::Ldsfld));
}

#[test]
fn property_plug_requires_both_accessors() {
    let mut fx = assemblies();
    let target = static_property(&mut fx.graph, fx.target, "N", "S");
    fx.graph.property_mut(target.property).setter = None;

    let plug = static_property(&mut fx.graph, fx.plugs, "P", "SPlug");
    fx.graph
        .ty_mut(plug.ty)
        .attributes
        .push(plug_attribute("N.S"));
    fx.graph
        .property_mut(plug.property)
        .attributes
        .push(plug_member_attribute());

    let outcome = patch(&mut fx.graph, fx.target, ArchSelector::Any, &[fx.plugs]).expect("patch");
    assert_eq!(outcome.members_patched, 0);
    assert_eq!(outcome.members_skipped, 1);
    assert!(outcome.diagnostics.has_errors());
}

#[test]
fn instance_property_accessors_use_instance_opcodes() {
    let mut fx = assemblies();

    // Instance property over an instance backing field on the target side.
    let target_ty = fx.graph.add_type(fx.target, "N", "I", TypeFlags::empty());
    let mut backing = FieldDef::new("_value", TypeRef::int32());
    backing.flags |= FieldFlags::PRIVATE;
    let target_backing = fx.graph.add_field(target_ty, backing);
    let mut getter = method("get_Value", false, TypeRef::int32(), &[]);
    getter.body = Some(body(
        &mut fx.graph,
        &[
            (OpCode::Ldarg, Operand::Imm(0)),
            (OpCode::Ldfld, Operand::Field(FieldRef::Def(target_backing))),
            (OpCode::Ret, Operand::None),
        ],
    ));
    let getter = fx.graph.add_method(target_ty, getter);
    let mut setter = method("set_Value", false, TypeRef::void(), &[("value", TypeRef::int32())]);
    setter.body = Some(body(
        &mut fx.graph,
        &[
            (OpCode::Ldarg, Operand::Imm(0)),
            (OpCode::Ldarg, Operand::Param(0)),
            (OpCode::Stfld, Operand::Field(FieldRef::Def(target_backing))),
            (OpCode::Ret, Operand::None),
        ],
    ));
    let setter = fx.graph.add_method(target_ty, setter);
    let mut property = PropertyDef::new("Value", TypeRef::int32());
    property.getter = Some(getter);
    property.setter = Some(setter);
    fx.graph.add_property(target_ty, property);

    let plug = static_property(&mut fx.graph, fx.plugs, "P", "IPlug");
    fx.graph
        .ty_mut(plug.ty)
        .attributes
        .push(plug_attribute("N.I"));
    fx.graph
        .property_mut(plug.property)
        .attributes
        .push(plug_member_attribute());

    patch(&mut fx.graph, fx.target, ArchSelector::Any, &[fx.plugs]).expect("patch");

    // The enclosing accessors are instance methods, so redirected accesses
    // use ldfld/stfld.
    let getter_body = fx.graph.method(getter).body.as_ref().expect("body");
    assert!(getter_body.instructions.iter().any(|i| i.op == OpCode::Ldfld));
    let setter_body = fx.graph.method(setter).body.as_ref().expect("body");
    assert!(setter_body.instructions.iter().any(|i| i.op == OpCode::Stfld));
}
