use engine::{patch, ArchSelector, DiagnosticCode};
use model::{
    Constant, ExternalMethodRef, FieldDef, FieldFlags, FieldRef, MethodRef, OpCode, Operand,
    TypeFlags, TypeRef,
};

use crate::common::{assemblies, body, method, plug_attribute, plug_member_attribute};

fn object_ctor() -> Operand {
    Operand::Method(MethodRef::External(ExternalMethodRef {
        declaring: TypeRef::object(),
        name: ".ctor".to_string(),
        return_type: TypeRef::void(),
        params: Vec::new(),
        has_this: true,
    }))
}

#[test]
fn field_plug_copies_definition_and_splices_initializers() {
    let mut fx = assemblies();
    let target_ty = fx.graph.add_type(fx.target, "N", "C", TypeFlags::empty());
    fx.graph.ty_mut(target_ty).base = Some(TypeRef::object());
    let target_field = fx
        .graph
        .add_field(target_ty, FieldDef::new("Count", TypeRef::int32()));
    let mut ctor = method(".ctor", false, TypeRef::void(), &[]);
    ctor.body = Some(body(
        &mut fx.graph,
        &[
            (OpCode::Ldarg, Operand::Imm(0)),
            (OpCode::Call, object_ctor()),
            (OpCode::Ldarg, Operand::Imm(0)),
            (OpCode::LdcI4, Operand::Imm(0)),
            (OpCode::Stfld, Operand::Field(FieldRef::Def(target_field))),
            (OpCode::Ret, Operand::None),
        ],
    ));
    let ctor = fx.graph.add_method(target_ty, ctor);
    let replaced_id = fx.graph.method(ctor).body.as_ref().unwrap().instructions[3].id;

    let plug_ty = fx.graph.add_type(fx.plugs, "P", "CPlug", TypeFlags::empty());
    fx.graph.ty_mut(plug_ty).attributes.push(plug_attribute("N.C"));
    let mut plug_field = FieldDef::new("Count", TypeRef::int32());
    plug_field.flags |= FieldFlags::INIT_ONLY;
    plug_field.constant = Some(Constant::I4(42));
    plug_field.attributes.push(plug_member_attribute());
    let plug_field = fx.graph.add_field(plug_ty, plug_field);
    let mut plug_ctor = method(".ctor", false, TypeRef::void(), &[]);
    plug_ctor.body = Some(body(
        &mut fx.graph,
        &[
            (OpCode::Ldarg, Operand::Imm(0)),
            (OpCode::LdcI4, Operand::Imm(42)),
            (OpCode::Stfld, Operand::Field(FieldRef::Def(plug_field))),
            (OpCode::Ret, Operand::None),
        ],
    ));
    fx.graph.add_method(plug_ty, plug_ctor);

    let outcome = patch(&mut fx.graph, fx.target, ArchSelector::Any, &[fx.plugs]).expect("patch");
    assert_eq!(outcome.members_patched, 1);

    // Definition copied.
    let patched = fx.graph.field(target_field);
    assert!(patched.flags.contains(FieldFlags::INIT_ONLY));
    assert_eq!(patched.constant, Some(Constant::I4(42)));

    // The value-producing instruction before the store now pushes the plug's
    // initializer, under the replaced instruction's identity.
    let ctor_body = fx.graph.method(ctor).body.as_ref().expect("body");
    assert_eq!(ctor_body.instructions[3].op, OpCode::LdcI4);
    assert_eq!(ctor_body.instructions[3].operand, Operand::Imm(42));
    assert_eq!(ctor_body.instructions[3].id, replaced_id);
    // The store itself is untouched.
    assert_eq!(
        ctor_body.instructions[4].operand,
        Operand::Field(FieldRef::Def(target_field))
    );
}

#[test]
fn missing_initializer_store_is_skipped_with_a_diagnostic() {
    let mut fx = assemblies();
    let target_ty = fx.graph.add_type(fx.target, "N", "C", TypeFlags::empty());
    fx.graph
        .add_field(target_ty, FieldDef::new("Count", TypeRef::int32()));
    // Target constructor never stores to the field.
    let mut ctor = method(".ctor", false, TypeRef::void(), &[]);
    ctor.body = Some(body(&mut fx.graph, &[(OpCode::Ret, Operand::None)]));
    fx.graph.add_method(target_ty, ctor);

    let plug_ty = fx.graph.add_type(fx.plugs, "P", "CPlug", TypeFlags::empty());
    fx.graph.ty_mut(plug_ty).attributes.push(plug_attribute("N.C"));
    let mut plug_field = FieldDef::new("Count", TypeRef::int32());
    plug_field.attributes.push(plug_member_attribute());
    let plug_field = fx.graph.add_field(plug_ty, plug_field);
    let mut plug_ctor = method(".ctor", false, TypeRef::void(), &[]);
    plug_ctor.body = Some(body(
        &mut fx.graph,
        &[
            (OpCode::Ldarg, Operand::Imm(0)),
            (OpCode::LdcI4, Operand::Imm(7)),
            (OpCode::Stfld, Operand::Field(FieldRef::Def(plug_field))),
            (OpCode::Ret, Operand::None),
        ],
    ));
    fx.graph.add_method(plug_ty, plug_ctor);

    let outcome = patch(&mut fx.graph, fx.target, ArchSelector::Any, &[fx.plugs]).expect("patch");
    assert_eq!(
        outcome
            .diagnostics
            .of_code(DiagnosticCode::InitializerShapeSkipped)
            .count(),
        1
    );
}

#[test]
fn missing_target_field_is_reported_not_fatal() {
    let mut fx = assemblies();
    fx.graph.add_type(fx.target, "N", "C", TypeFlags::empty());

    let plug_ty = fx.graph.add_type(fx.plugs, "P", "CPlug", TypeFlags::empty());
    fx.graph.ty_mut(plug_ty).attributes.push(plug_attribute("N.C"));
    let mut plug_field = FieldDef::new("Gone", TypeRef::int32());
    plug_field.attributes.push(plug_member_attribute());
    fx.graph.add_field(plug_ty, plug_field);

    let outcome = patch(&mut fx.graph, fx.target, ArchSelector::Any, &[fx.plugs]).expect("patch");
    assert_eq!(outcome.members_skipped, 1);
    assert_eq!(
        outcome
            .diagnostics
            .of_code(DiagnosticCode::TargetMemberMissing)
            .count(),
        1
    );
}
