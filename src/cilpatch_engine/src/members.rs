use cilpatch_model::{
    FieldId, FieldRef, Instruction, MethodId, OpCode, Operand, Parameter, PropertyId, TypeId,
};

use crate::cloner::{patch_method_with, CloneMode};
use crate::diagnostics::DiagnosticCode;
use crate::errors::MemberError;
use crate::import::{safe_import_field, safe_import_method, safe_import_type};
use crate::session::PatchSession;

/// Replaces a target property with a plug property.
///
/// Both sides must declare a getter and a setter. The accessors are cloned
/// in splice mode, the property signature is copied over, the backing field
/// is patched, and every access to the plug's backing field inside the
/// cloned accessors is redirected to the target's backing field.
pub fn patch_property(
    session: &mut PatchSession,
    target: PropertyId,
    plug: PropertyId,
) -> Result<(), MemberError> {
    let (Some(target_get), Some(target_set)) = (
        session.graph.property(target).getter,
        session.graph.property(target).setter,
    ) else {
        return Err(MemberError::IncompleteProperty);
    };
    let (Some(plug_get), Some(plug_set)) = (
        session.graph.property(plug).getter,
        session.graph.property(plug).setter,
    ) else {
        return Err(MemberError::IncompleteProperty);
    };

    let plug_backing =
        backing_field(session, plug_get).ok_or(MemberError::MissingBackingField)?;
    let target_backing =
        backing_field(session, target_get).ok_or(MemberError::MissingBackingField)?;

    patch_method_with(session, target_set, plug_set, true, CloneMode::Splice)?;
    patch_method_with(session, target_get, plug_get, true, CloneMode::Splice)?;

    let plug_def = session.graph.property(plug).clone();
    let ty = safe_import_type(session, &plug_def.ty);
    let params: Vec<Parameter> = plug_def
        .params
        .iter()
        .map(|p| Parameter {
            index: p.index,
            name: p.name.clone(),
            ty: safe_import_type(session, &p.ty),
            flags: p.flags,
        })
        .collect();
    {
        let prop = session.graph.property_mut(target);
        prop.ty = ty;
        prop.params = params;
        prop.attributes = plug_def.attributes;
    }

    patch_field(session, target_backing, plug_backing);

    redirect_backing_field(session, target_get, plug_backing, target_backing);
    redirect_backing_field(session, target_set, plug_backing, target_backing);
    Ok(())
}

/// The field behind a property: the first field load in the getter.
fn backing_field(session: &PatchSession, getter: MethodId) -> Option<FieldId> {
    let body = session.graph.method(getter).body.as_ref()?;
    body.instructions.iter().find_map(|instr| {
        if !instr.op.is_field_load() {
            return None;
        }
        match &instr.operand {
            Operand::Field(FieldRef::Def(id)) => Some(*id),
            _ => None,
        }
    })
}

/// Rewrites every access to `from` in the method's body to access `to`,
/// choosing the static or instance opcode form by the staticness of the
/// enclosing method.
fn redirect_backing_field(
    session: &mut PatchSession,
    method: MethodId,
    from: FieldId,
    to: FieldId,
) {
    let imported_from = safe_import_field(session, &FieldRef::Def(from));
    let method_is_static = session.graph.method(method).is_static();
    let Some(body) = session.graph.method_mut(method).body.as_mut() else {
        return;
    };
    for instr in &mut body.instructions {
        let Operand::Field(field) = &mut instr.operand else {
            continue;
        };
        if *field != FieldRef::Def(from) && *field != imported_from {
            continue;
        }
        *field = FieldRef::Def(to);
        instr.op = match (instr.op, method_is_static) {
            (op, true) if op.is_field_load() => OpCode::Ldsfld,
            (op, false) if op.is_field_load() => OpCode::Ldfld,
            (op, true) if op.is_field_store() => OpCode::Stsfld,
            (op, false) if op.is_field_store() => OpCode::Stfld,
            (op, true) if op.is_field_load_address() => OpCode::Ldsflda,
            (op, false) if op.is_field_load_address() => OpCode::Ldflda,
            (op, _) => op,
        };
    }
}

/// Copies the plug field's definition onto the target field: type,
/// attributes, constant, raw initial bytes, and marshal descriptor.
pub fn patch_field(session: &mut PatchSession, target: FieldId, plug: FieldId) {
    let plug_def = session.graph.field(plug).clone();
    let ty = safe_import_type(session, &plug_def.ty);
    let field = session.graph.field_mut(target);
    field.ty = ty;
    field.flags = plug_def.flags;
    field.constant = plug_def.constant;
    field.initial_value = plug_def.initial_value;
    field.marshal = plug_def.marshal;
}

/// Carries the plug field's initializer expression into the target's
/// constructors.
///
/// For every (target ctor, plug ctor) pair, the instruction immediately
/// before the store to the patched field is replaced with an
/// operand-rewritten clone of the plug's counterpart. The replacement keeps
/// the replaced instruction's identity, so branches into the prologue stay
/// valid. Bodies that don't exhibit the expected push-then-store shape are
/// skipped with a diagnostic.
pub fn splice_field_initializers(
    session: &mut PatchSession,
    target_type: TypeId,
    plug_type: TypeId,
    target_field: FieldId,
    plug_field: FieldId,
) {
    let target_ctors = constructors_of(session, target_type);
    let plug_ctors = constructors_of(session, plug_type);

    for &target_ctor in &target_ctors {
        for &plug_ctor in &plug_ctors {
            let target_store = field_store_index(session, target_ctor, target_field);
            let plug_store = field_store_index(session, plug_ctor, plug_field);
            let (Some(ti), Some(pi)) = (target_store, plug_store) else {
                session.warn(
                    DiagnosticCode::InitializerShapeSkipped,
                    format!(
                        "no initializer store for field {} in constructor pair; skipping",
                        session.graph.field(target_field).name
                    ),
                );
                continue;
            };
            if ti == 0 || pi == 0 {
                session.error(
                    DiagnosticCode::InvalidConstructorShape,
                    format!(
                        "store to field {} has no preceding value-producing instruction",
                        session.graph.field(target_field).name
                    ),
                );
                continue;
            }

            let source = {
                let Some(body) = session.graph.method(plug_ctor).body.as_ref() else {
                    continue;
                };
                body.instructions[pi - 1].clone()
            };
            let operand = match &source.operand {
                Operand::Method(m) => Operand::Method(safe_import_method(session, m)),
                Operand::Field(f) => Operand::Field(safe_import_field(session, f)),
                Operand::Type(t) => Operand::Type(safe_import_type(session, t)),
                other => other.clone(),
            };
            let Some(body) = session.graph.method_mut(target_ctor).body.as_mut() else {
                continue;
            };
            let replaced = &mut body.instructions[ti - 1];
            *replaced = Instruction::new(replaced.id, source.op, operand);
        }
    }
}

fn constructors_of(session: &PatchSession, ty: TypeId) -> Vec<MethodId> {
    session
        .graph
        .ty(ty)
        .methods
        .iter()
        .copied()
        .filter(|&m| session.graph.method(m).is_constructor())
        .collect()
}

fn field_store_index(session: &PatchSession, method: MethodId, field: FieldId) -> Option<usize> {
    let body = session.graph.method(method).body.as_ref()?;
    body.instructions.iter().position(|instr| {
        instr.op.is_field_store()
            && matches!(&instr.operand, Operand::Field(FieldRef::Def(id)) if *id == field)
    })
}
