use std::collections::HashMap;

use cilpatch_model::{
    ExceptionRegion, InstrId, Instruction, LocalVar, MethodBody, MethodFlags, MethodId,
    MethodImplFlags, OpCode, Operand,
};

use crate::diagnostics::DiagnosticCode;
use crate::errors::MemberError;
use crate::import::{safe_import_field, safe_import_method, safe_import_type};
use crate::matcher;
use crate::session::PatchSession;

/// How much of the target body survives the clone.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum CloneMode {
    /// Replace everything: instructions, locals, and exception regions.
    FullSwap,
    /// Splice the plug's instructions into the (possibly truncated) target
    /// body; exception regions are not copied over.
    Splice,
}

/// Replaces `target`'s body with a clone of `plug`'s body.
///
/// Instance plugs applied to instance targets, and constructor targets,
/// clone in splice mode; everything else is a full swap. `force_instance`
/// switches the parameter remap to the identity mapping, which is what the
/// property patcher needs for accessor pairs.
pub fn patch_method(
    session: &mut PatchSession,
    target: MethodId,
    plug: MethodId,
    force_instance: bool,
) -> Result<(), MemberError> {
    let instance_plug = matcher::is_instance_plug(session.graph, plug);
    let target_method = session.graph.method(target);
    let mode = if (instance_plug && !target_method.is_static()) || target_method.is_constructor() {
        CloneMode::Splice
    } else {
        CloneMode::FullSwap
    };
    patch_method_with(session, target, plug, force_instance, mode)
}

pub(crate) fn patch_method_with(
    session: &mut PatchSession,
    target: MethodId,
    plug: MethodId,
    force_instance: bool,
    mode: CloneMode,
) -> Result<(), MemberError> {
    let Some(plug_body) = session.graph.method(plug).body.clone() else {
        return Err(MemberError::MissingPlugBody);
    };

    let target_method = session.graph.method(target);
    let target_is_ctor = target_method.is_constructor();
    let target_is_static = target_method.is_static();
    let target_param_count = target_method.params.len();
    let target_name = target_method.name.clone();
    let instance_applied =
        matcher::is_instance_plug(session.graph, plug) && !target_is_static && !force_instance;

    // Constructor prologue preservation: keep everything up to and including
    // the chained `.ctor` call on the declaring or base type.
    let preserved = if target_is_ctor {
        constructor_prologue(session, target)
    } else {
        Vec::new()
    };

    let locals: Vec<LocalVar> = plug_body
        .locals
        .iter()
        .enumerate()
        .map(|(i, local)| LocalVar {
            index: i as u16,
            ty: safe_import_type(session, &local.ty),
        })
        .collect();

    let mut map: HashMap<InstrId, InstrId> = HashMap::new();
    let spliced_at = preserved.len();
    let mut instructions = preserved;
    for instr in &plug_body.instructions {
        let operand = match &instr.operand {
            Operand::Method(m) => Operand::Method(safe_import_method(session, m)),
            Operand::Field(f) => Operand::Field(safe_import_field(session, f)),
            Operand::Type(t) => Operand::Type(safe_import_type(session, t)),
            Operand::Param(k) => remap_parameter(
                session,
                *k,
                instance_applied,
                target_param_count,
                &target_name,
            ),
            // Branch operands keep the plug-side identity until fixup below.
            other => other.clone(),
        };
        let cloned = session.graph.new_instr(instr.op, operand);
        map.insert(instr.id, cloned.id);
        instructions.push(cloned);
    }

    // Branch fixup over the cloned suffix only; a preserved constructor
    // prologue already branches within itself.
    for instr in &mut instructions[spliced_at..] {
        match &mut instr.operand {
            Operand::Target(t) => {
                *t = *map.get(t).ok_or(MemberError::DanglingBranch(t.0))?;
            }
            Operand::Switch(targets) => {
                for t in targets {
                    *t = *map.get(t).ok_or(MemberError::DanglingBranch(t.0))?;
                }
            }
            _ => {}
        }
    }

    let mut exception_regions = Vec::new();
    if mode == CloneMode::FullSwap {
        for region in &plug_body.exception_regions {
            let catch_type = match &region.catch_type {
                Some(t) => Some(safe_import_type(session, t)),
                None => None,
            };
            let position = |id: InstrId| -> Result<InstrId, MemberError> {
                map.get(&id).copied().ok_or(MemberError::DanglingRegion(id.0))
            };
            exception_regions.push(ExceptionRegion {
                kind: region.kind,
                try_start: position(region.try_start)?,
                try_end: position(region.try_end)?,
                handler_start: position(region.handler_start)?,
                handler_end: position(region.handler_end)?,
                catch_type,
                filter_start: match region.filter_start {
                    Some(id) => Some(position(id)?),
                    None => None,
                },
            });
        }
    }

    // Finalizers keep their protected shape on the target side; a trailing
    // `leave` cloned from the plug would escape a region that no longer
    // exists here.
    if target_name == "Finalize" {
        while instructions
            .last()
            .is_some_and(|i| matches!(i.op, OpCode::Leave | OpCode::LeaveS))
        {
            instructions.pop();
        }
    }

    if !instructions.last().is_some_and(|i| i.op == OpCode::Ret) {
        let ret = session.graph.new_instr(OpCode::Ret, Operand::None);
        instructions.push(ret);
    }

    let body = MethodBody {
        instructions,
        locals,
        exception_regions,
        max_stack: plug_body.max_stack,
        init_locals: plug_body.init_locals,
    };

    let target_method = session.graph.method_mut(target);
    target_method.body = Some(body);

    // A patched method is managed by definition: drop the stub descriptor
    // and every implementation bit that says otherwise.
    target_method.pinvoke = None;
    target_method.flags.remove(MethodFlags::PINVOKE_IMPL);
    target_method.impl_flags.remove(
        MethodImplFlags::PRESERVE_SIG
            | MethodImplFlags::INTERNAL_CALL
            | MethodImplFlags::NATIVE
            | MethodImplFlags::UNMANAGED
            | MethodImplFlags::RUNTIME,
    );

    Ok(())
}

/// Instructions up to and including the first `call` to a `.ctor` of the
/// target's declaring type or its base type; empty when no such call exists.
fn constructor_prologue(session: &PatchSession, target: MethodId) -> Vec<Instruction> {
    let graph = &*session.graph;
    let method = graph.method(target);
    let Some(body) = &method.body else {
        return Vec::new();
    };
    let declaring_name = graph.type_full_name(method.declaring);
    let base_name = graph
        .ty(method.declaring)
        .base
        .as_ref()
        .map(|b| b.full_name(graph));

    let chain_call = body.instructions.iter().position(|instr| {
        instr.op == OpCode::Call
            && matches!(&instr.operand, Operand::Method(m) if m.name(graph) == ".ctor" && {
                let declaring = m.declaring_full_name(graph);
                declaring == declaring_name || Some(&declaring) == base_name.as_ref()
            })
    });
    match chain_call {
        Some(pos) => body.instructions[..=pos].to_vec(),
        None => Vec::new(),
    }
}

fn remap_parameter(
    session: &mut PatchSession,
    index: u16,
    instance_applied: bool,
    target_param_count: usize,
    target_name: &str,
) -> Operand {
    if instance_applied {
        if index == 0 {
            // The receiver: argument slot 0, as a literal immediate.
            return Operand::Imm(0);
        }
        return Operand::Param(index - 1);
    }
    if usize::from(index) < target_param_count {
        return Operand::Param(index);
    }
    session.warn(
        DiagnosticCode::ParameterOutOfRange,
        format!(
            "parameter {index} has no counterpart on {target_name} ({target_param_count} parameters); keeping the plug-side reference"
        ),
    );
    Operand::Param(index)
}
