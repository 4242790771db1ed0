use std::collections::HashSet;

use cilpatch_model::{MethodId, ModuleGraph, ModuleId, Operand, TypeId};

use crate::arch::{self, ArchSelector};
use crate::attrs;
use crate::cloner;
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollection};
use crate::errors::PatchError;
use crate::matcher;
use crate::members;
use crate::scanner;
use crate::session::PatchSession;

/// Result of a completed patch run.
#[derive(Debug, Default)]
pub struct PatchOutcome {
    pub types_visited: usize,
    pub members_patched: usize,
    pub members_skipped: usize,
    pub diagnostics: DiagnosticCollection,
}

/// Applies every plug in `plugs` to `target`, then purges self-references
/// and verifies the module invariants.
///
/// Plugs are applied in declaration order; when several plugs hit the same
/// target member in one run, the last one wins. A failure on one plug member
/// is recorded as a diagnostic and does not abort the run; a broken module
/// invariant after patching does.
pub fn patch(
    graph: &mut ModuleGraph,
    target: ModuleId,
    architecture: ArchSelector,
    plugs: &[ModuleId],
) -> Result<PatchOutcome, PatchError> {
    let mut session = PatchSession::new(graph, target, architecture, plugs);
    let mut outcome = PatchOutcome::default();

    let mapping = scanner::scan_plugs(&mut session);
    if mapping.is_empty() {
        log::info!("no plugs found; {} left untouched", session.target_assembly_name());
        outcome.diagnostics = session.diagnostics;
        return Ok(outcome);
    }

    for (target_name, plug_types) in &mapping {
        let Some(target_type) = session.graph.find_type(target, target_name) else {
            session.report(
                Diagnostic::error(
                    DiagnosticCode::TargetTypeMissing,
                    format!("target type {target_name} does not exist in the target module"),
                )
                .with_target(target_name.clone()),
            );
            continue;
        };
        // A type that is itself a plug never receives patches.
        let is_plug = {
            let attributes = &session.graph.ty(target_type).attributes;
            attrs::find_attribute(session.graph, attributes, attrs::PLUG_ATTRIBUTE).is_some()
        };
        if is_plug {
            log::debug!("{target_name} is a plug type; not a patch target");
            continue;
        }

        outcome.types_visited += 1;
        for &plug_type in plug_types {
            walk_plug_type(&mut session, target_type, plug_type, &mut outcome);
        }
    }

    purge_self_references(&mut session);
    strip_orphan_native_modules(&mut session);
    verify_module(&session)?;

    log::info!(
        "patched {} members across {} types ({} skipped)",
        outcome.members_patched,
        outcome.types_visited,
        outcome.members_skipped
    );
    outcome.diagnostics = session.diagnostics;
    Ok(outcome)
}

/// Applies one plug type to its target type, member by member in
/// declaration order.
fn walk_plug_type(
    session: &mut PatchSession,
    target_type: TypeId,
    plug_type: TypeId,
    outcome: &mut PatchOutcome,
) {
    let type_decision = arch::include_type(session.graph, plug_type, session.arch);

    for plug_method in session.graph.ty(plug_type).methods.clone() {
        let (included, is_plug_member) = member_disposition(
            session,
            &session.graph.method(plug_method).attributes.clone(),
            type_decision,
        );
        if !included {
            session.graph.ty_mut(plug_type).methods.retain(|&m| m != plug_method);
            continue;
        }
        if !is_plug_member {
            continue;
        }
        dispatch_method(session, target_type, plug_type, plug_method, outcome);
    }

    for plug_property in session.graph.ty(plug_type).properties.clone() {
        let (included, is_plug_member) = member_disposition(
            session,
            &session.graph.property(plug_property).attributes.clone(),
            type_decision,
        );
        if !included {
            session
                .graph
                .ty_mut(plug_type)
                .properties
                .retain(|&p| p != plug_property);
            continue;
        }
        if !is_plug_member {
            continue;
        }
        dispatch_property(session, target_type, plug_property, outcome);
    }

    for plug_field in session.graph.ty(plug_type).fields.clone() {
        let (included, is_plug_member) = member_disposition(
            session,
            &session.graph.field(plug_field).attributes.clone(),
            type_decision,
        );
        if !included {
            session.graph.ty_mut(plug_type).fields.retain(|&f| f != plug_field);
            continue;
        }
        if !is_plug_member {
            continue;
        }
        dispatch_field(session, target_type, plug_type, plug_field, outcome);
    }
}

fn member_disposition(
    session: &PatchSession,
    attributes: &[cilpatch_model::CustomAttribute],
    type_decision: bool,
) -> (bool, bool) {
    let included = arch::include_member(session.graph, attributes, type_decision, session.arch);
    let is_plug_member =
        attrs::find_attribute(session.graph, attributes, attrs::PLUG_MEMBER_ATTRIBUTE).is_some();
    (included, is_plug_member)
}

fn dispatch_method(
    session: &mut PatchSession,
    target_type: TypeId,
    plug_type: TypeId,
    plug_method: MethodId,
    outcome: &mut PatchOutcome,
) {
    let plug_full_name = format!(
        "{}::{}",
        session.graph.type_full_name(plug_type),
        session.graph.method(plug_method).name
    );
    let name = {
        let method = session.graph.method(plug_method);
        matcher::member_target_name(session.graph, &method.attributes, &method.name)
    };

    let Some(target_method) =
        matcher::find_target_method(session.graph, target_type, plug_method, &name)
    else {
        let candidates = matcher::describe_candidates(session.graph, target_type, &name);
        session.report(
            Diagnostic::error(
                DiagnosticCode::TargetMemberMissing,
                format!("no target method matches {plug_full_name}; candidates: {candidates}"),
            )
            .with_plug(plug_full_name)
            .with_target(name),
        );
        outcome.members_skipped += 1;
        return;
    };

    match cloner::patch_method(session, target_method, plug_method, false) {
        Ok(()) => outcome.members_patched += 1,
        Err(err) => {
            let candidates = matcher::describe_candidates(session.graph, target_type, &name);
            session.report(
                Diagnostic::error(
                    err.code(),
                    format!("failed to patch {name} from {plug_full_name}: {err}; candidates: {candidates}"),
                )
                .with_plug(plug_full_name)
                .with_target(name),
            );
            outcome.members_skipped += 1;
        }
    }
}

fn dispatch_property(
    session: &mut PatchSession,
    target_type: TypeId,
    plug_property: cilpatch_model::PropertyId,
    outcome: &mut PatchOutcome,
) {
    let plug_name = session.graph.property(plug_property).name.clone();
    let name = {
        let property = session.graph.property(plug_property);
        matcher::member_target_name(session.graph, &property.attributes, &property.name)
    };

    let Some(target_property) = matcher::find_target_property(session.graph, target_type, &name)
    else {
        session.report(
            Diagnostic::error(
                DiagnosticCode::TargetMemberMissing,
                format!("no target property named {name}"),
            )
            .with_plug(plug_name)
            .with_target(name),
        );
        outcome.members_skipped += 1;
        return;
    };

    match members::patch_property(session, target_property, plug_property) {
        Ok(()) => outcome.members_patched += 1,
        Err(err) => {
            session.report(
                Diagnostic::error(err.code(), format!("failed to patch property {name}: {err}"))
                    .with_plug(plug_name)
                    .with_target(name),
            );
            outcome.members_skipped += 1;
        }
    }
}

fn dispatch_field(
    session: &mut PatchSession,
    target_type: TypeId,
    plug_type: TypeId,
    plug_field: cilpatch_model::FieldId,
    outcome: &mut PatchOutcome,
) {
    let plug_name = session.graph.field(plug_field).name.clone();
    let name = {
        let field = session.graph.field(plug_field);
        matcher::member_target_name(session.graph, &field.attributes, &field.name)
    };

    let Some(target_field) = matcher::find_target_field(session.graph, target_type, &name) else {
        session.report(
            Diagnostic::error(
                DiagnosticCode::TargetMemberMissing,
                format!("no target field named {name}"),
            )
            .with_plug(plug_name)
            .with_target(name),
        );
        outcome.members_skipped += 1;
        return;
    };

    members::patch_field(session, target_field, plug_field);
    members::splice_field_initializers(session, target_type, plug_type, target_field, plug_field);
    outcome.members_patched += 1;
}

/// Removes external-assembly references that name the target module itself.
fn purge_self_references(session: &mut PatchSession) {
    let own_name = session.target_assembly_name().to_string();
    let module = session.graph.module_mut(session.target);
    let before = module.assembly_refs.len();
    module.assembly_refs.retain(|r| r.name != own_name);
    let removed = before - module.assembly_refs.len();
    if removed > 0 {
        log::debug!("purged {removed} self-references from {own_name}");
    }
}

/// Drops native-module entries no remaining P/Invoke stub refers to.
fn strip_orphan_native_modules(session: &mut PatchSession) {
    let mut used: HashSet<String> = HashSet::new();
    for &ty in &session.graph.module(session.target).types {
        for &method in &session.graph.ty(ty).methods {
            if let Some(pinvoke) = &session.graph.method(method).pinvoke {
                used.insert(pinvoke.module.clone());
            }
        }
    }
    session
        .graph
        .module_mut(session.target)
        .native_modules
        .retain(|m| used.contains(m));
}

/// Post-run invariant check; a violation here is fatal because the module
/// graph cannot be persisted in this state.
fn verify_module(session: &PatchSession) -> Result<(), PatchError> {
    let graph = &*session.graph;
    let module = graph.module(session.target);

    if let Some(stale) = module
        .assembly_refs
        .iter()
        .find(|r| r.name == module.assembly_name)
    {
        return Err(PatchError::ModuleInvariantBroken(format!(
            "assembly reference table still names {}",
            stale.name
        )));
    }

    for &ty in &module.types {
        for &method in &graph.ty(ty).methods {
            let Some(body) = &graph.method(method).body else {
                continue;
            };
            let ids: HashSet<_> = body.instructions.iter().map(|i| i.id).collect();
            for instr in &body.instructions {
                match &instr.operand {
                    Operand::Target(t) if !ids.contains(t) => {
                        return Err(PatchError::ModuleInvariantBroken(format!(
                            "branch target escapes the body of {}::{}",
                            graph.type_full_name(ty),
                            graph.method(method).name
                        )));
                    }
                    Operand::Switch(targets) if targets.iter().any(|t| !ids.contains(t)) => {
                        return Err(PatchError::ModuleInvariantBroken(format!(
                            "switch table escapes the body of {}::{}",
                            graph.type_full_name(ty),
                            graph.method(method).name
                        )));
                    }
                    _ => {}
                }
            }
            for region in &body.exception_regions {
                let mut positions = vec![
                    region.try_start,
                    region.try_end,
                    region.handler_start,
                    region.handler_end,
                ];
                if let Some(filter) = region.filter_start {
                    positions.push(filter);
                }
                if positions.iter().any(|p| !ids.contains(p)) {
                    return Err(PatchError::ModuleInvariantBroken(format!(
                        "exception region escapes the body of {}::{}",
                        graph.type_full_name(ty),
                        graph.method(method).name
                    )));
                }
                let index_of = |id| body.instructions.iter().position(|i| i.id == id);
                let ordered = [
                    index_of(region.try_start),
                    index_of(region.try_end),
                    index_of(region.handler_start),
                    index_of(region.handler_end),
                ];
                if ordered.windows(2).any(|w| w[0] > w[1]) {
                    return Err(PatchError::ModuleInvariantBroken(format!(
                        "exception region positions are out of order in {}::{}",
                        graph.type_full_name(ty),
                        graph.method(method).name
                    )));
                }
            }
        }
    }
    Ok(())
}
