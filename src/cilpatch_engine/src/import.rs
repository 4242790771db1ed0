use cilpatch_model::{
    ExternalFieldRef, ExternalMethodRef, FieldRef, MethodFlags, MethodRef, TypeRef,
};

use crate::diagnostics::DiagnosticCode;
use crate::session::PatchSession;

/// The "safe import" layer.
///
/// An ordinary cross-module import turns a foreign definition into an
/// external reference scoped to its defining assembly. That is wrong in one
/// case: a reference whose scope is the *target* module's own assembly would
/// serialize as a self-reference, which runtimes reject. These functions
/// perform the ordinary import and then substitute local definitions for any
/// self-scoped leaf, recursively through the structural type variants.

pub fn safe_import_type(session: &mut PatchSession, ty: &TypeRef) -> TypeRef {
    match ty {
        TypeRef::Def(id) => {
            if session.graph.type_module(*id) == session.target {
                TypeRef::Def(*id)
            } else {
                let module = session.graph.type_module(*id);
                TypeRef::External(cilpatch_model::ExternalTypeRef {
                    assembly: session.graph.module(module).assembly_name.clone(),
                    full_name: session.graph.type_full_name(*id),
                })
            }
        }
        TypeRef::External(e) => {
            if e.assembly == session.target_assembly_name() {
                match session.graph.find_type(session.target, &e.full_name) {
                    Some(id) => TypeRef::Def(id),
                    None => {
                        session.warn(
                            DiagnosticCode::SelfReferenceLeft,
                            format!(
                                "reference to {} is scoped to the target assembly but has no local definition",
                                e.full_name
                            ),
                        );
                        ty.clone()
                    }
                }
            } else {
                ty.clone()
            }
        }
        TypeRef::Pointer(inner) => TypeRef::Pointer(Box::new(safe_import_type(session, inner))),
        TypeRef::ByRef(inner) => TypeRef::ByRef(Box::new(safe_import_type(session, inner))),
        TypeRef::SzArray(inner) => TypeRef::SzArray(Box::new(safe_import_type(session, inner))),
        TypeRef::GenericInst { head, args } => TypeRef::GenericInst {
            head: Box::new(safe_import_type(session, head)),
            args: args.iter().map(|a| safe_import_type(session, a)).collect(),
        },
        TypeRef::GenericParam { .. } => ty.clone(),
    }
}

pub fn safe_import_method(session: &mut PatchSession, method: &MethodRef) -> MethodRef {
    let ext = match method {
        MethodRef::Def(id) => {
            if session.graph.method_module(*id) == session.target {
                return MethodRef::Def(*id);
            }
            let m = session.graph.method(*id);
            let declaring = m.declaring;
            let name = m.name.clone();
            let return_type = m.return_type.clone();
            let params: Vec<TypeRef> = m.params.iter().map(|p| p.ty.clone()).collect();
            let has_this = !m.flags.contains(MethodFlags::STATIC);
            ExternalMethodRef {
                declaring: safe_import_type(session, &TypeRef::Def(declaring)),
                name,
                return_type: safe_import_type(session, &return_type),
                params: params
                    .iter()
                    .map(|p| safe_import_type(session, p))
                    .collect(),
                has_this,
            }
        }
        MethodRef::External(e) => {
            let e = e.clone();
            ExternalMethodRef {
                declaring: safe_import_type(session, &e.declaring),
                name: e.name,
                return_type: safe_import_type(session, &e.return_type),
                params: e
                    .params
                    .iter()
                    .map(|p| safe_import_type(session, p))
                    .collect(),
                has_this: e.has_this,
            }
        }
    };

    // Prefer the concrete local definition when the fixed-up declaring type
    // landed in the target module and a method with this exact signature
    // exists on it.
    if let TypeRef::Def(ty) = ext.declaring {
        let want: Vec<String> = ext
            .params
            .iter()
            .map(|p| p.full_name(session.graph))
            .collect();
        for &mid in &session.graph.ty(ty).methods {
            let m = session.graph.method(mid);
            if m.name != ext.name || m.params.len() != want.len() {
                continue;
            }
            let found = m
                .params
                .iter()
                .zip(&want)
                .all(|(p, w)| p.ty.full_name(session.graph) == *w);
            if found {
                return MethodRef::Def(mid);
            }
        }
    }
    MethodRef::External(ext)
}

pub fn safe_import_field(session: &mut PatchSession, field: &FieldRef) -> FieldRef {
    let ext = match field {
        FieldRef::Def(id) => {
            if session.graph.field_module(*id) == session.target {
                return FieldRef::Def(*id);
            }
            let f = session.graph.field(*id);
            let declaring = f.declaring;
            let name = f.name.clone();
            let field_type = f.ty.clone();
            ExternalFieldRef {
                declaring: safe_import_type(session, &TypeRef::Def(declaring)),
                name,
                field_type: safe_import_type(session, &field_type),
            }
        }
        FieldRef::External(e) => {
            let e = e.clone();
            ExternalFieldRef {
                declaring: safe_import_type(session, &e.declaring),
                name: e.name,
                field_type: safe_import_type(session, &e.field_type),
            }
        }
    };

    if let TypeRef::Def(ty) = ext.declaring {
        if let Some(&fid) = session
            .graph
            .ty(ty)
            .fields
            .iter()
            .find(|&&f| session.graph.field(f).name == ext.name)
        {
            return FieldRef::Def(fid);
        }
    }
    FieldRef::External(ext)
}
