//! Two-pass symbol resolution.
//!
//! Pass A walks every declaration and inserts it into a flat table keyed by
//! [`Context::canonical_key`], so a struct field can refer to a type declared later in the same
//! file (or a sibling import) without the parser caring about declaration order. Pass B then
//! walks every [`DeclRef`] recorded during parsing (return types, array/datasize pointers,
//! getter/setter method references, enum constant value references, handle field references)
//! and resolves each one against that table.

use std::collections::HashMap;

use crate::ast::{Context, Decl, DeclId, Literal, TypeName};
use crate::attributes::resolve_attr_refs;
use crate::diagnostics::{Arg, Code, DiagnosticsSink, PassResult};
use crate::location::FileTable;

pub struct SymbolTable {
    by_key: HashMap<String, DeclId>,
}

impl SymbolTable {
    pub fn lookup(&self, key: &str) -> Option<DeclId> {
        self.by_key.get(key).copied()
    }
}

/// Pass A: insert every declaration's canonical key. A name already present in the same scope
/// is a hard redefinition error (E2030); case-only clashes are allowed here (Pass B's case
/// check, E2037, catches a *reference* that doesn't match the declared case exactly).
pub fn insert_declarations(ctx: &Context, sink: &mut DiagnosticsSink, files: &FileTable) -> PassResult<SymbolTable> {
    let mut by_key = HashMap::new();
    for (id, decl) in ctx.iter() {
        let key = ctx.canonical_key(id);
        if by_key.insert(key, id).is_some() {
            return Err(sink.error(Code::E2030, decl.location(), files, &[Arg::from(decl.name())]));
        }
    }
    Ok(SymbolTable { by_key })
}

/// Pass B: resolves every reference embedded in the AST (return/field/arg/property/event types
/// that name a declared type, and the `DeclRef`s stashed inside attribute values) against the
/// table built by [`insert_declarations`].
pub fn resolve_references(
    ctx: &mut Context,
    table: &SymbolTable,
    sink: &mut DiagnosticsSink,
    files: &FileTable,
) -> PassResult<()> {
    let ids: Vec<DeclId> = ctx.ids().collect();
    for id in ids {
        let parent = ctx.get(id).parent();
        resolve_type_field(ctx, id, parent, table, sink, files)?;
        resolve_attr_refs_for(ctx, id, parent, table, sink, files)?;
    }
    Ok(())
}

fn lookup_scoped(
    ctx: &Context,
    table: &SymbolTable,
    scope: Option<DeclId>,
    name: &str,
) -> Option<(DeclId, bool)> {
    // Try the fully-qualified key under each enclosing scope, innermost first, then the bare
    // top-level key, mirroring ordinary lexical lookup; also checks a case-insensitive match to
    // distinguish "not found" (E2032) from "found under different case" (E2037).
    let mut scopes = Vec::new();
    let mut cur = scope;
    while let Some(s) = cur {
        scopes.push(Some(s));
        cur = ctx.get(s).parent();
    }
    scopes.push(None);

    for s in &scopes {
        let key = match s {
            Some(scope_id) => format!("{}.{}", ctx.canonical_key(*scope_id), name.to_ascii_lowercase()),
            None => name.to_ascii_lowercase(),
        };
        if let Some(id) = table.lookup(&key) {
            let exact = ctx.get(id).name() == name;
            return Some((id, exact));
        }
    }
    None
}

fn resolve_one(
    ctx: &Context,
    table: &SymbolTable,
    scope: Option<DeclId>,
    name: &str,
    sink: &mut DiagnosticsSink,
    files: &FileTable,
    loc: crate::location::Location,
) -> PassResult<DeclId> {
    match lookup_scoped(ctx, table, scope, name) {
        Some((id, true)) => Ok(id),
        Some((id, false)) => Err(sink.error(
            Code::E2037,
            loc,
            files,
            &[Arg::from(name), Arg::from(ctx.get(id).name())],
        )),
        None => Err(sink.error(Code::E2032, loc, files, &[Arg::from(name)])),
    }
}

/// `TypeName::Decl` slot, read-only view used to decide what (if anything) needs resolving
/// before taking a fresh mutable borrow to write the result back.
fn type_slot(decl: &Decl) -> Option<&TypeName> {
    match decl {
        Decl::Field(f) => f.field_type.as_ref(),
        Decl::Arg(a) => a.arg_type.as_ref(),
        Decl::Property(p) => p.property_type.as_ref(),
        Decl::Event(e) => e.event_type.as_ref(),
        Decl::Method(m) => m.return_type.as_ref(),
        Decl::Callback(c) => c.return_type.as_ref(),
        Decl::Func(f) => f.return_type.as_ref(),
        Decl::Interface(i) => i.handle_type.as_ref(),
        _ => None,
    }
}

fn type_slot_mut(decl: &mut Decl) -> Option<&mut TypeName> {
    match decl {
        Decl::Field(f) => f.field_type.as_mut(),
        Decl::Arg(a) => a.arg_type.as_mut(),
        Decl::Property(p) => p.property_type.as_mut(),
        Decl::Event(e) => e.event_type.as_mut(),
        Decl::Method(m) => m.return_type.as_mut(),
        Decl::Callback(c) => c.return_type.as_mut(),
        Decl::Func(f) => f.return_type.as_mut(),
        Decl::Interface(i) => i.handle_type.as_mut(),
        _ => None,
    }
}

fn type_slot_assign(decl: &mut Decl, ty: TypeName) {
    let slot = match decl {
        Decl::Field(f) => &mut f.field_type,
        Decl::Arg(a) => &mut a.arg_type,
        Decl::Property(p) => &mut p.property_type,
        Decl::Event(e) => &mut e.event_type,
        Decl::Method(m) => &mut m.return_type,
        Decl::Callback(c) => &mut c.return_type,
        Decl::Func(f) => &mut f.return_type,
        Decl::Interface(i) => &mut i.handle_type,
        _ => return,
    };
    *slot = Some(ty);
}

/// Builtin primitive names recognized by a `type(...)` attribute; anything else is treated as a
/// reference to a previously-declared Enum/Struct/Interface/Callback.
fn builtin_type(name: &str) -> Option<TypeName> {
    Some(match name {
        "Void" => TypeName::Void,
        "Bool" => TypeName::Bool,
        "Int8" => TypeName::Int8,
        "UInt8" => TypeName::UInt8,
        "Int16" => TypeName::Int16,
        "UInt16" => TypeName::UInt16,
        "Int32" => TypeName::Int32,
        "UInt32" => TypeName::UInt32,
        "Int64" => TypeName::Int64,
        "UInt64" => TypeName::UInt64,
        "Float32" => TypeName::Float32,
        "Float64" => TypeName::Float64,
        "Str" => TypeName::Str,
        "Data" => TypeName::Data,
        "ConstData" => TypeName::ConstData,
        _ => return None,
    })
}

/// Reads each declaration's `type(...)` attribute (if any) into its typed field/return/property
/// slot, ahead of [`resolve_references`] which resolves the `TypeName::Decl` placeholders this
/// leaves behind.
pub fn materialize_types(ctx: &mut Context) {
    use crate::attributes::{AttrKind, AttrValue};
    let ids: Vec<DeclId> = ctx.ids().collect();
    for id in ids {
        let decl = ctx.get(id);
        if type_slot(decl).is_some() {
            continue;
        }
        let Some(entry) = decl.attributes().get(AttrKind::Type) else { continue };
        let AttrValue::CName(name) = &entry.value else { continue };
        let ty = match builtin_type(name) {
            Some(t) => t,
            None => TypeName::Decl(crate::ast::DeclRef::new(name.clone(), entry.location)),
        };
        type_slot_assign(ctx.get_mut(id), ty);
    }
}

fn resolve_type_field(
    ctx: &mut Context,
    id: DeclId,
    parent: Option<DeclId>,
    table: &SymbolTable,
    sink: &mut DiagnosticsSink,
    files: &FileTable,
) -> PassResult<()> {
    // `type(Name)` attributes name either a builtin or a previously-declared type; the engine
    // stores the raw name as AttrValue::CName and the appropriate semantic pass turns it into a
    // `TypeName`. Symbol resolution only needs to resolve `TypeName::Decl` refs that a semantic
    // pass has already materialized onto the node (field_type/return_type/etc.).
    let pending = match type_slot(ctx.get(id)) {
        Some(TypeName::Decl(r)) if !r.is_resolved() => Some((r.name.clone(), r.location)),
        _ => None,
    };
    if let Some((name, loc)) = pending {
        let resolved = resolve_one(ctx, table, parent, &name, sink, files, loc)?;
        if let Some(TypeName::Decl(r)) = type_slot_mut(ctx.get_mut(id)) {
            r.resolved = Some(resolved);
        }
    }

    // `value(Const)` on an enum constant may reference another constant in the same enum.
    let pending_refs: Vec<(String, crate::location::Location)> = match ctx.get(id) {
        Decl::EnumConst(c) => match &c.value {
            Some(Literal::ConstRefs(refs)) => {
                refs.iter().filter(|r| !r.is_resolved()).map(|r| (r.name.clone(), r.location)).collect()
            }
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    for (name, loc) in pending_refs {
        let resolved = resolve_one(ctx, table, parent, &name, sink, files, loc)?;
        if let Decl::EnumConst(c) = ctx.get_mut(id) {
            if let Some(Literal::ConstRefs(refs)) = &mut c.value {
                for r in refs.iter_mut() {
                    if r.name == name && r.resolved.is_none() {
                        r.resolved = Some(resolved);
                    }
                }
            }
        }
    }

    Ok(())
}

fn resolve_attr_refs_for(
    ctx: &mut Context,
    id: DeclId,
    parent: Option<DeclId>,
    table: &SymbolTable,
    sink: &mut DiagnosticsSink,
    files: &FileTable,
) -> PassResult<()> {
    let mut error: Option<crate::diagnostics::Halt> = None;
    let mut set = std::mem::take(ctx.get_mut(id).attributes_mut());
    resolve_attr_refs(&mut set, |r| {
        if error.is_some() || r.is_resolved() {
            return;
        }
        match resolve_one(ctx, table, parent, &r.name, sink, files, r.location) {
            Ok(resolved) => r.resolved = Some(resolved),
            Err(halt) => error = Some(halt),
        }
    });
    *ctx.get_mut(id).attributes_mut() = set;
    match error {
        Some(halt) => Err(halt),
        None => Ok(()),
    }
}
