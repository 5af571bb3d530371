//! Pass 1: enum constant value folding.
//!
//! A constant's value comes from an explicit `value(N)` or `value(OtherConst)` attribute, or
//! (absent one) the previous constant's value plus one, starting at zero — the usual C-style
//! enum default. `value(OtherConst)` forms a dependency edge; cycles are rejected with
//! [`petgraph`]'s cycle check rather than a hand-rolled DFS, since the dependency graph here is
//! exactly the kind of small directed graph petgraph is for.

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::DiGraph;
use std::collections::HashMap;

use crate::ast::{Context, Decl, DeclId, Literal};
use crate::attributes::{AttrKind, AttrValue};
use crate::diagnostics::{Arg, Code, DiagnosticsSink, PassResult};
use crate::location::FileTable;

pub fn run(ctx: &mut Context, sink: &mut DiagnosticsSink, files: &FileTable) -> PassResult<()> {
    let enum_ids: Vec<DeclId> = ctx
        .ids()
        .filter(|id| matches!(ctx.get(*id), Decl::Enum(_)))
        .collect();

    for enum_id in enum_ids {
        run_one_enum(ctx, enum_id, sink, files)?;
    }
    Ok(())
}

fn run_one_enum(ctx: &mut Context, enum_id: DeclId, sink: &mut DiagnosticsSink, files: &FileTable) -> PassResult<()> {
    let has_errorcode = ctx.get(enum_id).attributes().has(AttrKind::ErrorCode);
    let consts: Vec<DeclId> = match ctx.get(enum_id) {
        Decl::Enum(e) => e.consts.clone(),
        _ => return Ok(()),
    };

    // Materialize each constant's raw `value` literal from its attribute set, and check the
    // `noerror` requires `errorcode` rule while we're visiting each constant once.
    for &cid in &consts {
        let value = match ctx.get(cid).attributes().get(AttrKind::Value) {
            Some(entry) => match &entry.value {
                AttrValue::Value(lit) => Some(lit.clone()),
                _ => None,
            },
            None => None,
        };
        if let Decl::EnumConst(c) = ctx.get_mut(cid) {
            c.value = value;
        }

        if ctx.get(cid).attributes().has(AttrKind::NoError) && !has_errorcode {
            let const_name = ctx.get(cid).name().to_string();
            let enum_name = ctx.get(enum_id).name().to_string();
            return Err(sink.error(Code::E2072, ctx.get(cid).location(), files, &[Arg::from(const_name), Arg::from(enum_name)]));
        }
    }

    // Build the const-reference dependency graph and check for cycles before folding anything,
    // so a cyclic enum never silently folds a partial/garbage value.
    let index_of: HashMap<DeclId, usize> = consts.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let mut graph = DiGraph::<DeclId, ()>::new();
    let nodes: Vec<_> = consts.iter().map(|id| graph.add_node(*id)).collect();
    for (i, &cid) in consts.iter().enumerate() {
        if let Decl::EnumConst(c) = ctx.get(cid) {
            if let Some(Literal::ConstRefs(refs)) = &c.value {
                for r in refs {
                    let Some(target) = r.resolved else { continue };
                    if target == cid {
                        return Err(sink.error(Code::E2033, ctx.get(cid).location(), files, &[Arg::from(ctx.get(cid).name())]));
                    }
                    if let Some(&j) = index_of.get(&target) {
                        graph.add_edge(nodes[i], nodes[j], ());
                    }
                }
            }
        }
    }
    if is_cyclic_directed(&graph) {
        let cid = consts[0];
        return Err(sink.error(Code::E2040, ctx.get(cid).location(), files, &[Arg::from(ctx.get(cid).name())]));
    }

    // Fold in declaration order: a forward reference's target is guaranteed acyclic (checked
    // above) and gets folded recursively via `fold_value`, memoizing into `resolved`.
    let mut resolved: HashMap<DeclId, i64> = HashMap::new();
    let mut next_auto: i64 = 0;
    for &cid in &consts {
        let value = fold_value(ctx, cid, &mut resolved, sink, files)?;
        let value = value.unwrap_or(next_auto);
        if !(i32::MIN as i64..=i32::MAX as i64).contains(&value) {
            let name = ctx.get(cid).name().to_string();
            return Err(sink.error(Code::E2038, ctx.get(cid).location(), files, &[Arg::from(name)]));
        }
        resolved.insert(cid, value);
        next_auto = value + 1;
        if let Decl::EnumConst(c) = ctx.get_mut(cid) {
            c.resolved_value = Some(value as i32);
        }
    }

    // Duplicate-value check runs after every constant has a folded value.
    let mut seen: HashMap<i32, DeclId> = HashMap::new();
    for &cid in &consts {
        let value = match ctx.get(cid) {
            Decl::EnumConst(c) => c.resolved_value,
            _ => None,
        };
        let Some(value) = value else { continue };
        if seen.contains_key(&value) {
            let name = ctx.get(cid).name().to_string();
            return Err(sink.error(Code::E2039, ctx.get(cid).location(), files, &[Arg::from(name)]));
        }
        seen.insert(value, cid);
    }

    Ok(())
}

fn fold_value(
    ctx: &Context,
    cid: DeclId,
    resolved: &mut HashMap<DeclId, i64>,
    sink: &mut DiagnosticsSink,
    files: &FileTable,
) -> PassResult<Option<i64>> {
    if let Some(v) = resolved.get(&cid) {
        return Ok(Some(*v));
    }
    let value = match ctx.get(cid) {
        Decl::EnumConst(c) => c.value.clone(),
        _ => None,
    };
    match value {
        None => Ok(None),
        Some(Literal::Int(n)) => Ok(Some(n)),
        Some(Literal::ConstRefs(refs)) => {
            let mut total = 0i64;
            for r in &refs {
                let Some(target) = r.resolved else {
                    return Err(sink.error(Code::E2034, ctx.get(cid).location(), files, &[]));
                };
                if let Some(v) = fold_value(ctx, target, resolved, sink, files)? {
                    total |= v;
                }
            }
            Ok(Some(total))
        }
        Some(_) => Err(sink.error(Code::E2031, ctx.get(cid).location(), files, &[])),
    }
}
