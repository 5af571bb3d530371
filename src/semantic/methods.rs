//! Pass 6: interface method checks — the `this` binding convention, and the special
//! `ctor`/`refinc`/`destroy` lifecycle methods.

use crate::ast::{Context, Decl, DeclId};
use crate::attributes::AttrKind;
use crate::diagnostics::{Arg, Code, DiagnosticsSink, PassResult};
use crate::location::FileTable;

use super::args_common::{check_args, METHOD_CODES};

pub fn run(ctx: &mut Context, sink: &mut DiagnosticsSink, files: &FileTable) -> PassResult<()> {
    let interface_ids: Vec<DeclId> = ctx.ids().filter(|id| matches!(ctx.get(*id), Decl::Interface(_))).collect();
    for iid in interface_ids {
        run_one_interface(ctx, iid, sink, files)?;
    }
    Ok(())
}

fn run_one_interface(ctx: &mut Context, iid: DeclId, sink: &mut DiagnosticsSink, files: &FileTable) -> PassResult<()> {
    let methods: Vec<DeclId> = match ctx.get(iid) {
        Decl::Interface(i) => i.methods.clone(),
        _ => return Ok(()),
    };

    for &mid in &methods {
        let (name, loc, args, is_static, is_ctor, is_refinc, is_destroy) = match ctx.get(mid) {
            Decl::Method(m) => (
                m.name.clone(),
                m.location,
                m.args.clone(),
                m.attributes.has(AttrKind::Static),
                m.attributes.has(AttrKind::Ctor),
                m.attributes.has(AttrKind::RefInc),
                m.attributes.has(AttrKind::Destroy),
            ),
            _ => continue,
        };

        check_args(ctx, &name, &args, METHOD_CODES, true, sink, files)?;

        let this_args: Vec<DeclId> = args
            .iter()
            .copied()
            .filter(|a| ctx.get(*a).attributes().has(AttrKind::This))
            .collect();

        if is_static {
            if let Some(&a) = this_args.first() {
                let arg_name = ctx.get(a).name().to_string();
                return Err(sink.error(Code::E2046, loc, files, &[Arg::from(name.clone()), Arg::from(arg_name)]));
            }
        } else if is_ctor {
            if let Some(&a) = this_args.first() {
                let arg_name = ctx.get(a).name().to_string();
                return Err(sink.error(Code::E2047, loc, files, &[Arg::from(name.clone()), Arg::from(arg_name)]));
            }
        } else if this_args.len() != 1 {
            return Err(sink.error(Code::E2048, loc, files, &[Arg::from(name.clone())]));
        }

        if is_refinc && (is_static || this_args.len() != 1) {
            return Err(sink.error(Code::E2086, loc, files, &[]));
        }

        if is_destroy && (is_static || this_args.len() != 1) {
            return Err(sink.error(Code::E2087, loc, files, &[]));
        }
    }

    Ok(())
}
