//! Pass 7: property getter/setter linkage — a property's `get`/`set` attributes each name a
//! method on the same interface, and that method's shape (static-ness, argument count, return
//! type) must line up with the property itself.

use crate::ast::{Context, Decl, DeclId};
use crate::attributes::{AttrKind, AttrValue};
use crate::diagnostics::{Arg, Code, DiagnosticsSink, PassResult};
use crate::location::FileTable;

pub fn run(ctx: &mut Context, sink: &mut DiagnosticsSink, files: &FileTable) -> PassResult<()> {
    let interface_ids: Vec<DeclId> = ctx.ids().filter(|id| matches!(ctx.get(*id), Decl::Interface(_))).collect();
    for iid in interface_ids {
        let properties: Vec<DeclId> = match ctx.get(iid) {
            Decl::Interface(i) => i.properties.clone(),
            _ => continue,
        };
        for pid in properties {
            run_one(ctx, iid, pid, sink, files)?;
        }
    }
    Ok(())
}

fn method_ref(decl: &Decl, kind: AttrKind) -> Option<crate::ast::DeclRef> {
    match decl.attributes().get(kind).map(|e| &e.value) {
        Some(AttrValue::MethodRef(r)) => Some(r.clone()),
        _ => None,
    }
}

fn run_one(ctx: &mut Context, iid: DeclId, pid: DeclId, sink: &mut DiagnosticsSink, files: &FileTable) -> PassResult<()> {
    let (name, loc, is_static, property_type, getter, setter) = match ctx.get(pid) {
        Decl::Property(p) => (
            p.name.clone(),
            p.location,
            p.attributes.has(AttrKind::Static),
            p.property_type.clone(),
            method_ref(ctx.get(pid), AttrKind::Get),
            method_ref(ctx.get(pid), AttrKind::Set),
        ),
        _ => return Ok(()),
    };

    if getter.is_none() && setter.is_none() {
        return Err(sink.error(Code::E2052, loc, files, &[Arg::from(name)]));
    }

    let getter_method = match &getter {
        Some(r) => Some(check_accessor_method(ctx, iid, &name, is_static, r, loc, sink, files, true)?),
        None => None,
    };
    let setter_method = match &setter {
        Some(r) => Some(check_accessor_method(ctx, iid, &name, is_static, r, loc, sink, files, false)?),
        None => None,
    };

    if let (Some(g), Some(s)) = (getter_method, setter_method) {
        let (g_name, g_ret) = match ctx.get(g) {
            Decl::Method(m) => (m.name.clone(), m.return_type.clone()),
            _ => unreachable!(),
        };
        let (s_name, s_arg_type) = match ctx.get(s) {
            Decl::Method(m) => {
                let arg = m.args.iter().copied().find(|a| !ctx.get(*a).attributes().has(AttrKind::This));
                let ty = arg.and_then(|a| match ctx.get(a) {
                    Decl::Arg(ad) => ad.arg_type.clone(),
                    _ => None,
                });
                (m.name.clone(), ty)
            }
            _ => unreachable!(),
        };
        if let (Some(gt), Some(st)) = (&g_ret, &s_arg_type) {
            if !gt.matches(st) {
                return Err(sink.error(
                    Code::E2064,
                    loc,
                    files,
                    &[Arg::from(gt.display()), Arg::from(g_name), Arg::from(st.display()), Arg::from(s_name)],
                ));
            }
        }
    }

    if let Some(g) = getter_method {
        let g_ret = match ctx.get(g) {
            Decl::Method(m) => m.return_type.clone(),
            _ => None,
        };
        let g_name = ctx.get(g).name().to_string();
        if let (Some(pt), Some(gt)) = (&property_type, &g_ret) {
            if !pt.matches(gt) {
                return Err(sink.error(
                    Code::E2065,
                    loc,
                    files,
                    &[Arg::from(pt.display()), Arg::from(gt.display()), Arg::from(g_name)],
                ));
            }
        }
    }

    if let Some(s) = setter_method {
        let s_arg_type = match ctx.get(s) {
            Decl::Method(m) => {
                let arg = m.args.iter().copied().find(|a| !ctx.get(*a).attributes().has(AttrKind::This));
                arg.and_then(|a| match ctx.get(a) {
                    Decl::Arg(ad) => ad.arg_type.clone(),
                    _ => None,
                })
            }
            _ => None,
        };
        let s_name = ctx.get(s).name().to_string();
        if let (Some(pt), Some(st)) = (&property_type, &s_arg_type) {
            if !pt.matches(st) {
                return Err(sink.error(
                    Code::E2066,
                    loc,
                    files,
                    &[Arg::from(pt.display()), Arg::from(s_name), Arg::from(st.display())],
                ));
            }
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn check_accessor_method(
    ctx: &Context,
    iid: DeclId,
    prop_name: &str,
    prop_is_static: bool,
    r: &crate::ast::DeclRef,
    loc: crate::location::Location,
    sink: &mut DiagnosticsSink,
    files: &FileTable,
    is_getter: bool,
) -> PassResult<DeclId> {
    let not_method_code = if is_getter { Code::E2053 } else { Code::E2059 };
    let cross_iface_code = if is_getter { Code::E2054 } else { Code::E2061 };
    let static_mismatch_code = if is_getter { Code::E2055 } else { Code::E2060 };

    let Some(mid) = r.resolved else {
        return Err(sink.error(not_method_code, loc, files, &[Arg::from(r.name.clone())]));
    };
    let Decl::Method(m) = ctx.get(mid) else {
        return Err(sink.error(not_method_code, loc, files, &[Arg::from(r.name.clone())]));
    };

    if m.parent != Some(iid) {
        let iface_name = ctx.get(iid).name().to_string();
        let other_iface = m.parent.map(|p| ctx.get(p).name().to_string()).unwrap_or_default();
        return Err(sink.error(
            cross_iface_code,
            loc,
            files,
            &[Arg::from(prop_name), Arg::from(iface_name), Arg::from(m.name.clone()), Arg::from(other_iface)],
        ));
    }

    let is_static = m.attributes.has(AttrKind::Static);

    if is_static != prop_is_static {
        return Err(sink.error(static_mismatch_code, loc, files, &[Arg::from(m.name.clone()), Arg::from(prop_name)]));
    }

    let this_args = m.args.iter().filter(|a| ctx.get(**a).attributes().has(AttrKind::This)).count();
    let non_this_args = m.args.len() - this_args;

    if is_getter {
        if is_static {
            if !m.args.is_empty() {
                return Err(sink.error(Code::E2056, loc, files, &[Arg::from(m.name.clone())]));
            }
        } else if non_this_args != 0 || this_args != 1 {
            return Err(sink.error(Code::E2057, loc, files, &[Arg::from(m.name.clone())]));
        }
        if matches!(&m.return_type, Some(t) if t.is_void()) {
            return Err(sink.error(Code::E2058, loc, files, &[Arg::from(m.name.clone())]));
        }
    } else if is_static {
        if m.args.len() != 1 {
            return Err(sink.error(Code::E2062, loc, files, &[Arg::from(m.name.clone())]));
        }
    } else if this_args != 1 || non_this_args != 1 {
        return Err(sink.error(Code::E2063, loc, files, &[Arg::from(m.name.clone())]));
    }

    Ok(mid)
}
