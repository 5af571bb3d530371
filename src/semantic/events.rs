//! Pass 8: event getter/setter linkage. Structurally the same rules as properties, except each
//! accessor may additionally carry a `userdata` argument (events are usually wired through a
//! native callback registration, which needs somewhere to stash the caller's opaque pointer).

use crate::ast::{Context, Decl, DeclId};
use crate::attributes::{AttrKind, AttrValue};
use crate::diagnostics::{Arg, Code, DiagnosticsSink, PassResult};
use crate::location::FileTable;

pub fn run(ctx: &mut Context, sink: &mut DiagnosticsSink, files: &FileTable) -> PassResult<()> {
    let interface_ids: Vec<DeclId> = ctx.ids().filter(|id| matches!(ctx.get(*id), Decl::Interface(_))).collect();
    for iid in interface_ids {
        let events: Vec<DeclId> = match ctx.get(iid) {
            Decl::Interface(i) => i.events.clone(),
            _ => continue,
        };
        for eid in events {
            run_one(ctx, iid, eid, sink, files)?;
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

fn non_this_arg_type(ctx: &Context, args: &[DeclId]) -> Option<crate::ast::TypeName> {
    args.iter()
        .copied()
        .find(|a| !ctx.get(*a).attributes().has(AttrKind::This) && !ctx.get(*a).attributes().has(AttrKind::UserData))
        .and_then(|a| match ctx.get(a) {
            Decl::Arg(ad) => ad.arg_type.clone(),
            _ => None,
        })
}

fn run_one(ctx: &mut Context, iid: DeclId, eid: DeclId, sink: &mut DiagnosticsSink, files: &FileTable) -> PassResult<()> {
    let (name, loc, is_static, event_type, getter, setter) = match ctx.get(eid) {
        Decl::Event(e) => (
            e.name.clone(),
            e.location,
            e.attributes.has(AttrKind::Static),
            e.event_type.clone(),
            method_ref(ctx.get(eid), AttrKind::Get),
            method_ref(ctx.get(eid), AttrKind::Set),
        ),
        _ => return Ok(()),
    };

    if getter.is_none() && setter.is_none() {
        return Err(sink.error(Code::E2091, loc, files, &[Arg::from(name)]));
    }

    let getter_method = match &getter {
        Some(r) => Some(check_accessor_method(ctx, iid, &name, is_static, r, loc, sink, files, true)?),
        None => None,
    };
    let setter_method = match &setter {
        Some(r) => Some(check_accessor_method(ctx, iid, &name, is_static, r, loc, sink, files, false)?),
        None => None,
    };

    if let Some(g) = getter_method {
        let g_ret = match ctx.get(g) {
            Decl::Method(m) => m.return_type.clone(),
            _ => None,
        };
        let g_name = ctx.get(g).name().to_string();
        if let (Some(et), Some(gt)) = (&event_type, &g_ret) {
            if !et.matches(gt) {
                return Err(sink.error(
                    Code::E2100,
                    loc,
                    files,
                    &[Arg::from(et.display()), Arg::from(gt.display()), Arg::from(g_name)],
                ));
            }
        }
    }

    if let Some(s) = setter_method {
        let s_arg_type = match ctx.get(s) {
            Decl::Method(m) => non_this_arg_type(ctx, &m.args),
            _ => None,
        };
        let s_name = ctx.get(s).name().to_string();
        if let (Some(et), Some(st)) = (&event_type, &s_arg_type) {
            if !et.matches(st) {
                return Err(sink.error(
                    Code::E2101,
                    loc,
                    files,
                    &[Arg::from(et.display()), Arg::from(s_name), Arg::from(st.display())],
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
    event_name: &str,
    event_is_static: bool,
    r: &crate::ast::DeclRef,
    loc: crate::location::Location,
    sink: &mut DiagnosticsSink,
    files: &FileTable,
    is_getter: bool,
) -> PassResult<DeclId> {
    let not_method_code = if is_getter { Code::E2053 } else { Code::E2059 };
    let cross_iface_code = if is_getter { Code::E2092 } else { Code::E2096 };
    let static_mismatch_code = if is_getter { Code::E2093 } else { Code::E2097 };

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
            &[Arg::from(event_name), Arg::from(iface_name), Arg::from(m.name.clone()), Arg::from(other_iface)],
        ));
    }

    let is_static = m.attributes.has(AttrKind::Static);
    if is_static != event_is_static {
        return Err(sink.error(static_mismatch_code, loc, files, &[Arg::from(m.name.clone()), Arg::from(event_name)]));
    }

    let this_count = m.args.iter().filter(|a| ctx.get(**a).attributes().has(AttrKind::This)).count();
    let userdata_count = m.args.iter().filter(|a| ctx.get(**a).attributes().has(AttrKind::UserData)).count();
    let plain_count = m.args.len() - this_count - userdata_count;

    if is_getter {
        if is_static {
            if !(plain_count == 0 && this_count == 0 && userdata_count <= 1) {
                return Err(sink.error(Code::E2094, loc, files, &[Arg::from(m.name.clone())]));
            }
        } else if !(this_count == 1 && plain_count == 0 && userdata_count <= 1) {
            return Err(sink.error(Code::E2095, loc, files, &[Arg::from(m.name.clone())]));
        }
    } else if is_static {
        if !(plain_count == 1 && this_count == 0 && userdata_count <= 1) {
            return Err(sink.error(Code::E2098, loc, files, &[Arg::from(m.name.clone())]));
        }
    } else if !(this_count == 1 && plain_count == 1 && userdata_count <= 1) {
        return Err(sink.error(Code::E2099, loc, files, &[Arg::from(m.name.clone())]));
    }

    Ok(mid)
}
