//! Pass 3: an interface's `type(...)` attribute, when present, must name a struct marked with
//! `handle` — the pattern used to wrap an opaque native pointer behind an interface.

use crate::ast::{Context, Decl, DeclId, TypeName};
use crate::attributes::AttrKind;
use crate::diagnostics::{Arg, Code, DiagnosticsSink, PassResult};
use crate::location::FileTable;

pub fn run(ctx: &mut Context, sink: &mut DiagnosticsSink, files: &FileTable) -> PassResult<()> {
    let interface_ids: Vec<DeclId> = ctx.ids().filter(|id| matches!(ctx.get(*id), Decl::Interface(_))).collect();
    for iid in interface_ids {
        let (name, loc, handle_type) = match ctx.get(iid) {
            Decl::Interface(i) => (i.name.clone(), i.location, i.handle_type.clone()),
            _ => continue,
        };

        let Some(handle_type) = handle_type else {
            // Having no `type(...)` at all is fine; the interface simply isn't handle-backed.
            continue;
        };

        let TypeName::Decl(r) = &handle_type else {
            return Err(sink.error(Code::E2070, loc, files, &[Arg::from(name)]));
        };
        let Some(target) = r.resolved else {
            return Err(sink.error(Code::E2069, loc, files, &[Arg::from(name)]));
        };
        let Decl::Struct(_) = ctx.get(target) else {
            return Err(sink.error(Code::E2070, loc, files, &[Arg::from(name)]));
        };
        if !ctx.get(target).attributes().has(AttrKind::Handle) {
            let struct_name = ctx.get(target).name().to_string();
            return Err(sink.error(Code::E2071, loc, files, &[Arg::from(struct_name), Arg::from(name)]));
        }
    }
    Ok(())
}
