//! Pass 9: interface-wide invariants that span more than one method — at most one `refinc`
//! method and at most one `destroy` method per interface. Per-method shape of those two
//! (non-static, single `this` argument) is checked in the methods pass.

use crate::ast::{Context, Decl, DeclId};
use crate::attributes::AttrKind;
use crate::diagnostics::{Code, DiagnosticsSink, PassResult};
use crate::location::FileTable;

pub fn run(ctx: &mut Context, sink: &mut DiagnosticsSink, files: &FileTable) -> PassResult<()> {
    let interface_ids: Vec<DeclId> = ctx.ids().filter(|id| matches!(ctx.get(*id), Decl::Interface(_))).collect();
    for iid in interface_ids {
        run_one(ctx, iid, sink, files)?;
    }
    Ok(())
}

fn run_one(ctx: &Context, iid: DeclId, sink: &mut DiagnosticsSink, files: &FileTable) -> PassResult<()> {
    let methods: Vec<DeclId> = match ctx.get(iid) {
        Decl::Interface(i) => i.methods.clone(),
        _ => return Ok(()),
    };

    let mut refinc_seen = false;
    let mut destroy_seen = false;

    for mid in methods {
        let Decl::Method(m) = ctx.get(mid) else { continue };
        if m.attributes.has(AttrKind::RefInc) {
            if refinc_seen {
                return Err(sink.error(Code::E2088, m.location, files, &[]));
            }
            refinc_seen = true;
        }
        if m.attributes.has(AttrKind::Destroy) {
            if destroy_seen {
                return Err(sink.error(Code::E2089, m.location, files, &[]));
            }
            destroy_seen = true;
        }
    }

    Ok(())
}
