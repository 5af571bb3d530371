//! Pass 10: documentation completeness. Every declaration except a bare argument is expected to
//! carry at least a brief or detailed description; the root `api` declaration additionally warns
//! when it is missing author/copyright information, since that's the one declaration a generated
//! header's file banner actually quotes.

use crate::ast::{Context, Decl, DeclId};
use crate::diagnostics::{Arg, Code, DiagnosticsSink, PassResult};
use crate::location::FileTable;

pub fn run(ctx: &mut Context, sink: &mut DiagnosticsSink, files: &FileTable) -> PassResult<()> {
    let ids: Vec<DeclId> = ctx.ids().collect();
    for id in ids {
        run_one(ctx, id, sink, files)?;
    }
    Ok(())
}

fn run_one(ctx: &Context, id: DeclId, sink: &mut DiagnosticsSink, files: &FileTable) -> PassResult<()> {
    let decl = ctx.get(id);
    if matches!(decl, Decl::Arg(_)) {
        return Ok(());
    }

    let doc = decl.documentation();
    let name = decl.name().to_string();
    let loc = decl.location();

    if doc.is_empty() {
        return Err(sink.error(Code::E2005, loc, files, &[Arg::from(name)]));
    }

    if !doc.has_brief_or_detail() {
        return Err(sink.error(Code::E2111, loc, files, &[Arg::from(name)]));
    }

    if matches!(decl, Decl::Api(_)) {
        if doc.authors.is_empty() {
            sink.warn(Code::W1001, loc, files, &[Arg::from(name.clone())]);
        }
        if doc.copyright.is_none() {
            sink.warn(Code::W1002, loc, files, &[Arg::from(name)]);
        }
    }

    Ok(())
}
