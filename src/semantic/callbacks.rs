//! Pass 4: callback argument-list checks.

use crate::ast::{Context, Decl, DeclId};
use crate::diagnostics::{DiagnosticsSink, PassResult};
use crate::location::FileTable;

use super::args_common::{check_args, CALLBACK_CODES};

pub fn run(ctx: &mut Context, sink: &mut DiagnosticsSink, files: &FileTable) -> PassResult<()> {
    let ids: Vec<DeclId> = ctx.ids().filter(|id| matches!(ctx.get(*id), Decl::Callback(_))).collect();
    for id in ids {
        let (name, args) = match ctx.get(id) {
            Decl::Callback(c) => (c.name.clone(), c.args.clone()),
            _ => continue,
        };
        check_args(ctx, &name, &args, CALLBACK_CODES, false, sink, files)?;
    }
    Ok(())
}
