//! Pass 5: free function argument-list checks. Functions never take a `this` argument — they
//! aren't bound to an interface instance.

use crate::ast::{Context, Decl, DeclId};
use crate::diagnostics::{DiagnosticsSink, PassResult};
use crate::location::FileTable;

use super::args_common::{check_args, FUNC_CODES};

pub fn run(ctx: &mut Context, sink: &mut DiagnosticsSink, files: &FileTable) -> PassResult<()> {
    let ids: Vec<DeclId> = ctx.ids().filter(|id| matches!(ctx.get(*id), Decl::Func(_))).collect();
    for id in ids {
        let (name, args) = match ctx.get(id) {
            Decl::Func(f) => (f.name.clone(), f.args.clone()),
            _ => continue,
        };
        check_args(ctx, &name, &args, FUNC_CODES, false, sink, files)?;
    }
    Ok(())
}
