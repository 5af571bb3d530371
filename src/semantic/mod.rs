//! The ten semantic passes, run in fixed order over the resolved AST. Each pass owns one area
//! of the rule table; the first one to hit a violation halts (via [`Halt`]) and stops the whole
//! sequence, matching the reference compiler's single try/catch wrapping every `prepare*()` call.

mod args_common;
mod callbacks;
mod constants;
mod documentation;
mod events;
mod functions;
mod handles;
mod interfaces;
mod methods;
mod properties;
mod structs;

use crate::ast::Context;
use crate::diagnostics::{DiagnosticsSink, PassResult};
use crate::location::FileTable;

/// Runs the ten passes in the fixed order the spec assigns them. The diagnostic is already
/// recorded in the sink by the time a pass returns `Err(Halt)`; this just stops the remaining
/// passes from running over an AST whose earlier subsystem didn't validate cleanly.
pub fn run_all(ctx: &mut Context, sink: &mut DiagnosticsSink, files: &FileTable) -> PassResult<()> {
    constants::run(ctx, sink, files)?;
    structs::run(ctx, sink, files)?;
    handles::run(ctx, sink, files)?;
    callbacks::run(ctx, sink, files)?;
    functions::run(ctx, sink, files)?;
    methods::run(ctx, sink, files)?;
    properties::run(ctx, sink, files)?;
    events::run(ctx, sink, files)?;
    interfaces::run(ctx, sink, files)?;
    documentation::run(ctx, sink, files)?;
    Ok(())
}
