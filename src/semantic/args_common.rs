//! Shared argument-list checks used by the function, callback, and method passes: a `Void`
//! argument is always wrong, `userdata`/`result` may each appear on at most one argument, and
//! `array`/`datasize` argument references must stay within the same argument list — each owner
//! kind just reports a different code for the "cannot be Void" case and the "this not allowed"
//! case, since the three keep separate slices of the diagnostic table.

use crate::ast::{Context, Decl, DeclId};
use crate::attributes::{AttrKind, AttrValue};
use crate::diagnostics::{Arg, Code, DiagnosticsSink, PassResult};
use crate::location::FileTable;

#[derive(Clone, Copy)]
pub struct ArgCodes {
    pub void_arg: Code,
    pub this_not_allowed: Code,
    pub array_must_point_into_list: Code,
    pub array_outside_visibility: Code,
    pub datasize_must_point_into_list: Code,
    pub datasize_outside_visibility: Code,
    pub datasize_type_mismatch: Code,
}

pub const METHOD_CODES: ArgCodes = ArgCodes {
    void_arg: Code::E2051,
    this_not_allowed: Code::E2051,
    array_must_point_into_list: Code::E2104,
    array_outside_visibility: Code::E2103,
    datasize_must_point_into_list: Code::E2115,
    datasize_outside_visibility: Code::E2123,
    datasize_type_mismatch: Code::E2121,
};

pub const FUNC_CODES: ArgCodes = ArgCodes {
    void_arg: Code::E2074,
    this_not_allowed: Code::E2073,
    array_must_point_into_list: Code::E2106,
    array_outside_visibility: Code::E2105,
    datasize_must_point_into_list: Code::E2116,
    datasize_outside_visibility: Code::E2122,
    datasize_type_mismatch: Code::E2121,
};

pub const CALLBACK_CODES: ArgCodes = ArgCodes {
    void_arg: Code::E2074,
    this_not_allowed: Code::E2083,
    array_must_point_into_list: Code::E2108,
    array_outside_visibility: Code::E2107,
    datasize_must_point_into_list: Code::E2117,
    datasize_outside_visibility: Code::E2120,
    datasize_type_mismatch: Code::E2121,
};

/// Checks common to a method/function/callback's argument list. `allow_this` is true only for
/// non-static methods, where exactly one argument is expected to carry the `this` attribute
/// (checked separately by the methods pass); everywhere else `this` is simply illegal.
pub fn check_args(
    ctx: &Context,
    owner_name: &str,
    args: &[DeclId],
    codes: ArgCodes,
    allow_this: bool,
    sink: &mut DiagnosticsSink,
    files: &FileTable,
) -> PassResult<()> {
    let mut userdata_seen = false;
    let mut result_seen = false;

    for &aid in args {
        let Decl::Arg(a) = ctx.get(aid) else { continue };
        let loc = a.location;

        if matches!(&a.arg_type, Some(t) if t.is_void()) {
            return Err(sink.error(codes.void_arg, loc, files, &[Arg::from(a.name.as_str()), Arg::from(owner_name)]));
        }

        if matches!(ctx.get(aid).attributes().get(AttrKind::Array).map(|e| &e.value), Some(AttrValue::ArraySize(_))) {
            return Err(sink.error(Code::E2102, loc, files, &[Arg::from(a.name.as_str()), Arg::from(owner_name)]));
        }

        if !allow_this && ctx.get(aid).attributes().has(AttrKind::This) {
            return Err(sink.error(codes.this_not_allowed, loc, files, &[Arg::from(owner_name), Arg::from(a.name.as_str())]));
        }

        if ctx.get(aid).attributes().has(AttrKind::UserData) {
            if userdata_seen {
                return Err(sink.error(Code::E2082, loc, files, &[]));
            }
            userdata_seen = true;
        }

        if ctx.get(aid).attributes().has(AttrKind::Result) {
            if result_seen {
                return Err(sink.error(Code::E2084, loc, files, &[]));
            }
            result_seen = true;
        }

        if let Some(entry) = ctx.get(aid).attributes().get(AttrKind::Array) {
            if let AttrValue::ArrayRef(r) = &entry.value {
                let Some(target) = r.resolved else {
                    return Err(sink.error(codes.array_must_point_into_list, loc, files, &[Arg::from(a.name.as_str())]));
                };
                if !args.contains(&target) {
                    return Err(sink.error(codes.array_outside_visibility, loc, files, &[]));
                }
            }
        }

        if let Some(entry) = ctx.get(aid).attributes().get(AttrKind::DataSize) {
            if let AttrValue::DataSizeRef(r) = &entry.value {
                if !matches!(&a.arg_type, Some(t) if t.is_data()) {
                    return Err(sink.error(codes.datasize_type_mismatch, loc, files, &[]));
                }
                let Some(target) = r.resolved else {
                    return Err(sink.error(codes.datasize_must_point_into_list, loc, files, &[Arg::from(a.name.as_str())]));
                };
                if !args.contains(&target) {
                    return Err(sink.error(codes.datasize_outside_visibility, loc, files, &[]));
                }
            }
        }
    }

    Ok(())
}
