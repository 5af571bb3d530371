//! Pass 2: struct field shape checks — `Void` fields, and the `array`/`datasize` attributes
//! that point one field at another to describe a dynamically-sized buffer.

use crate::ast::{Context, Decl, DeclId, TypeName};
use crate::attributes::{AttrKind, AttrValue};
use crate::diagnostics::{Arg, Code, DiagnosticsSink, PassResult};
use crate::location::FileTable;

pub fn run(ctx: &mut Context, sink: &mut DiagnosticsSink, files: &FileTable) -> PassResult<()> {
    let struct_ids: Vec<DeclId> = ctx.ids().filter(|id| matches!(ctx.get(*id), Decl::Struct(_))).collect();
    for sid in struct_ids {
        run_one(ctx, sid, sink, files)?;
    }
    Ok(())
}

fn run_one(ctx: &mut Context, struct_id: DeclId, sink: &mut DiagnosticsSink, files: &FileTable) -> PassResult<()> {
    let struct_name = ctx.get(struct_id).name().to_string();
    let fields: Vec<DeclId> = match ctx.get(struct_id) {
        Decl::Struct(s) => s.fields.clone(),
        _ => return Ok(()),
    };

    for &fid in &fields {
        let (field_name, field_type, loc) = match ctx.get(fid) {
            Decl::Field(f) => (f.name.clone(), f.field_type.clone(), f.location),
            _ => continue,
        };

        if matches!(&field_type, Some(t) if t.is_void()) {
            return Err(sink.error(Code::E2068, loc, files, &[Arg::from(field_name.clone()), Arg::from(struct_name.clone())]));
        }

        let has_array = ctx.get(fid).attributes().has(AttrKind::Array);
        let has_datasize = ctx.get(fid).attributes().has(AttrKind::DataSize);
        if has_array && has_datasize {
            return Err(sink.error(Code::E2124, loc, files, &[Arg::from(field_name.clone())]));
        }

        if has_array {
            check_array(ctx, fid, &field_name, &struct_name, &fields, sink, files)?;
        }
        if has_datasize {
            check_datasize(ctx, fid, &field_name, &field_type, &fields, sink, files)?;
        }
    }

    Ok(())
}

fn check_array(
    ctx: &Context,
    fid: DeclId,
    field_name: &str,
    struct_name: &str,
    siblings: &[DeclId],
    sink: &mut DiagnosticsSink,
    files: &FileTable,
) -> PassResult<()> {
    let loc = ctx.get(fid).location();
    let entry = ctx.get(fid).attributes().get(AttrKind::Array).expect("checked by caller");
    match &entry.value {
        AttrValue::ArraySize(n) => {
            if *n < 1 {
                return Err(sink.error(Code::E2077, loc, files, &[Arg::from(field_name), Arg::from(struct_name)]));
            }
            Ok(())
        }
        AttrValue::ArrayRef(r) => {
            let Some(target) = r.resolved else {
                return Err(sink.error(Code::E2078, loc, files, &[Arg::from(field_name)]));
            };
            let fid_index = siblings.iter().position(|&s| s == fid);
            let target_index = siblings.iter().position(|&s| s == target);
            match (target_index, fid_index) {
                (Some(ti), Some(fi)) if ti < fi => {}
                _ => return Err(sink.error(Code::E2079, loc, files, &[])),
            }
            let is_integer = matches!(ctx.get(target), Decl::Field(f) if matches!(&f.field_type, Some(t) if t.is_integer()));
            if !is_integer {
                return Err(sink.error(Code::E2080, loc, files, &[Arg::from(field_name)]));
            }
            Ok(())
        }
        _ => unreachable!("AttrKind::Array only ever resolves to ArraySize or ArrayRef"),
    }
}

fn check_datasize(
    ctx: &Context,
    fid: DeclId,
    field_name: &str,
    field_type: &Option<TypeName>,
    siblings: &[DeclId],
    sink: &mut DiagnosticsSink,
    files: &FileTable,
) -> PassResult<()> {
    let loc = ctx.get(fid).location();
    if !matches!(field_type, Some(t) if t.is_data()) {
        return Err(sink.error(Code::E2119, loc, files, &[]));
    }
    let entry = ctx.get(fid).attributes().get(AttrKind::DataSize).expect("checked by caller");
    let AttrValue::DataSizeRef(r) = &entry.value else {
        unreachable!("AttrKind::DataSize only ever resolves to DataSizeRef")
    };
    let Some(target) = r.resolved else {
        return Err(sink.error(Code::E2113, loc, files, &[Arg::from(field_name)]));
    };
    let fid_index = siblings.iter().position(|&s| s == fid);
    let target_index = siblings.iter().position(|&s| s == target);
    match (target_index, fid_index) {
        (Some(ti), Some(fi)) if ti < fi => {}
        _ => return Err(sink.error(Code::E2118, loc, files, &[])),
    }
    let is_integer = matches!(ctx.get(target), Decl::Field(f) if matches!(&f.field_type, Some(t) if t.is_integer()));
    if !is_integer {
        return Err(sink.error(Code::E2114, loc, files, &[Arg::from(field_name)]));
    }
    Ok(())
}
