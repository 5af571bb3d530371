//! C header generator. Enums and structs become `typedef`s; an interface becomes an opaque
//! pointer type plus one free function per method, with the `this`-attributed argument mapped to
//! that pointer as the function's first parameter — the usual shape of a C wrapper around an
//! object-oriented API.

use std::fmt::Write as _;

use crate::ast::{Context, Decl, DeclId};
use crate::attributes::AttrKind;

use super::{native_type, GenError, Generator};

pub struct CGenerator;

impl Generator for CGenerator {
    fn name(&self) -> &'static str {
        "c"
    }

    fn file_extension(&self) -> &'static str {
        "h"
    }

    fn generate(&self, ctx: &Context, out: &mut String) -> Result<(), GenError> {
        writeln!(out, "#pragma once")?;
        writeln!(out, "#include <stdint.h>")?;
        writeln!(out, "#include <stdbool.h>")?;
        writeln!(out)?;

        let api = ctx.api().expect("validated AST always has one api node");

        for &id in &api.enums {
            emit_enum(ctx, id, out)?;
        }
        for &id in &api.structs {
            emit_struct(ctx, id, out)?;
        }
        for &id in &api.interfaces {
            emit_interface(ctx, id, out)?;
        }
        for &id in &api.callbacks {
            emit_callback(ctx, id, out)?;
        }
        for &id in &api.funcs {
            emit_func(ctx, id, out)?;
        }

        Ok(())
    }
}

fn emit_enum(ctx: &Context, id: DeclId, out: &mut String) -> Result<(), GenError> {
    let Decl::Enum(e) = ctx.get(id) else { return Ok(()) };
    writeln!(out, "typedef enum {{")?;
    for &cid in &e.consts {
        let Decl::EnumConst(c) = ctx.get(cid) else { continue };
        writeln!(out, "    {}_{} = {},", e.name, c.name, c.resolved_value.unwrap_or(0))?;
    }
    writeln!(out, "}} {}_t;", e.name)?;
    writeln!(out)?;
    Ok(())
}

fn emit_struct(ctx: &Context, id: DeclId, out: &mut String) -> Result<(), GenError> {
    let Decl::Struct(s) = ctx.get(id) else { return Ok(()) };
    writeln!(out, "typedef struct {{")?;
    for &fid in &s.fields {
        let Decl::Field(f) = ctx.get(fid) else { continue };
        let ty = f.field_type.as_ref().map(|t| native_type(ctx, t)).unwrap_or_else(|| "void".to_string());
        if let Some(entry) = f.attributes.get(AttrKind::Array) {
            if let crate::attributes::AttrValue::ArraySize(n) = &entry.value {
                writeln!(out, "    {} {}[{}];", ty, f.name, n)?;
                continue;
            }
        }
        writeln!(out, "    {} {};", ty, f.name)?;
    }
    writeln!(out, "}} {}_t;", s.name)?;
    writeln!(out)?;
    Ok(())
}

fn emit_interface(ctx: &Context, id: DeclId, out: &mut String) -> Result<(), GenError> {
    let Decl::Interface(i) = ctx.get(id) else { return Ok(()) };
    writeln!(out, "typedef struct {}_s {}_t;", i.name, i.name)?;
    writeln!(out)?;
    for &mid in &i.methods {
        emit_interface_method(ctx, &i.name, mid, out)?;
    }
    writeln!(out)?;
    Ok(())
}

fn emit_interface_method(ctx: &Context, iface_name: &str, mid: DeclId, out: &mut String) -> Result<(), GenError> {
    let Decl::Method(m) = ctx.get(mid) else { return Ok(()) };
    let ret = m.return_type.as_ref().map(|t| native_type(ctx, t)).unwrap_or_else(|| "void".to_string());

    let mut params = Vec::new();
    for &aid in &m.args {
        let Decl::Arg(a) = ctx.get(aid) else { continue };
        if a.attributes.has(AttrKind::This) {
            params.push(format!("{}_t* self", iface_name));
            continue;
        }
        let ty = a.arg_type.as_ref().map(|t| native_type(ctx, t)).unwrap_or_else(|| "void".to_string());
        params.push(format!("{} {}", ty, a.name));
    }
    if params.is_empty() {
        params.push("void".to_string());
    }

    writeln!(out, "{} {}_{}({});", ret, iface_name, m.name, params.join(", "))?;
    Ok(())
}

fn emit_callback(ctx: &Context, id: DeclId, out: &mut String) -> Result<(), GenError> {
    let Decl::Callback(c) = ctx.get(id) else { return Ok(()) };
    let ret = c.return_type.as_ref().map(|t| native_type(ctx, t)).unwrap_or_else(|| "void".to_string());
    let params: Vec<String> = c
        .args
        .iter()
        .filter_map(|&aid| match ctx.get(aid) {
            Decl::Arg(a) => {
                let ty = a.arg_type.as_ref().map(|t| native_type(ctx, t)).unwrap_or_else(|| "void".to_string());
                Some(format!("{} {}", ty, a.name))
            }
            _ => None,
        })
        .collect();
    let params = if params.is_empty() { "void".to_string() } else { params.join(", ") };
    writeln!(out, "typedef {} (*{})({});", ret, c.name, params)?;
    writeln!(out)?;
    Ok(())
}

fn emit_func(ctx: &Context, id: DeclId, out: &mut String) -> Result<(), GenError> {
    let Decl::Func(f) = ctx.get(id) else { return Ok(()) };
    let ret = f.return_type.as_ref().map(|t| native_type(ctx, t)).unwrap_or_else(|| "void".to_string());
    let params: Vec<String> = f
        .args
        .iter()
        .filter_map(|&aid| match ctx.get(aid) {
            Decl::Arg(a) => {
                let ty = a.arg_type.as_ref().map(|t| native_type(ctx, t)).unwrap_or_else(|| "void".to_string());
                Some(format!("{} {}", ty, a.name))
            }
            _ => None,
        })
        .collect();
    let params = if params.is_empty() { "void".to_string() } else { params.join(", ") };
    writeln!(out, "{} {}({});", ret, f.name, params)?;
    Ok(())
}
