//! JS/Embind binding generator. Emits the `EMSCRIPTEN_BINDINGS` block a hand-written Embind
//! wrapper would carry: enums via `enum_<>`, structs via `value_object<>`, interfaces via
//! `class_<>` with one `.function()` per method. This is a starting point for a real binding
//! layer, not a replacement for one — Embind needs the C++ struct/class definitions this header
//! describes to actually exist somewhere.

use std::fmt::Write as _;

use crate::ast::{Context, Decl, DeclId};
use crate::attributes::AttrKind;

use super::{GenError, Generator};

pub struct JsGenerator;

impl Generator for JsGenerator {
    fn name(&self) -> &'static str {
        "js"
    }

    fn file_extension(&self) -> &'static str {
        "cpp"
    }

    fn generate(&self, ctx: &Context, out: &mut String) -> Result<(), GenError> {
        writeln!(out, "#include <emscripten/bind.h>")?;
        writeln!(out, "using namespace emscripten;")?;
        writeln!(out)?;
        writeln!(out, "EMSCRIPTEN_BINDINGS(api) {{")?;

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
        for &id in &api.funcs {
            emit_func(ctx, id, out)?;
        }

        writeln!(out, "}}")?;
        Ok(())
    }
}

fn emit_enum(ctx: &Context, id: DeclId, out: &mut String) -> Result<(), GenError> {
    let Decl::Enum(e) = ctx.get(id) else { return Ok(()) };
    writeln!(out, "    enum_<{}_t>(\"{}\")", e.name, e.name)?;
    for &cid in &e.consts {
        let Decl::EnumConst(c) = ctx.get(cid) else { continue };
        writeln!(out, "        .value(\"{}\", {}_{})", c.name, e.name, c.name)?;
    }
    writeln!(out, "        ;")?;
    Ok(())
}

fn emit_struct(ctx: &Context, id: DeclId, out: &mut String) -> Result<(), GenError> {
    let Decl::Struct(s) = ctx.get(id) else { return Ok(()) };
    writeln!(out, "    value_object<{}_t>(\"{}\")", s.name, s.name)?;
    for &fid in &s.fields {
        let Decl::Field(f) = ctx.get(fid) else { continue };
        writeln!(out, "        .field(\"{}\", &{}_t::{})", f.name, s.name, f.name)?;
    }
    writeln!(out, "        ;")?;
    Ok(())
}

fn emit_interface(ctx: &Context, id: DeclId, out: &mut String) -> Result<(), GenError> {
    let Decl::Interface(i) = ctx.get(id) else { return Ok(()) };
    writeln!(out, "    class_<{}_t>(\"{}\")", i.name, i.name)?;
    for &mid in &i.methods {
        let Decl::Method(m) = ctx.get(mid) else { continue };
        if m.attributes.has(AttrKind::Static) {
            writeln!(out, "        .class_function(\"{}\", &{}_t::{})", m.name, i.name, m.name)?;
        } else {
            writeln!(out, "        .function(\"{}\", &{}_t::{})", m.name, i.name, m.name)?;
        }
    }
    writeln!(out, "        ;")?;
    Ok(())
}

fn emit_func(ctx: &Context, id: DeclId, out: &mut String) -> Result<(), GenError> {
    let Decl::Func(f) = ctx.get(id) else { return Ok(()) };
    writeln!(out, "    function(\"{}\", &{});", f.name, f.name)?;
    Ok(())
}
