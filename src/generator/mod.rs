//! Back-end code generation.
//!
//! A [`Generator`] does exactly one thing: walk the validated [`Context`] and write a textual
//! rendering to a sink, in the spirit of the `Emit`/`Emitter` pair used for syntax rendering
//! elsewhere in this toolchain. A C# generator would mirror the reference implementation's
//! backend closest of all, but that backend was itself never finished there, so only the C
//! header and JS/Embind generators are implemented here.

use std::fmt;

use crate::ast::{Context, TypeName};

pub mod c;
pub mod js;

#[derive(Debug)]
pub struct GenError(pub fmt::Error);

impl From<fmt::Error> for GenError {
    fn from(e: fmt::Error) -> Self {
        GenError(e)
    }
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "generator write error: {}", self.0)
    }
}

impl std::error::Error for GenError {}

/// Which backend to run; selected from the CLI's `--generator` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    C,
    Js,
}

impl GeneratorKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "c" => Some(Self::C),
            "js" => Some(Self::Js),
            _ => None,
        }
    }

    pub fn make(self) -> Box<dyn Generator> {
        match self {
            GeneratorKind::C => Box::new(c::CGenerator),
            GeneratorKind::Js => Box::new(js::JsGenerator),
        }
    }
}

pub trait Generator {
    /// Short name used in log output and the output file's default extension.
    fn name(&self) -> &'static str;
    fn file_extension(&self) -> &'static str;
    fn generate(&self, ctx: &Context, out: &mut String) -> Result<(), GenError>;
}

/// C-style type name shared by both backends: the C generator emits it directly, and the JS
/// generator's Embind glue is itself C++ source, so it needs the same mapping.
pub(crate) fn native_type(ctx: &Context, ty: &TypeName) -> String {
    use crate::ast::Decl;
    match ty {
        TypeName::Void => "void".to_string(),
        TypeName::Bool => "bool".to_string(),
        TypeName::Int8 => "int8_t".to_string(),
        TypeName::UInt8 => "uint8_t".to_string(),
        TypeName::Int16 => "int16_t".to_string(),
        TypeName::UInt16 => "uint16_t".to_string(),
        TypeName::Int32 => "int32_t".to_string(),
        TypeName::UInt32 => "uint32_t".to_string(),
        TypeName::Int64 => "int64_t".to_string(),
        TypeName::UInt64 => "uint64_t".to_string(),
        TypeName::Float32 => "float".to_string(),
        TypeName::Float64 => "double".to_string(),
        TypeName::Str => "const char*".to_string(),
        TypeName::Data => "uint8_t*".to_string(),
        TypeName::ConstData => "const uint8_t*".to_string(),
        TypeName::Decl(r) => match r.resolved.map(|id| ctx.get(id)) {
            Some(Decl::Struct(s)) => format!("{}_t", s.name),
            Some(Decl::Enum(e)) => format!("{}_t", e.name),
            Some(Decl::Interface(i)) => format!("{}*", i.name),
            Some(Decl::Callback(c)) => c.name.clone(),
            _ => r.name.clone(),
        },
    }
}
