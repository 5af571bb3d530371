//! Typed attribute storage and the attribute validation engine.
//!
//! The parser hands each declaration a list of [`RawAttribute`]s in source order; the engine
//! here checks each one against the context table (is this attribute even legal on this kind of
//! declaration?), checks arity (does it take the argument shape it's given?), rejects repeats,
//! and folds the survivors into a sparse [`AttributeSet`] keyed by [`AttrKind`] so later passes
//! do an O(1) lookup instead of rescanning a raw attribute list.

use std::collections::BTreeMap;

use crate::ast::{DeclKind, DeclRef, Literal};
use crate::diagnostics::{Arg, Code, DiagnosticsSink, PassResult};
use crate::location::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttrKind {
    Platform,
    Flags,
    Hex,
    ErrorCode,
    Ctor,
    RefInc,
    Destroy,
    This,
    Get,
    Set,
    Type,
    Value,
    Array,
    DataSize,
    UserData,
    Result,
    Handle,
    NoError,
    Version,
    Tokenizer,
    Optional,
    Ref,
    CName,
    In,
    Out,
    Static,
    Const,
}

impl AttrKind {
    /// The attribute keyword as written in source.
    pub fn keyword(self) -> &'static str {
        match self {
            AttrKind::Platform => "platform",
            AttrKind::Flags => "flags",
            AttrKind::Hex => "hex",
            AttrKind::ErrorCode => "errorcode",
            AttrKind::Ctor => "ctor",
            AttrKind::RefInc => "refinc",
            AttrKind::Destroy => "destroy",
            AttrKind::This => "this",
            AttrKind::Get => "get",
            AttrKind::Set => "set",
            AttrKind::Type => "type",
            AttrKind::Value => "value",
            AttrKind::Array => "array",
            AttrKind::DataSize => "datasize",
            AttrKind::UserData => "userdata",
            AttrKind::Result => "result",
            AttrKind::Handle => "handle",
            AttrKind::NoError => "noerror",
            AttrKind::Version => "version",
            AttrKind::Tokenizer => "tokenizer",
            AttrKind::Optional => "optional",
            AttrKind::Ref => "ref",
            AttrKind::CName => "cname",
            AttrKind::In => "in",
            AttrKind::Out => "out",
            AttrKind::Static => "static",
            AttrKind::Const => "const",
        }
    }

    fn from_keyword(s: &str) -> Option<Self> {
        Some(match s {
            "platform" => AttrKind::Platform,
            "flags" => AttrKind::Flags,
            "hex" => AttrKind::Hex,
            "errorcode" => AttrKind::ErrorCode,
            "ctor" => AttrKind::Ctor,
            "refinc" => AttrKind::RefInc,
            "destroy" => AttrKind::Destroy,
            "this" => AttrKind::This,
            "get" => AttrKind::Get,
            "set" => AttrKind::Set,
            "type" => AttrKind::Type,
            "value" => AttrKind::Value,
            "array" => AttrKind::Array,
            "datasize" => AttrKind::DataSize,
            "userdata" => AttrKind::UserData,
            "result" => AttrKind::Result,
            "handle" => AttrKind::Handle,
            "noerror" => AttrKind::NoError,
            "version" => AttrKind::Version,
            "tokenizer" => AttrKind::Tokenizer,
            "optional" => AttrKind::Optional,
            "ref" => AttrKind::Ref,
            "cname" => AttrKind::CName,
            "in" => AttrKind::In,
            "out" => AttrKind::Out,
            "static" => AttrKind::Static,
            "const" => AttrKind::Const,
            _ => return None,
        })
    }

    /// Declaration kinds this attribute is legal on.
    fn legal_on(self) -> &'static [DeclKind] {
        use DeclKind::*;
        match self {
            AttrKind::Platform => &[Api],
            AttrKind::Flags => &[Enum],
            AttrKind::Hex => &[Enum],
            AttrKind::ErrorCode => &[Enum],
            AttrKind::NoError => &[EnumConst],
            AttrKind::Ctor => &[Method],
            AttrKind::RefInc => &[Method],
            AttrKind::Destroy => &[Method],
            AttrKind::This => &[Arg],
            AttrKind::Get => &[Property],
            AttrKind::Set => &[Property],
            AttrKind::Type => &[Field, Arg, Property, Event, Method, Callback, Func, Interface],
            AttrKind::Value => &[Field, EnumConst],
            AttrKind::Array => &[Field, Arg],
            AttrKind::DataSize => &[Field, Arg],
            AttrKind::UserData => &[Arg],
            AttrKind::Result => &[Method, Func],
            AttrKind::Handle => &[Struct],
            AttrKind::Version => &[Api],
            AttrKind::Tokenizer => &[Enum],
            AttrKind::Optional => &[Arg],
            AttrKind::Ref => &[Arg, Field],
            AttrKind::CName => &[Api, Enum, EnumConst, Struct, Field, Interface, Method, Arg, Property, Event, Callback, Func],
            AttrKind::In => &[Arg],
            AttrKind::Out => &[Arg],
            AttrKind::Static => &[Method],
            AttrKind::Const => &[Arg],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlatformSet {
    pub windows: bool,
    pub linux: bool,
    pub macos: bool,
    pub web: bool,
    pub android: bool,
    pub ios: bool,
}

impl PlatformSet {
    pub fn any(&self) -> bool {
        self.windows || self.linux || self.macos || self.web || self.android || self.ios
    }

    fn set(&mut self, name: &str) -> bool {
        match name {
            "windows" => self.windows = true,
            "linux" => self.linux = true,
            "macos" => self.macos = true,
            "web" => self.web = true,
            "android" => self.android = true,
            "ios" => self.ios = true,
            _ => return false,
        }
        true
    }
}

/// The API version carried by the `version(major, minor, micro)` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: i64,
    pub minor: i64,
    pub micro: i64,
}

#[derive(Debug, Clone)]
pub enum AttrValue {
    /// A bare, argument-less attribute (e.g. `ctor`, `static`).
    Flag,
    Platform(PlatformSet),
    Value(Literal),
    ArraySize(i64),
    ArrayRef(DeclRef),
    DataSizeRef(DeclRef),
    MethodRef(DeclRef),
    Version(Version),
    Tokenizer(Vec<i64>),
    CName(String),
}

#[derive(Debug, Clone)]
pub struct AttrEntry {
    pub value: AttrValue,
    pub location: Location,
}

/// A validated, per-declaration, sparse table of attributes keyed by kind so later passes can
/// ask "does this decl have `datasize`?" in O(1) rather than rescanning a raw attribute list.
#[derive(Debug, Clone, Default)]
pub struct AttributeSet {
    entries: BTreeMap<AttrKind, AttrEntry>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: AttrKind) -> Option<&AttrEntry> {
        self.entries.get(&kind)
    }

    pub fn has(&self, kind: AttrKind) -> bool {
        self.entries.contains_key(&kind)
    }

    pub fn insert(&mut self, kind: AttrKind, entry: AttrEntry) {
        self.entries.insert(kind, entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AttrKind, &AttrEntry)> {
        self.entries.iter()
    }
}

/// One attribute argument, as produced by the parser before semantic meaning is assigned.
#[derive(Debug, Clone)]
pub enum RawAttrArg {
    Ident(String),
    Literal(Literal),
}

/// An attribute exactly as written in source, prior to context/arity/duplication checks.
#[derive(Debug, Clone)]
pub struct RawAttribute {
    pub keyword: String,
    pub args: Vec<RawAttrArg>,
    pub location: Location,
}

/// Validates and folds `raw` into an [`AttributeSet`] for a declaration of kind `owner_kind`.
///
/// Per spec: an unknown keyword is a distinct error from a keyword used in the wrong context,
/// which is distinct again from one used with the wrong number/shape of arguments. The first
/// error encountered halts validation for this declaration, consistent with pass-level halting
/// elsewhere: a declaration with a malformed attribute list should not also be evaluated by the
/// ten semantic passes.
pub fn validate_attributes(
    owner_kind: DeclKind,
    raw: Vec<RawAttribute>,
    sink: &mut DiagnosticsSink,
    files: &crate::location::FileTable,
) -> PassResult<AttributeSet> {
    let mut set = AttributeSet::new();

    for attr in raw {
        let Some(kind) = AttrKind::from_keyword(&attr.keyword) else {
            return Err(sink.error(Code::E2015, attr.location, files, &[Arg::from(attr.keyword.as_str())]));
        };

        if !kind.legal_on().contains(&owner_kind) {
            return Err(sink.error(Code::E2014, attr.location, files, &[Arg::from(legal_attrs_list(owner_kind))]));
        }

        if set.has(kind) {
            return Err(sink.error(Code::E2013, attr.location, files, &[Arg::from(kind.keyword())]));
        }

        let value = resolve_attr_value(kind, &attr, sink, files)?;
        set.insert(kind, AttrEntry { value, location: attr.location });
    }

    Ok(set)
}

/// Comma-separated list of attribute keywords legal on `owner_kind`, for the E2014 message.
fn legal_attrs_list(owner_kind: DeclKind) -> String {
    const ALL: [AttrKind; 27] = [
        AttrKind::Platform, AttrKind::Flags, AttrKind::Hex, AttrKind::ErrorCode, AttrKind::Ctor,
        AttrKind::RefInc, AttrKind::Destroy, AttrKind::This, AttrKind::Get, AttrKind::Set,
        AttrKind::Type, AttrKind::Value, AttrKind::Array, AttrKind::DataSize, AttrKind::UserData,
        AttrKind::Result, AttrKind::Handle, AttrKind::NoError, AttrKind::Version, AttrKind::Tokenizer,
        AttrKind::Optional, AttrKind::Ref, AttrKind::CName, AttrKind::In, AttrKind::Out,
        AttrKind::Static, AttrKind::Const,
    ];
    ALL.iter()
        .filter(|k| k.legal_on().contains(&owner_kind))
        .map(|k| k.keyword())
        .collect::<Vec<_>>()
        .join(", ")
}

fn resolve_attr_value(
    kind: AttrKind,
    attr: &RawAttribute,
    sink: &mut DiagnosticsSink,
    files: &crate::location::FileTable,
) -> PassResult<AttrValue> {
    match kind {
        AttrKind::Platform => {
            let mut platforms = PlatformSet::default();
            if attr.args.is_empty() {
                return Err(sink.error(Code::E2016, attr.location, files, &[]));
            }
            const NAMES: &str = "windows, linux, macos, web, android, ios";
            for a in &attr.args {
                let RawAttrArg::Ident(name) = a else {
                    return Err(sink.error(Code::E2017, attr.location, files, &[Arg::from(NAMES)]));
                };
                if !platforms.set(name) {
                    return Err(sink.error(Code::E2017, attr.location, files, &[Arg::from(NAMES)]));
                }
                // Re-setting an already-set platform in the same attribute is a duplicate.
                if platforms_seen_twice(&attr.args, name) {
                    return Err(sink.error(Code::E2018, attr.location, files, &[Arg::from(name.as_str())]));
                }
            }
            Ok(AttrValue::Platform(platforms))
        }
        // Argument-less attributes: the grammar only ever produces a bare keyword for these, so
        // a non-empty argument list here cannot occur from the parser; checked defensively.
        AttrKind::Flags
        | AttrKind::Hex
        | AttrKind::ErrorCode
        | AttrKind::Ctor
        | AttrKind::RefInc
        | AttrKind::Destroy
        | AttrKind::This
        | AttrKind::UserData
        | AttrKind::Result
        | AttrKind::Handle
        | AttrKind::NoError
        | AttrKind::Optional
        | AttrKind::Ref
        | AttrKind::In
        | AttrKind::Out
        | AttrKind::Static
        | AttrKind::Const => {
            debug_assert!(attr.args.is_empty(), "{} takes no arguments", kind.keyword());
            Ok(AttrValue::Flag)
        }
        AttrKind::Get | AttrKind::Set => {
            let [RawAttrArg::Ident(name)] = attr.args.as_slice() else {
                let code = if kind == AttrKind::Get { Code::E2049 } else { Code::E2050 };
                return Err(sink.error(code, attr.location, files, &[]));
            };
            Ok(AttrValue::MethodRef(DeclRef::new(name.clone(), attr.location)))
        }
        AttrKind::Type => match attr.args.as_slice() {
            [] => Err(sink.error(Code::E2028, attr.location, files, &[])),
            [RawAttrArg::Ident(name)] => Ok(AttrValue::CName(name.clone())),
            _ => Err(sink.error(Code::E2029, attr.location, files, &[])),
        },
        AttrKind::Value => match attr.args.as_slice() {
            [] => Err(sink.error(Code::E2023, attr.location, files, &[])),
            [RawAttrArg::Literal(lit @ Literal::Int(_))] => Ok(AttrValue::Value(lit.clone())),
            [RawAttrArg::Literal(_)] => Err(sink.error(Code::E2025, attr.location, files, &[])),
            [RawAttrArg::Ident(name)] => Ok(AttrValue::Value(Literal::ConstRefs(vec![DeclRef::new(name.clone(), attr.location)]))),
            _ => Err(sink.error(Code::E2024, attr.location, files, &[])),
        },
        AttrKind::Array => match attr.args.as_slice() {
            [RawAttrArg::Literal(Literal::Int(n))] => Ok(AttrValue::ArraySize(*n)),
            [RawAttrArg::Ident(name)] => Ok(AttrValue::ArrayRef(DeclRef::new(name.clone(), attr.location))),
            _ => Err(sink.error(Code::E2076, attr.location, files, &[])),
        },
        AttrKind::DataSize => match attr.args.as_slice() {
            [RawAttrArg::Ident(name)] => Ok(AttrValue::DataSizeRef(DeclRef::new(name.clone(), attr.location))),
            _ => Err(sink.error(Code::E2112, attr.location, files, &[])),
        },
        AttrKind::Version => match attr.args.as_slice() {
            [RawAttrArg::Literal(Literal::Int(major)), RawAttrArg::Literal(Literal::Int(minor)), RawAttrArg::Literal(Literal::Int(micro))] => {
                Ok(AttrValue::Version(Version { major: *major, minor: *minor, micro: *micro }))
            }
            _ => Err(sink.error(Code::E2110, attr.location, files, &[])),
        },
        AttrKind::Tokenizer => {
            if attr.args.is_empty() {
                return Err(sink.error(Code::E2109, attr.location, files, &[]));
            }
            let mut values = Vec::with_capacity(attr.args.len());
            for a in &attr.args {
                let RawAttrArg::Literal(Literal::Int(n)) = a else {
                    return Err(sink.error(Code::E2109, attr.location, files, &[]));
                };
                values.push(*n);
            }
            Ok(AttrValue::Tokenizer(values))
        }
        AttrKind::CName => match attr.args.as_slice() {
            [RawAttrArg::Literal(Literal::Str(s))] => Ok(AttrValue::CName(s.clone())),
            _ => Err(sink.error(Code::E2075, attr.location, files, &[])),
        },
    }
}

fn platforms_seen_twice(args: &[RawAttrArg], name: &str) -> bool {
    args.iter()
        .filter(|a| matches!(a, RawAttrArg::Ident(n) if n == name))
        .count()
        > 1
}

/// Resolves every `DeclRef` embedded in attribute values (array size refs, datasize refs,
/// ctor/refinc/destroy method refs) against already-resolved symbol ids. Called from the second
/// symbol table pass, after every plain `DeclRef` on the AST proper has been resolved.
pub fn resolve_attr_refs<F>(set: &mut AttributeSet, mut resolve: F)
where
    F: FnMut(&mut DeclRef),
{
    for (_, entry) in set.entries.iter_mut() {
        match &mut entry.value {
            AttrValue::ArrayRef(r) | AttrValue::DataSizeRef(r) | AttrValue::MethodRef(r) => resolve(r),
            _ => {}
        }
    }
}
