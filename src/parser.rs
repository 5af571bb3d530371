//! Recursive-descent parser.
//!
//! Each declaration is read as `doc? ('[' attr_list ']')? keyword Ident body`. The attribute
//! list is validated immediately after being parsed, per-declaration, rather than deferred to a
//! later pass: by the time a `Decl` lands in the [`Context`] arena its `AttributeSet` is already
//! typed and duplicate/context-checked. Types and values carried by attributes (`type(...)`,
//! `value(...)`) are read out of that set by the semantic passes, not by the parser.

use crate::ast::*;
use crate::attributes::{validate_attributes, RawAttrArg, RawAttribute};
use crate::diagnostics::{Arg, Code, DiagnosticsSink, PassResult};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::location::{FileTable, Location};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    files: &'a FileTable,
    current: Token,
    ctx: Context,
}

impl<'a> Parser<'a> {
    pub fn new(mut lexer: Lexer<'a>, files: &'a FileTable, sink: &mut DiagnosticsSink) -> PassResult<Self> {
        let current = lexer.next_token(sink)?;
        Ok(Self { lexer, files, current, ctx: Context::new() })
    }

    pub fn into_context(self) -> Context {
        self.ctx
    }

    fn bump(&mut self, sink: &mut DiagnosticsSink) -> PassResult<Token> {
        let next = self.lexer.next_token(sink)?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, kind: &TokenKind, sink: &mut DiagnosticsSink) -> PassResult<Token> {
        if std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind) {
            self.bump(sink)
        } else {
            Err(sink.error(
                Code::E2001,
                self.current.location,
                self.files,
                &[Arg::from(format!("{:?}", self.current.kind))],
            ))
        }
    }

    fn expect_ident(&mut self, sink: &mut DiagnosticsSink) -> PassResult<(String, Location)> {
        let loc = self.current.location;
        match &self.current.kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.bump(sink)?;
                Ok((name, loc))
            }
            _ => Err(sink.error(Code::E2001, loc, self.files, &[Arg::from(format!("{:?}", self.current.kind))])),
        }
    }

    fn at(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    /// Parses the whole token stream into the single `Api` root.
    pub fn parse_api(&mut self, sink: &mut DiagnosticsSink) -> PassResult<DeclId> {
        let doc = self.parse_doc(sink)?;
        let raw_attrs = self.parse_attr_list(sink)?;
        self.expect(&TokenKind::KwApi, sink)?;
        let (name, name_loc) = self.expect_ident(sink)?;
        let attributes = validate_attributes(DeclKind::Api, raw_attrs, sink, self.files)?;

        let api_id = self.ctx.alloc(Decl::Api(ApiDecl {
            name,
            location: name_loc,
            parent: None,
            attributes,
            documentation: doc,
            enums: Vec::new(),
            structs: Vec::new(),
            interfaces: Vec::new(),
            callbacks: Vec::new(),
            funcs: Vec::new(),
        }));

        self.expect(&TokenKind::LBrace, sink)?;
        while !self.at(&TokenKind::RBrace) && !self.at(&TokenKind::Eof) {
            self.parse_top_member(api_id, sink)?;
        }
        self.expect(&TokenKind::RBrace, sink)?;

        Ok(api_id)
    }

    fn parse_top_member(&mut self, api_id: DeclId, sink: &mut DiagnosticsSink) -> PassResult<()> {
        let doc = self.parse_doc(sink)?;
        let raw_attrs = self.parse_attr_list(sink)?;
        match &self.current.kind {
            TokenKind::KwEnum => {
                let id = self.parse_enum(api_id, doc, raw_attrs, sink)?;
                if let Decl::Api(api) = self.ctx.get_mut(api_id) {
                    api.enums.push(id);
                }
            }
            TokenKind::KwStruct => {
                let id = self.parse_struct(api_id, doc, raw_attrs, sink)?;
                if let Decl::Api(api) = self.ctx.get_mut(api_id) {
                    api.structs.push(id);
                }
            }
            TokenKind::KwInterface => {
                let id = self.parse_interface(api_id, doc, raw_attrs, sink)?;
                if let Decl::Api(api) = self.ctx.get_mut(api_id) {
                    api.interfaces.push(id);
                }
            }
            TokenKind::KwCallback => {
                let id = self.parse_callback(api_id, doc, raw_attrs, sink)?;
                if let Decl::Api(api) = self.ctx.get_mut(api_id) {
                    api.callbacks.push(id);
                }
            }
            TokenKind::KwFunc => {
                let id = self.parse_func(api_id, doc, raw_attrs, sink)?;
                if let Decl::Api(api) = self.ctx.get_mut(api_id) {
                    api.funcs.push(id);
                }
            }
            other => {
                return Err(sink.error(Code::E2001, self.current.location, self.files, &[Arg::from(format!("{other:?}"))]));
            }
        }
        Ok(())
    }

    fn parse_enum(
        &mut self,
        parent: DeclId,
        doc: Documentation,
        raw_attrs: Vec<RawAttribute>,
        sink: &mut DiagnosticsSink,
    ) -> PassResult<DeclId> {
        self.expect(&TokenKind::KwEnum, sink)?;
        let (name, loc) = self.expect_ident(sink)?;
        let attributes = validate_attributes(DeclKind::Enum, raw_attrs, sink, self.files)?;
        let id = self.ctx.alloc(Decl::Enum(EnumDecl {
            name,
            location: loc,
            parent: Some(parent),
            attributes,
            documentation: doc,
            consts: Vec::new(),
        }));
        self.expect(&TokenKind::LBrace, sink)?;
        let mut consts = Vec::new();
        while !self.at(&TokenKind::RBrace) && !self.at(&TokenKind::Eof) {
            let mut doc = self.parse_doc(sink)?;
            let raw_attrs = self.parse_attr_list(sink)?;
            let (cname, cloc) = self.expect_ident(sink)?;
            self.parse_trailing_doc(sink, &mut doc, cloc.start.line)?;
            let attributes = validate_attributes(DeclKind::EnumConst, raw_attrs, sink, self.files)?;
            let cid = self.ctx.alloc(Decl::EnumConst(EnumConstDecl {
                name: cname,
                location: cloc,
                parent: Some(id),
                attributes,
                documentation: doc,
                value: None,
                resolved_value: None,
            }));
            consts.push(cid);
            if self.at(&TokenKind::Comma) {
                self.bump(sink)?;
            } else {
                break;
            }
        }
        if consts.is_empty() {
            let name_for_msg = self.ctx.get(id).name().to_string();
            return Err(sink.error(Code::E2026, loc, self.files, &[Arg::from(name_for_msg)]));
        }
        self.expect(&TokenKind::RBrace, sink)?;
        if let Decl::Enum(e) = self.ctx.get_mut(id) {
            e.consts = consts;
        }
        Ok(id)
    }

    fn parse_struct(
        &mut self,
        parent: DeclId,
        doc: Documentation,
        raw_attrs: Vec<RawAttribute>,
        sink: &mut DiagnosticsSink,
    ) -> PassResult<DeclId> {
        self.expect(&TokenKind::KwStruct, sink)?;
        let (name, loc) = self.expect_ident(sink)?;
        let attributes = validate_attributes(DeclKind::Struct, raw_attrs, sink, self.files)?;
        let id = self.ctx.alloc(Decl::Struct(StructDecl {
            name,
            location: loc,
            parent: Some(parent),
            attributes,
            documentation: doc,
            fields: Vec::new(),
        }));
        self.expect(&TokenKind::LBrace, sink)?;
        let mut fields = Vec::new();
        while !self.at(&TokenKind::RBrace) && !self.at(&TokenKind::Eof) {
            let mut doc = self.parse_doc(sink)?;
            let raw_attrs = self.parse_attr_list(sink)?;
            let (fname, floc) = self.expect_ident(sink)?;
            let semi = self.expect(&TokenKind::Semi, sink)?;
            self.parse_trailing_doc(sink, &mut doc, semi.location.start.line)?;
            let attributes = validate_attributes(DeclKind::Field, raw_attrs, sink, self.files)?;
            let fid = self.ctx.alloc(Decl::Field(FieldDecl {
                name: fname,
                location: floc,
                parent: Some(id),
                attributes,
                documentation: doc,
                field_type: None,
                value: None,
            }));
            fields.push(fid);
        }
        if fields.is_empty() {
            let name_for_msg = self.ctx.get(id).name().to_string();
            return Err(sink.error(Code::E2081, loc, self.files, &[Arg::from(name_for_msg)]));
        }
        self.expect(&TokenKind::RBrace, sink)?;
        if let Decl::Struct(s) = self.ctx.get_mut(id) {
            s.fields = fields;
        }
        Ok(id)
    }

    fn parse_interface(
        &mut self,
        parent: DeclId,
        doc: Documentation,
        raw_attrs: Vec<RawAttribute>,
        sink: &mut DiagnosticsSink,
    ) -> PassResult<DeclId> {
        self.expect(&TokenKind::KwInterface, sink)?;
        let (name, loc) = self.expect_ident(sink)?;
        let attributes = validate_attributes(DeclKind::Interface, raw_attrs, sink, self.files)?;
        let id = self.ctx.alloc(Decl::Interface(InterfaceDecl {
            name,
            location: loc,
            parent: Some(parent),
            attributes,
            documentation: doc,
            methods: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
            handle_type: None,
        }));
        self.expect(&TokenKind::LBrace, sink)?;
        let mut methods = Vec::new();
        let mut properties = Vec::new();
        let mut events = Vec::new();
        while !self.at(&TokenKind::RBrace) && !self.at(&TokenKind::Eof) {
            let doc = self.parse_doc(sink)?;
            let raw_attrs = self.parse_attr_list(sink)?;
            match &self.current.kind {
                TokenKind::KwMethod => methods.push(self.parse_method(id, doc, raw_attrs, sink)?),
                TokenKind::KwProperty => properties.push(self.parse_property(id, doc, raw_attrs, sink)?),
                TokenKind::KwEvent => events.push(self.parse_event(id, doc, raw_attrs, sink)?),
                other => {
                    return Err(sink.error(Code::E2001, self.current.location, self.files, &[Arg::from(format!("{other:?}"))]));
                }
            }
        }
        self.expect(&TokenKind::RBrace, sink)?;
        if let Decl::Interface(i) = self.ctx.get_mut(id) {
            i.methods = methods;
            i.properties = properties;
            i.events = events;
        }
        Ok(id)
    }

    fn parse_method(
        &mut self,
        parent: DeclId,
        mut doc: Documentation,
        raw_attrs: Vec<RawAttribute>,
        sink: &mut DiagnosticsSink,
    ) -> PassResult<DeclId> {
        self.expect(&TokenKind::KwMethod, sink)?;
        let (name, loc) = self.expect_ident(sink)?;
        let attributes = validate_attributes(DeclKind::Method, raw_attrs, sink, self.files)?;
        let id = self.ctx.alloc(Decl::Method(MethodDecl {
            name,
            location: loc,
            parent: Some(parent),
            attributes,
            documentation: Documentation::default(),
            return_type: None,
            args: Vec::new(),
        }));
        let args = self.parse_arg_list(id, sink)?;
        let semi = self.expect(&TokenKind::Semi, sink)?;
        self.parse_trailing_doc(sink, &mut doc, semi.location.start.line)?;
        if let Decl::Method(m) = self.ctx.get_mut(id) {
            m.args = args;
            m.documentation = doc;
        }
        Ok(id)
    }

    fn parse_property(
        &mut self,
        parent: DeclId,
        mut doc: Documentation,
        raw_attrs: Vec<RawAttribute>,
        sink: &mut DiagnosticsSink,
    ) -> PassResult<DeclId> {
        self.expect(&TokenKind::KwProperty, sink)?;
        let (name, loc) = self.expect_ident(sink)?;
        let semi = self.expect(&TokenKind::Semi, sink)?;
        self.parse_trailing_doc(sink, &mut doc, semi.location.start.line)?;
        let attributes = validate_attributes(DeclKind::Property, raw_attrs, sink, self.files)?;
        Ok(self.ctx.alloc(Decl::Property(PropertyDecl {
            name,
            location: loc,
            parent: Some(parent),
            attributes,
            documentation: doc,
            property_type: None,
        })))
    }

    fn parse_event(
        &mut self,
        parent: DeclId,
        mut doc: Documentation,
        raw_attrs: Vec<RawAttribute>,
        sink: &mut DiagnosticsSink,
    ) -> PassResult<DeclId> {
        self.expect(&TokenKind::KwEvent, sink)?;
        let (name, loc) = self.expect_ident(sink)?;
        let semi = self.expect(&TokenKind::Semi, sink)?;
        self.parse_trailing_doc(sink, &mut doc, semi.location.start.line)?;
        let attributes = validate_attributes(DeclKind::Event, raw_attrs, sink, self.files)?;
        Ok(self.ctx.alloc(Decl::Event(EventDecl {
            name,
            location: loc,
            parent: Some(parent),
            attributes,
            documentation: doc,
            event_type: None,
        })))
    }

    fn parse_callback(
        &mut self,
        parent: DeclId,
        mut doc: Documentation,
        raw_attrs: Vec<RawAttribute>,
        sink: &mut DiagnosticsSink,
    ) -> PassResult<DeclId> {
        self.expect(&TokenKind::KwCallback, sink)?;
        let (name, loc) = self.expect_ident(sink)?;
        let attributes = validate_attributes(DeclKind::Callback, raw_attrs, sink, self.files)?;
        let id = self.ctx.alloc(Decl::Callback(CallbackDecl {
            name,
            location: loc,
            parent: Some(parent),
            attributes,
            documentation: Documentation::default(),
            return_type: None,
            args: Vec::new(),
        }));
        let args = self.parse_arg_list(id, sink)?;
        let semi = self.expect(&TokenKind::Semi, sink)?;
        self.parse_trailing_doc(sink, &mut doc, semi.location.start.line)?;
        if let Decl::Callback(c) = self.ctx.get_mut(id) {
            c.args = args;
            c.documentation = doc;
        }
        Ok(id)
    }

    fn parse_func(
        &mut self,
        parent: DeclId,
        mut doc: Documentation,
        raw_attrs: Vec<RawAttribute>,
        sink: &mut DiagnosticsSink,
    ) -> PassResult<DeclId> {
        self.expect(&TokenKind::KwFunc, sink)?;
        let (name, loc) = self.expect_ident(sink)?;
        let attributes = validate_attributes(DeclKind::Func, raw_attrs, sink, self.files)?;
        let id = self.ctx.alloc(Decl::Func(FuncDecl {
            name,
            location: loc,
            parent: Some(parent),
            attributes,
            documentation: Documentation::default(),
            return_type: None,
            args: Vec::new(),
        }));
        let args = self.parse_arg_list(id, sink)?;
        let semi = self.expect(&TokenKind::Semi, sink)?;
        self.parse_trailing_doc(sink, &mut doc, semi.location.start.line)?;
        if let Decl::Func(f) = self.ctx.get_mut(id) {
            f.args = args;
            f.documentation = doc;
        }
        Ok(id)
    }

    fn parse_arg_list(&mut self, parent: DeclId, sink: &mut DiagnosticsSink) -> PassResult<Vec<DeclId>> {
        self.expect(&TokenKind::LParen, sink)?;
        let mut args = Vec::new();
        while !self.at(&TokenKind::RParen) && !self.at(&TokenKind::Eof) {
            let doc = self.parse_doc(sink)?;
            let raw_attrs = self.parse_attr_list(sink)?;
            let (name, loc) = self.expect_ident(sink)?;
            let attributes = validate_attributes(DeclKind::Arg, raw_attrs, sink, self.files)?;
            args.push(self.ctx.alloc(Decl::Arg(ArgDecl {
                name,
                location: loc,
                parent: Some(parent),
                attributes,
                documentation: doc,
                arg_type: None,
            })));
            if self.at(&TokenKind::Comma) {
                self.bump(sink)?;
            } else {
                break;
            }
        }
        self.expect(&TokenKind::RParen, sink)?;
        Ok(args)
    }

    /// Collects zero or more leading `/// ...` lines preceding a declaration into a
    /// [`Documentation`] (the block form): each line may open a new section with a
    /// `brief:`/`detail:`/`copyright:`/`license:`/`author:`/`note:` tag, and subsequent untagged
    /// lines continue the open section. A continuation line (one that doesn't open a new tag)
    /// must start at column 4 or it's E2011. The other documentation form — a single `detail`
    /// fragment trailing a single-line declaration — is handled by [`Self::parse_trailing_doc`]
    /// once that declaration's terminator has been parsed.
    fn parse_doc(&mut self, sink: &mut DiagnosticsSink) -> PassResult<Documentation> {
        let mut lines = Vec::new();
        while let TokenKind::Doc(text) = &self.current.kind {
            lines.push((text.clone(), self.current.location));
            self.bump(sink)?;
        }
        if lines.is_empty() {
            return Ok(Documentation::default());
        }
        if lines.len() == 1 && lines[0].0.trim().is_empty() {
            return Err(sink.error(Code::E2006, lines[0].1, self.files, &[]));
        }

        let mut doc = Documentation::default();
        let mut current_section: Option<&'static str> = None;
        let mut buf = String::new();
        let mut buf_loc = lines[0].1;

        fn flush(doc: &mut Documentation, section: Option<&'static str>, buf: &str, loc: Location) {
            if buf.is_empty() {
                return;
            }
            let text = DocText { fragments: vec![DocFragment::Text(buf.to_string())], location: loc };
            match section {
                Some("brief") => doc.brief = Some(text),
                Some("detail") => doc.detail = Some(text),
                Some("copyright") => doc.copyright = Some(text),
                Some("license") => doc.license = Some(text),
                Some("author") => doc.authors.push(text),
                Some("note") => doc.notes.push(text),
                _ => doc.detail = Some(text),
            }
        }

        let mut opened_any = false;
        for (text, loc) in &lines {
            if let Some((tag, rest)) = split_doc_tag(text) {
                flush(&mut doc, current_section, buf.trim(), buf_loc);
                buf.clear();
                buf_loc = *loc;
                let dup = match tag {
                    "brief" => doc.brief.is_some(),
                    "detail" => doc.detail.is_some(),
                    "copyright" => doc.copyright.is_some(),
                    "license" => doc.license.is_some(),
                    _ => false,
                };
                if dup {
                    let code = match tag {
                        "brief" => Code::E2007,
                        "detail" => Code::E2008,
                        "copyright" => Code::E2009,
                        "license" => Code::E2010,
                        _ => unreachable!(),
                    };
                    return Err(sink.error(code, *loc, self.files, &[]));
                }
                current_section = Some(tag);
                buf.push_str(rest.trim());
                opened_any = true;
            } else {
                if opened_any && loc.start.column != 4 {
                    return Err(sink.error(Code::E2011, *loc, self.files, &[]));
                }
                if !buf.is_empty() {
                    buf.push('\n');
                }
                buf.push_str(text.trim());
                opened_any = true;
            }
        }
        flush(&mut doc, current_section, buf.trim(), buf_loc);
        Ok(doc)
    }

    /// Looks for the other documentation form: a single `/// ...` fragment trailing a
    /// single-line declaration on the same source line as `after_line`. Such a fragment may only
    /// carry `detail` text (E2019); combining it with a preceding block form is E2021.
    fn parse_trailing_doc(
        &mut self,
        sink: &mut DiagnosticsSink,
        preceding: &mut Documentation,
        after_line: u32,
    ) -> PassResult<()> {
        let TokenKind::Doc(text) = &self.current.kind else {
            return Ok(());
        };
        let loc = self.current.location;
        if loc.start.line != after_line {
            return Ok(());
        }
        let text = text.clone();
        self.bump(sink)?;
        if text.trim().is_empty() {
            return Err(sink.error(Code::E2006, loc, self.files, &[]));
        }
        let detail_text = match split_doc_tag(&text) {
            Some((tag, rest)) if tag == "detail" => rest.trim().to_string(),
            Some(_) => return Err(sink.error(Code::E2019, loc, self.files, &[])),
            None => text.trim().to_string(),
        };
        if !preceding.is_empty() {
            return Err(sink.error(Code::E2021, loc, self.files, &[]));
        }
        preceding.detail = Some(DocText { fragments: vec![DocFragment::Text(detail_text)], location: loc });
        preceding.inline = true;
        Ok(())
    }

    /// Collects an optional `[attr, attr(args)]` list preceding a declaration.
    fn parse_attr_list(&mut self, sink: &mut DiagnosticsSink) -> PassResult<Vec<RawAttribute>> {
        if !self.at(&TokenKind::LBracket) {
            return Ok(Vec::new());
        }
        self.bump(sink)?;
        let mut attrs = Vec::new();
        while !self.at(&TokenKind::RBracket) && !self.at(&TokenKind::Eof) {
            let (keyword, kw_loc) = self.expect_ident(sink)?;
            let mut args = Vec::new();
            let mut end_loc = kw_loc;
            if self.at(&TokenKind::LParen) {
                self.bump(sink)?;
                while !self.at(&TokenKind::RParen) && !self.at(&TokenKind::Eof) {
                    args.push(self.parse_attr_arg(sink)?);
                    if self.at(&TokenKind::Comma) {
                        self.bump(sink)?;
                    } else {
                        break;
                    }
                }
                let close = self.expect(&TokenKind::RParen, sink)?;
                end_loc = close.location;
            }
            attrs.push(RawAttribute { keyword, args, location: Location::new(kw_loc.start, end_loc.end) });
            if self.at(&TokenKind::Comma) {
                self.bump(sink)?;
            } else {
                break;
            }
        }
        self.expect(&TokenKind::RBracket, sink)?;
        Ok(attrs)
    }

    fn parse_attr_arg(&mut self, sink: &mut DiagnosticsSink) -> PassResult<RawAttrArg> {
        match &self.current.kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.bump(sink)?;
                Ok(RawAttrArg::Ident(name))
            }
            TokenKind::Int(n) => {
                let n = *n;
                self.bump(sink)?;
                Ok(RawAttrArg::Literal(Literal::Int(n)))
            }
            TokenKind::Str(s) => {
                let s = s.clone();
                self.bump(sink)?;
                Ok(RawAttrArg::Literal(Literal::Str(s)))
            }
            TokenKind::KwTrue => {
                self.bump(sink)?;
                Ok(RawAttrArg::Literal(Literal::Bool(true)))
            }
            TokenKind::KwFalse => {
                self.bump(sink)?;
                Ok(RawAttrArg::Literal(Literal::Bool(false)))
            }
            other => Err(sink.error(Code::E2001, self.current.location, self.files, &[Arg::from(format!("{other:?}"))])),
        }
    }
}

fn split_doc_tag(text: &str) -> Option<(&'static str, &str)> {
    const TAGS: [&str; 6] = ["brief", "detail", "copyright", "license", "author", "note"];
    let trimmed = text.trim_start();
    for tag in TAGS {
        if let Some(rest) = trimmed.strip_prefix(tag) {
            if let Some(rest) = rest.strip_prefix(':') {
                return Some((
                    match tag {
                        "brief" => "brief",
                        "detail" => "detail",
                        "copyright" => "copyright",
                        "license" => "license",
                        "author" => "author",
                        "note" => "note",
                        _ => unreachable!(),
                    },
                    rest,
                ));
            }
        }
    }
    None
}
