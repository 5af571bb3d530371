//! Byte-stream tokenizer.
//!
//! Tokens carry no owned source text beyond what they need (identifiers and string contents are
//! `String`s; everything else is a fixed token kind) plus a [`Location`]. `import` is handled by
//! the lexer itself: hitting one pushes a new file onto an explicit stack rather than recursing,
//! so a long import chain can't blow the Rust call stack the way a recursive-descent reader
//! would.

use crate::diagnostics::{Arg, Code, DiagnosticsSink, PassResult};
use crate::location::{FileId, FileTable, Location, Position};
use crate::source::{ResolveError, SourceResolver};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Int(i64),
    Str(String),
    Doc(String),
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    ColonColon,
    Dot,
    Semi,
    KwApi,
    KwEnum,
    KwStruct,
    KwInterface,
    KwCallback,
    KwFunc,
    KwMethod,
    KwProperty,
    KwEvent,
    KwImport,
    KwTrue,
    KwFalse,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub location: Location,
}

struct FileState {
    file: FileId,
    bytes: Vec<u8>,
    pos: usize,
    line: u32,
    column: u32,
    depth: u32,
    release: Option<crate::options::ReleaseImportCallback>,
}

impl Drop for FileState {
    fn drop(&mut self) {
        if let Some(release) = &self.release {
            release(&self.bytes);
        }
    }
}

impl FileState {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, off: usize) -> Option<u8> {
        self.bytes.get(self.pos + off).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn position(&self) -> Position {
        Position::new(self.file, self.line, self.column)
    }
}

/// Tokenizes one root file and every file transitively reached through `import`, following the
/// import-resolution rules in [`crate::source`]. Imports are deduplicated by canonical key: a
/// file already lexed (or in progress, i.e. a cycle) is skipped rather than re-read.
pub struct Lexer<'a> {
    stack: Vec<FileState>,
    resolver: SourceResolver<'a>,
    files: &'a FileTable,
    seen: Vec<String>,
    max_depth: u32,
}

const MAX_IMPORT_DEPTH: u32 = 64;

impl<'a> Lexer<'a> {
    pub fn new(resolver: SourceResolver<'a>, files: &'a FileTable) -> Self {
        Self { stack: Vec::new(), resolver, files, seen: Vec::new(), max_depth: MAX_IMPORT_DEPTH }
    }

    pub fn files(&self) -> &'a FileTable {
        self.files
    }

    pub fn push_root(
        &mut self,
        path: &std::path::Path,
        sink: &mut DiagnosticsSink,
    ) -> PassResult<()> {
        let resolved = match self.resolver.resolve_root(path) {
            Ok(r) => r,
            Err(ResolveError::OpenFailed(name)) => {
                return Err(sink.error(Code::E2042, Location::point(Position::new(FileId(0), 1, 1)), self.files, &[Arg::from(name)]))
            }
            Err(_) => unreachable!("root resolution never rejects an absolute path"),
        };
        self.seen.push(resolved.canonical_key.clone());
        let file = self.files.intern(&resolved.display_name);
        self.stack.push(FileState {
            file,
            bytes: resolved.bytes,
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
            release: resolved.release,
        });
        Ok(())
    }

    fn push_import(&mut self, name: &str, at: Location, sink: &mut DiagnosticsSink) -> PassResult<bool> {
        let depth = self.stack.last().map(|f| f.depth + 1).unwrap_or(0);
        if depth > self.max_depth {
            return Err(sink.error(Code::E2041, at, self.files, &[Arg::from(name)]));
        }
        let resolved = match self.resolver.resolve_import(name, depth) {
            Ok(r) => r,
            Err(ResolveError::AbsoluteImport(n)) | Err(ResolveError::NotFound(n)) => {
                return Err(sink.error(Code::E2041, at, self.files, &[Arg::from(n)]));
            }
            Err(ResolveError::OpenFailed(n)) => {
                return Err(sink.error(Code::E2042, at, self.files, &[Arg::from(n)]));
            }
        };
        if self.seen.contains(&resolved.canonical_key) {
            return Ok(false);
        }
        self.seen.push(resolved.canonical_key);
        let file = self.files.intern(&resolved.display_name);
        self.stack.push(FileState {
            file,
            bytes: resolved.bytes,
            pos: 0,
            line: 1,
            column: 1,
            depth,
            release: resolved.release,
        });
        Ok(true)
    }

    /// Returns the next token, transparently crossing file boundaries: an exhausted file is
    /// popped off the stack and tokenization resumes in its importer.
    pub fn next_token(&mut self, sink: &mut DiagnosticsSink) -> PassResult<Token> {
        loop {
            let Some(top) = self.stack.last_mut() else {
                return Ok(Token { kind: TokenKind::Eof, location: Location::point(Position::new(FileId(0), 1, 1)) });
            };

            skip_trivia(top, sink, self.files)?;

            if top.peek().is_none() {
                let file = top.file;
                self.stack.pop();
                if self.stack.is_empty() {
                    return Ok(Token {
                        kind: TokenKind::Eof,
                        location: Location::point(Position::new(file, top_line(self.stack.last()), 1)),
                    });
                }
                continue;
            }

            let start = self.stack.last().unwrap().position();
            let tok = scan_token(self.stack.last_mut().unwrap(), start, sink, self.files)?;

            if let TokenKind::KwImport = tok.kind {
                let name_tok = self.scan_import_statement_name(sink)?;
                if let TokenKind::Str(name) = name_tok.kind {
                    let loc = Location::new(start, name_tok.location.end);
                    self.consume_optional_semi(sink)?;
                    self.push_import(&name, loc, sink)?;
                    continue;
                }
            }

            return Ok(tok);
        }
    }

    fn scan_import_statement_name(&mut self, sink: &mut DiagnosticsSink) -> PassResult<Token> {
        let top = self.stack.last_mut().expect("import keyword lexed from an active file");
        skip_trivia(top, sink, self.files)?;
        let start = top.position();
        scan_token(top, start, sink, self.files)
    }

    /// `import "name";` is consumed whole by the lexer, so the trailing `;` must never reach the
    /// parser as a standalone token.
    fn consume_optional_semi(&mut self, sink: &mut DiagnosticsSink) -> PassResult<()> {
        let top = self.stack.last_mut().expect("import keyword lexed from an active file");
        skip_trivia(top, sink, self.files)?;
        if top.peek() == Some(b';') {
            top.bump();
        }
        Ok(())
    }
}

fn top_line(_top: Option<&FileState>) -> u32 {
    1
}

/// Skips whitespace and `//` line comments. Tabs are rejected outright (E2002).
fn skip_trivia(state: &mut FileState, sink: &mut DiagnosticsSink, files: &FileTable) -> PassResult<()> {
    loop {
        match state.peek() {
            Some(b'\t') => {
                let pos = state.position();
                return Err(sink.error(Code::E2002, Location::point(pos), files, &[]));
            }
            Some(b' ') | Some(b'\r') | Some(b'\n') => {
                state.bump();
            }
            Some(b'/') if state.peek_at(1) == Some(b'/') => {
                while let Some(c) = state.peek() {
                    if c == b'\n' {
                        break;
                    }
                    state.bump();
                }
            }
            _ => return Ok(()),
        }
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

fn keyword_or_ident(s: &str) -> TokenKind {
    match s {
        "api" => TokenKind::KwApi,
        "enum" => TokenKind::KwEnum,
        "struct" => TokenKind::KwStruct,
        "interface" => TokenKind::KwInterface,
        "callback" => TokenKind::KwCallback,
        "func" => TokenKind::KwFunc,
        "method" => TokenKind::KwMethod,
        "property" => TokenKind::KwProperty,
        "event" => TokenKind::KwEvent,
        "import" => TokenKind::KwImport,
        "true" => TokenKind::KwTrue,
        "false" => TokenKind::KwFalse,
        _ => TokenKind::Ident(s.to_string()),
    }
}

fn scan_token(
    state: &mut FileState,
    start: Position,
    sink: &mut DiagnosticsSink,
    files: &FileTable,
) -> PassResult<Token> {
    let c = state.bump().expect("caller checked for end of input");
    let kind = match c {
        b'{' => TokenKind::LBrace,
        b'}' => TokenKind::RBrace,
        b'(' => TokenKind::LParen,
        b')' => TokenKind::RParen,
        b'[' => TokenKind::LBracket,
        b']' => TokenKind::RBracket,
        b',' => TokenKind::Comma,
        b'.' => TokenKind::Dot,
        b';' => TokenKind::Semi,
        b':' => {
            if state.peek() == Some(b':') {
                state.bump();
                TokenKind::ColonColon
            } else {
                TokenKind::Colon
            }
        }
        b'/' if state.peek() == Some(b'/') && state.peek_at(1) == Some(b'/') => {
            state.bump();
            state.bump();
            scan_doc_line(state)
        }
        b'"' => scan_string(state, start, sink, files)?,
        b'-' if state.peek().is_some_and(|c| c.is_ascii_digit()) => scan_number(state, true),
        c if c.is_ascii_digit() => {
            state.pos -= 1;
            state.column -= 1;
            scan_number(state, false)
        }
        c if is_ident_start(c) => {
            let mut s = String::new();
            s.push(c as char);
            while let Some(c2) = state.peek() {
                if is_ident_continue(c2) {
                    s.push(c2 as char);
                    state.bump();
                } else {
                    break;
                }
            }
            if s.chars().next().is_some_and(|c| c.is_ascii_lowercase()) && !is_lexer_keyword(&s) {
                return Err(sink.error(Code::E2003, Location::point(start), files, &[Arg::from(s)]));
            }
            keyword_or_ident(&s)
        }
        other => {
            return Err(sink.error(
                Code::E2001,
                Location::point(start),
                files,
                &[Arg::from((other as char).to_string())],
            ));
        }
    };
    let end = state.position();
    Ok(Token { kind, location: Location::new(start, end) })
}

fn is_lexer_keyword(s: &str) -> bool {
    matches!(
        s,
        "api" | "enum" | "struct" | "interface" | "callback" | "func" | "method" | "property"
            | "event" | "import" | "true" | "false"
    )
}

fn scan_doc_line(state: &mut FileState) -> TokenKind {
    // Conventionally a single leading space separates `///` from the text; strip at most one.
    if state.peek() == Some(b' ') {
        state.bump();
    }
    let mut text = String::new();
    while let Some(c) = state.peek() {
        if c == b'\n' {
            break;
        }
        text.push(c as char);
        state.bump();
    }
    TokenKind::Doc(text)
}

fn scan_string(
    state: &mut FileState,
    start: Position,
    sink: &mut DiagnosticsSink,
    files: &FileTable,
) -> PassResult<TokenKind> {
    let mut raw = Vec::new();
    loop {
        match state.bump() {
            None | Some(b'\n') => {
                return Err(sink.error(Code::E2006, Location::point(start), files, &[]));
            }
            Some(b'"') => break,
            Some(b'\\') => {
                raw.push(b'\\');
                if let Some(escaped) = state.bump() {
                    raw.push(escaped);
                }
            }
            Some(c) => raw.push(c),
        }
    }
    match decode_escapes(&raw) {
        Ok(s) => Ok(TokenKind::Str(s)),
        Err(()) => Err(sink.error(Code::E2001, Location::point(start), files, &[Arg::from("\\")])),
    }
}

/// Unescapes `\\`, `\"`, `\n`, `\t`, `\r` using `nom` over the raw byte run captured by the
/// string scanner above.
fn decode_escapes(raw: &[u8]) -> Result<String, ()> {
    use nom::branch::alt;
    use nom::bytes::complete::{tag, take_till1};
    use nom::combinator::value;
    use nom::multi::many0;
    use nom::sequence::preceded;
    use nom::IResult;

    fn escape(input: &[u8]) -> IResult<&[u8], char> {
        preceded(
            tag(b"\\".as_slice()),
            alt((
                value('\\', tag(b"\\".as_slice())),
                value('"', tag(b"\"".as_slice())),
                value('\n', tag(b"n".as_slice())),
                value('\t', tag(b"t".as_slice())),
                value('\r', tag(b"r".as_slice())),
            )),
        )(input)
    }

    fn plain(input: &[u8]) -> IResult<&[u8], &[u8]> {
        take_till1(|c| c == b'\\')(input)
    }

    fn piece(input: &[u8]) -> IResult<&[u8], String> {
        alt((
            nom::combinator::map(escape, |c| c.to_string()),
            nom::combinator::map(plain, |b: &[u8]| String::from_utf8_lossy(b).into_owned()),
        ))(input)
    }

    let (rest, parts) = many0(piece)(raw).map_err(|_: nom::Err<nom::error::Error<&[u8]>>| ())?;
    if !rest.is_empty() {
        return Err(());
    }
    Ok(parts.concat())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{InlineSource, Options};

    fn token_kinds(src: &str) -> Vec<TokenKind> {
        let options = {
            let mut o = Options::new();
            o.set_inline_sources(vec![InlineSource { name: "root.idl".to_string(), bytes: src.as_bytes().to_vec() }]);
            o
        };
        let files = FileTable::new();
        let resolver = SourceResolver::new(Some(&options), std::path::PathBuf::new());
        let mut lexer = Lexer::new(resolver, &files);
        let mut sink = DiagnosticsSink::new(false);
        lexer.push_root(std::path::Path::new(""), &mut sink).expect("root resolves");
        let mut kinds = Vec::new();
        loop {
            let tok = lexer.next_token(&mut sink).expect("lexing succeeds");
            let done = matches!(tok.kind, TokenKind::Eof);
            kinds.push(tok.kind);
            if done {
                break;
            }
        }
        kinds
    }

    #[test]
    fn tokenizes_a_minimal_declaration() {
        let kinds = token_kinds("api Foo { func Bar(); }");
        assert_eq!(
            kinds,
            vec![
                TokenKind::KwApi,
                TokenKind::Ident("Foo".to_string()),
                TokenKind::LBrace,
                TokenKind::KwFunc,
                TokenKind::Ident("Bar".to_string()),
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Semi,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tabs_are_rejected() {
        let options = {
            let mut o = Options::new();
            o.set_inline_sources(vec![InlineSource { name: "root.idl".to_string(), bytes: b"api\tFoo".to_vec() }]);
            o
        };
        let files = FileTable::new();
        let resolver = SourceResolver::new(Some(&options), std::path::PathBuf::new());
        let mut lexer = Lexer::new(resolver, &files);
        let mut sink = DiagnosticsSink::new(false);
        lexer.push_root(std::path::Path::new(""), &mut sink).expect("root resolves");
        let err = lexer.next_token(&mut sink);
        assert!(err.is_err());
        assert_eq!(sink.diagnostics()[0].code, Code::E2002);
    }

    #[test]
    fn decimal_and_hex_literals_parse() {
        let kinds = token_kinds("0x2A 42");
        assert_eq!(kinds, vec![TokenKind::Int(42), TokenKind::Int(42), TokenKind::Eof]);
    }

    #[test]
    fn string_literal_decodes_escapes() {
        let kinds = token_kinds(r#""a\nb""#);
        assert_eq!(kinds, vec![TokenKind::Str("a\nb".to_string()), TokenKind::Eof]);
    }
}

fn scan_number(state: &mut FileState, negative: bool) -> TokenKind {
    let mut digits = String::new();
    if negative {
        digits.push('-');
        state.bump();
    }
    let hex = state.peek() == Some(b'0') && matches!(state.peek_at(1), Some(b'x') | Some(b'X'));
    if hex {
        digits.push_str("0x");
        state.bump();
        state.bump();
        while let Some(c) = state.peek() {
            if c.is_ascii_hexdigit() {
                digits.push(c as char);
                state.bump();
            } else {
                break;
            }
        }
        let value = i64::from_str_radix(digits.trim_start_matches('-').trim_start_matches("0x"), 16).unwrap_or(0);
        TokenKind::Int(if negative { -value } else { value })
    } else {
        while let Some(c) = state.peek() {
            if c.is_ascii_digit() {
                digits.push(c as char);
                state.bump();
            } else {
                break;
            }
        }
        TokenKind::Int(digits.parse().unwrap_or(0))
    }
}
