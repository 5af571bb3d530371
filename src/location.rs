//! Source positions and interned filenames.
//!
//! Filenames are interned once per [`Compiler`](crate::compiler::Compiler) invocation so that
//! every [`Location`] can carry a cheap [`FileId`] instead of cloning a `String` per token.

use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// Interns filenames for the lifetime of one compile job.
///
/// Interning happens through `&self`: the lexer needs to intern a new file on every `import`
/// while the parser (and every later pass) holds its own shared reference to the same table for
/// diagnostics, so the table can never offer `&mut self` access once lexing starts.
#[derive(Debug, Default)]
pub struct FileTable {
    inner: RefCell<FileTableInner>,
}

#[derive(Debug, Default)]
struct FileTableInner {
    names: Vec<String>,
    by_name: HashMap<String, FileId>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, name: &str) -> FileId {
        let mut inner = self.inner.borrow_mut();
        if let Some(id) = inner.by_name.get(name) {
            return *id;
        }
        let id = FileId(inner.names.len() as u32);
        inner.names.push(name.to_string());
        inner.by_name.insert(name.to_string(), id);
        id
    }

    pub fn name(&self, id: FileId) -> String {
        self.inner.borrow().names[id.0 as usize].clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub file: FileId,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(file: FileId, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }
}

/// A half-open span of positions. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub start: Position,
    pub end: Position,
}

impl Location {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A zero-width location at a single position, used for synthesized diagnostics.
    pub fn point(pos: Position) -> Self {
        Self { start: pos, end: pos }
    }
}
