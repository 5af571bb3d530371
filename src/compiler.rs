//! Top-level compile pipeline: resolve the root file, lex and parse it (following every
//! transitive `import`), resolve symbols in two passes, then run the ten semantic passes.
//! Mirrors the `idl_compile` entry point of the reference implementation, but returns its
//! diagnostics as data rather than writing them anywhere itself.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::ast::Context;
use crate::diagnostics::{Diagnostic, DiagnosticsSink, Severity};
use crate::generator::{GenError, GeneratorKind};
use crate::lexer::Lexer;
use crate::location::FileTable;
use crate::options::Options;
use crate::parser::Parser;
use crate::semantic;
use crate::source::SourceResolver;
use crate::symbols;

pub struct CompilationResult {
    pub context: Context,
    pub files: FileTable,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilationResult {
    pub fn has_errors(&self, warnings_as_errors: bool) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
            || (warnings_as_errors && self.diagnostics.iter().any(|d| d.severity == Severity::Warning))
    }

    pub fn generate(&self, kind: GeneratorKind) -> Result<String, GenError> {
        let mut out = String::new();
        kind.make().generate(&self.context, &mut out)?;
        Ok(out)
    }
}

pub struct Compiler {
    options: Options,
}

impl Compiler {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Runs the full pipeline against `root`. Never panics on malformed input — every failure
    /// mode surfaces as a diagnostic in the returned result instead.
    pub fn compile(&self, root: &Path) -> CompilationResult {
        let files = FileTable::new();
        let mut sink = DiagnosticsSink::new(self.options.warnings_as_errors());
        let base_path: PathBuf = root.parent().map(Path::to_path_buf).unwrap_or_default();
        let resolver = SourceResolver::new(Some(&self.options), base_path);

        let mut lexer = Lexer::new(resolver, &files);
        if lexer.push_root(root, &mut sink).is_err() {
            return CompilationResult { context: Context::new(), files, diagnostics: sink.into_diagnostics() };
        }

        info!("parsing {}", root.display());
        let mut context = match Parser::new(lexer, &files, &mut sink) {
            Ok(mut parser) => {
                let _ = parser.parse_api(&mut sink);
                parser.into_context()
            }
            Err(_) => Context::new(),
        };

        if !sink.has_hard_errors() {
            debug!("resolving symbols ({} declarations)", context.len());
            if let Ok(table) = symbols::insert_declarations(&context, &mut sink, &files) {
                symbols::materialize_types(&mut context);
                let _ = symbols::resolve_references(&mut context, &table, &mut sink, &files);
            }
        } else {
            warn!("skipping symbol resolution: parse errors present");
        }

        if !sink.has_hard_errors() {
            debug!("running semantic passes");
            let _ = semantic::run_all(&mut context, &mut sink, &files);
        } else {
            warn!("skipping semantic passes: earlier errors present");
        }

        CompilationResult { context, files, diagnostics: sink.into_diagnostics() }
    }
}
