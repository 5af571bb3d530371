//! Compile-job configuration, mirroring `idl_options_t` from the reference implementation.

use std::path::PathBuf;
use std::sync::Arc;

pub type ImportCallback = Arc<dyn Fn(&str, u32) -> Option<Vec<u8>> + Send + Sync>;
pub type ReleaseImportCallback = Arc<dyn Fn(&[u8]) + Send + Sync>;
pub type WriteCallback = Arc<dyn Fn(&str, &[u8]) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
}

/// An in-memory source supplied up front, looked up before the filesystem search order kicks
/// in (resolution step 2 of the Source Resolver).
#[derive(Debug, Clone)]
pub struct InlineSource {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Default)]
pub struct Options {
    debug_mode: bool,
    warnings_as_errors: bool,
    output_dir: Option<PathBuf>,
    import_dirs: Vec<PathBuf>,
    importer: Option<ImportCallback>,
    release_importer: Option<ReleaseImportCallback>,
    writer: Option<WriteCallback>,
    version: Option<ApiVersion>,
    additions: Vec<String>,
    inline_sources: Vec<InlineSource>,
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("debug_mode", &self.debug_mode)
            .field("warnings_as_errors", &self.warnings_as_errors)
            .field("output_dir", &self.output_dir)
            .field("import_dirs", &self.import_dirs)
            .field("has_importer", &self.importer.is_some())
            .field("has_writer", &self.writer.is_some())
            .field("version", &self.version)
            .field("additions", &self.additions)
            .field("inline_sources", &self.inline_sources.iter().map(|s| &s.name).collect::<Vec<_>>())
            .finish()
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    pub fn set_debug_mode(&mut self, enable: bool) -> &mut Self {
        self.debug_mode = enable;
        self
    }

    pub fn warnings_as_errors(&self) -> bool {
        self.warnings_as_errors
    }

    pub fn set_warnings_as_errors(&mut self, enable: bool) -> &mut Self {
        self.warnings_as_errors = enable;
        self
    }

    pub fn output_dir(&self) -> Option<&PathBuf> {
        self.output_dir.as_ref()
    }

    pub fn set_output_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn import_dirs(&self) -> &[PathBuf] {
        &self.import_dirs
    }

    pub fn set_import_dirs(&mut self, dirs: Vec<PathBuf>) -> &mut Self {
        self.import_dirs = dirs;
        self
    }

    pub fn set_importer(&mut self, importer: ImportCallback, release: Option<ReleaseImportCallback>) -> &mut Self {
        self.importer = Some(importer);
        self.release_importer = release;
        self
    }

    pub fn importer(&self) -> Option<&ImportCallback> {
        self.importer.as_ref()
    }

    pub fn release_importer(&self) -> Option<&ReleaseImportCallback> {
        self.release_importer.as_ref()
    }

    pub fn set_writer(&mut self, writer: WriteCallback) -> &mut Self {
        self.writer = Some(writer);
        self
    }

    pub fn writer(&self) -> Option<&WriteCallback> {
        self.writer.as_ref()
    }

    pub fn version(&self) -> Option<ApiVersion> {
        self.version
    }

    pub fn set_version(&mut self, version: Option<ApiVersion>) -> &mut Self {
        self.version = version;
        self
    }

    pub fn additions(&self) -> &[String] {
        &self.additions
    }

    pub fn set_additions(&mut self, additions: Vec<String>) -> &mut Self {
        self.additions = additions;
        self
    }

    pub fn inline_sources(&self) -> &[InlineSource] {
        &self.inline_sources
    }

    pub fn set_inline_sources(&mut self, sources: Vec<InlineSource>) -> &mut Self {
        self.inline_sources = sources;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_setters_chain_and_stick() {
        let mut options = Options::new();
        options
            .set_warnings_as_errors(true)
            .set_additions(vec!["foo".to_string()])
            .set_version(Some(ApiVersion { major: 1, minor: 2, micro: 3 }));

        assert!(options.warnings_as_errors());
        assert_eq!(options.additions(), &["foo".to_string()]);
        assert_eq!(options.version(), Some(ApiVersion { major: 1, minor: 2, micro: 3 }));
    }

    #[test]
    fn defaults_are_empty() {
        let options = Options::new();
        assert!(!options.debug_mode());
        assert!(!options.warnings_as_errors());
        assert!(options.import_dirs().is_empty());
        assert!(options.version().is_none());
    }
}
