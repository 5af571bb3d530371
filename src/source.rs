//! Maps a logical import name (or the root file path) to bytes plus a canonical dedup key.
//!
//! Resolution order follows the spec exactly: client importer callback, then inline sources,
//! then the configured `import_dirs` followed by the base path, each tried with the `.idl`
//! extension appended and a case-insensitive directory scan as a fallback, progressively
//! rewriting `.` to `/` in the logical name so `foo.bar` resolves to `foo/bar.idl`.

use crate::options::{Options, ReleaseImportCallback};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ResolveError {
    NotFound(String),
    OpenFailed(String),
    AbsoluteImport(String),
}

pub struct ResolvedSource {
    /// Lowercase, `/`-separated, `.idl`-stripped key used to deduplicate imports.
    pub canonical_key: String,
    /// The name recorded on tokens/diagnostics for this file.
    pub display_name: String,
    pub bytes: Vec<u8>,
    /// Set only when the bytes came from the client importer callback. Must be invoked once
    /// these bytes are fully consumed (the source is retired), not at fetch time.
    pub release: Option<ReleaseImportCallback>,
}

impl std::fmt::Debug for ResolvedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSource")
            .field("canonical_key", &self.canonical_key)
            .field("display_name", &self.display_name)
            .field("bytes", &self.bytes)
            .field("release", &self.release.is_some())
            .finish()
    }
}

pub struct SourceResolver<'a> {
    options: Option<&'a Options>,
    base_path: PathBuf,
}

impl<'a> SourceResolver<'a> {
    pub fn new(options: Option<&'a Options>, base_path: PathBuf) -> Self {
        Self { options, base_path }
    }

    /// Resolves the root file. Absolute paths are accepted here only.
    pub fn resolve_root(&self, path: &Path) -> Result<ResolvedSource, ResolveError> {
        if let Some(options) = self.options {
            if let Some(source) = options.inline_sources().first() {
                if path.as_os_str().is_empty() {
                    let bytes = source.bytes.clone();
                    let display_name = self.relative_display(&source.name);
                    return Ok(ResolvedSource {
                        canonical_key: normalize(&display_name),
                        display_name,
                        bytes,
                        release: None,
                    });
                }
            }
        }
        let bytes = fs::read(path).map_err(|_| ResolveError::OpenFailed(path.display().to_string()))?;
        let display_name = self.relative_display(&path.to_string_lossy());
        Ok(ResolvedSource { canonical_key: normalize(&display_name), display_name, bytes, release: None })
    }

    /// Resolves a name that appeared after `import`. Absolute paths are rejected here (E2041).
    ///
    /// When the client importer callback supplies the bytes, its paired release callback is
    /// carried on the returned [`ResolvedSource`] rather than invoked here: the spec requires it
    /// run once the source is retired (fully lexed), not at fetch time.
    pub fn resolve_import(&self, name: &str, depth: u32) -> Result<ResolvedSource, ResolveError> {
        if Path::new(name).is_absolute() {
            return Err(ResolveError::AbsoluteImport(name.to_string()));
        }

        if let Some(options) = self.options {
            if let Some(importer) = options.importer() {
                if let Some(bytes) = importer(name, depth) {
                    let display_name = normalize(name);
                    return Ok(ResolvedSource {
                        canonical_key: display_name.clone(),
                        display_name,
                        bytes,
                        release: options.release_importer().cloned(),
                    });
                }
            }
            let wanted = normalize(name);
            for source in options.inline_sources() {
                if normalize(&source.name) == wanted {
                    return Ok(ResolvedSource {
                        canonical_key: wanted.clone(),
                        display_name: wanted,
                        bytes: source.bytes.clone(),
                        release: None,
                    });
                }
            }
        }

        let mut dirs: Vec<&Path> = Vec::new();
        if let Some(options) = self.options {
            dirs.extend(options.import_dirs().iter().map(PathBuf::as_path));
        }
        dirs.push(&self.base_path);

        for dir in dirs {
            if let Some(found) = find_in_dir(dir, name) {
                let bytes = fs::read(&found).map_err(|_| ResolveError::OpenFailed(found.display().to_string()))?;
                let display_name = self.relative_display(&found.to_string_lossy());
                return Ok(ResolvedSource { canonical_key: normalize(&display_name), display_name, bytes, release: None });
            }
        }

        Err(ResolveError::NotFound(name.to_string()))
    }

    fn relative_display(&self, path: &str) -> String {
        let p = Path::new(path);
        if p.is_absolute() {
            pathdiff(p, &self.base_path).to_string_lossy().replace('\\', "/")
        } else {
            path.replace('\\', "/")
        }
    }
}

/// Candidate filesystem paths for `logical_name` under `dir`, trying the `.idl` suffix and then
/// progressively rewriting each remaining `.` in the name to a path separator.
fn candidate_paths(dir: &Path, logical_name: &str) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut filename = logical_name.to_string();
    loop {
        let mut candidate = PathBuf::from(&filename);
        let needs_idl = match candidate.extension() {
            Some(ext) => !ext.eq_ignore_ascii_case("idl"),
            None => true,
        };
        if needs_idl {
            let mut os = candidate.into_os_string();
            os.push(".idl");
            candidate = PathBuf::from(os);
        }
        out.push(dir.join(&candidate));
        match filename.find('.') {
            Some(idx) => filename.replace_range(idx..idx + 1, "/"),
            None => break,
        }
    }
    out
}

fn find_in_dir(dir: &Path, logical_name: &str) -> Option<PathBuf> {
    for candidate in candidate_paths(dir, logical_name) {
        if candidate.is_file() {
            return Some(candidate);
        }
        if let Some(parent) = candidate.parent() {
            if let Some(file_name) = candidate.file_name() {
                let wanted = file_name.to_string_lossy().to_lowercase();
                if let Ok(entries) = fs::read_dir(parent) {
                    for entry in entries.flatten() {
                        if entry.file_name().to_string_lossy().to_lowercase() == wanted
                            && entry.path().is_file()
                        {
                            return Some(entry.path());
                        }
                    }
                }
            }
        }
    }
    None
}

/// Lowercase, `/`-separated, `.idl`-suffix-stripped canonical key.
pub fn normalize(name: &str) -> String {
    let mut s = name.replace('\\', "/").to_lowercase();
    if let Some(stripped) = s.strip_suffix(".idl") {
        s = stripped.to_string();
    }
    s
}

fn pathdiff(path: &Path, base: &Path) -> PathBuf {
    match path.strip_prefix(base) {
        Ok(rel) => rel.to_path_buf(),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_and_strips_idl_suffix() {
        assert_eq!(normalize("Foo.Bar.IDL"), "foo.bar");
        assert_eq!(normalize("foo\\bar.idl"), "foo/bar");
        assert_eq!(normalize("foo"), "foo");
    }

    #[test]
    fn candidate_paths_tries_dotted_segments_before_dropping_the_idl_suffix() {
        let dir = Path::new("/base");
        let candidates = candidate_paths(dir, "foo.bar");
        assert_eq!(candidates[0], dir.join("foo.bar.idl"));
        assert_eq!(candidates[1], dir.join("foo/bar.idl"));
    }

    #[test]
    fn resolve_import_rejects_absolute_names() {
        let resolver = SourceResolver::new(None, PathBuf::from("/base"));
        let err = resolver.resolve_import("/etc/passwd", 0).unwrap_err();
        assert!(matches!(err, ResolveError::AbsoluteImport(_)));
    }

    #[test]
    fn resolve_import_finds_an_inline_source_before_touching_the_filesystem() {
        let mut options = Options::new();
        options.set_inline_sources(vec![crate::options::InlineSource {
            name: "foo".to_string(),
            bytes: b"api Foo {}".to_vec(),
        }]);
        let resolver = SourceResolver::new(Some(&options), PathBuf::from("/does/not/exist"));
        let resolved = resolver.resolve_import("foo", 0).unwrap();
        assert_eq!(resolved.bytes, b"api Foo {}");
    }
}
