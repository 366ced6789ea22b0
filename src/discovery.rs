//! Test file discovery
//!
//! Resolves the configured glob and ignore patterns against a project root
//! and returns the canonical, sorted, deduplicated list of files to run.

use crate::error::{Error, Result};
use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Discover test files under `project_root`
///
/// `tests_glob` and every entry of `ignore` are resolved relative to the
/// project root. Every ignore pattern is compiled before the filesystem is
/// touched, so a bad ignore never results in a partially filtered set.
pub fn discover(project_root: &Path, tests_glob: &str, ignore: &[String]) -> Result<Vec<PathBuf>> {
    let root = resolve_root(project_root)?;

    let pattern = resolve_pattern(&root, tests_glob);
    let matcher = compile_glob(&pattern)?.compile_matcher();
    let ignores = compile_ignores(&root, ignore)?;

    let bounds = walk_bounds(&pattern);
    tracing::debug!(
        root = %root.display(),
        pattern = %pattern,
        base = %bounds.base.display(),
        "discovering test files"
    );

    if !bounds.base.exists() {
        return Ok(Vec::new());
    }

    let mut walker = WalkDir::new(&bounds.base).follow_links(true);
    if let Some(depth) = bounds.max_depth {
        walker = walker.max_depth(depth);
    }
    let dotfiles = bounds.dotfiles;
    let walker = walker
        .into_iter()
        .filter_entry(move |entry| dotfiles || entry.depth() == 0 || !is_hidden(entry));

    let mut test_files = BTreeSet::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if is_dangling_link(&e) => {
                tracing::debug!(path = ?e.path(), "skipping dangling symlink");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !is_match(&matcher, path) || is_ignored(&ignores, path) {
            continue;
        }

        let canonical = canonicalize(path)?;
        if canonical != path && is_ignored(&ignores, &canonical) {
            continue;
        }
        test_files.insert(canonical);
    }

    tracing::debug!(count = test_files.len(), "discovered test files");
    Ok(test_files.into_iter().collect())
}

/// The canonical form of a project root
pub fn resolve_root(project_root: &Path) -> Result<PathBuf> {
    canonicalize(project_root)
}

fn canonicalize(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|source| Error::Resolve {
        path: path.display().to_string(),
        source,
    })
}

/// Join a pattern onto the project root, dropping `./` segments
fn resolve_pattern(root: &Path, pattern: &str) -> String {
    let trimmed = pattern.trim_start_matches("./");
    let joined = root.join(trimmed);
    to_slash(&joined)
}

fn compile_glob(pattern: &str) -> Result<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| Error::Glob {
            pattern: pattern.to_string(),
            source,
        })
}

fn compile_ignores(root: &Path, ignore: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for glob in ignore {
        builder.add(compile_glob(&resolve_pattern(root, glob))?);
    }
    builder.build().map_err(|source| Error::Glob {
        pattern: ignore.join(", "),
        source,
    })
}

fn is_match(matcher: &GlobMatcher, path: &Path) -> bool {
    matcher.is_match(to_slash(path))
}

fn is_ignored(ignores: &GlobSet, path: &Path) -> bool {
    !ignores.is_empty() && ignores.is_match(to_slash(path))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// A link whose target is gone; loops and permission errors are not
fn is_dangling_link(err: &walkdir::Error) -> bool {
    err.loop_ancestor().is_none()
        && err
            .io_error()
            .is_some_and(|io| io.kind() == ErrorKind::NotFound)
}

/// Where a discovery walk starts and what it may visit
#[derive(Debug, PartialEq)]
struct WalkBounds {
    base: PathBuf,
    /// `None` when the pattern contains `**`
    max_depth: Option<usize>,
    /// Whether dot-prefixed entries below `base` can match
    dotfiles: bool,
}

/// Split a resolved pattern into the directory to walk and how deep to go
///
/// The walk starts at the longest prefix without glob metacharacters. A
/// `**` anywhere after it makes the walk unbounded. Wildcards never match
/// a leading dot, so hidden entries are only visited when the pattern
/// spells a dot-prefixed component after the base.
fn walk_bounds(pattern: &str) -> WalkBounds {
    let mut base = PathBuf::new();
    let mut rest = Vec::new();

    for component in Path::new(pattern).components() {
        let text = component.as_os_str().to_string_lossy();
        if rest.is_empty() && !has_glob_meta(&text) {
            base.push(component);
        } else {
            rest.push(text.into_owned());
        }
    }

    // A literal pattern names a file; walk its parent so the file itself is visited.
    if rest.is_empty() {
        let file = base
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        if let Some(file) = file {
            base.pop();
            rest.push(file);
        }
    }

    let unbounded = rest.iter().any(|part| part.contains("**"));
    WalkBounds {
        base,
        max_depth: if unbounded { None } else { Some(rest.len()) },
        dotfiles: rest.iter().any(|part| part.starts_with('.')),
    }
}

fn has_glob_meta(text: &str) -> bool {
    text.contains(&['*', '?', '[', '{'][..])
}

fn to_slash(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push_str(&prefix.as_os_str().to_string_lossy()),
            Component::RootDir => out.push('/'),
            other => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&other.as_os_str().to_string_lossy());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_bounds_for_flat_pattern() {
        let bounds = walk_bounds("/project/test/*.spec.js");
        assert_eq!(bounds.base, PathBuf::from("/project/test"));
        assert_eq!(bounds.max_depth, Some(1));
        assert!(!bounds.dotfiles);
    }

    #[test]
    fn walk_bounds_for_recursive_pattern() {
        let bounds = walk_bounds("/project/test/**/*.js");
        assert_eq!(bounds.base, PathBuf::from("/project/test"));
        assert_eq!(bounds.max_depth, None);
    }

    #[test]
    fn walk_bounds_for_nested_wildcards() {
        let bounds = walk_bounds("/project/*/unit/*.js");
        assert_eq!(bounds.base, PathBuf::from("/project"));
        assert_eq!(bounds.max_depth, Some(3));
    }

    #[test]
    fn walk_bounds_for_literal_file() {
        let bounds = walk_bounds("/project/test/only.spec.js");
        assert_eq!(bounds.base, PathBuf::from("/project/test"));
        assert_eq!(bounds.max_depth, Some(1));
    }

    #[test]
    fn walk_bounds_allows_spelled_dotfiles() {
        assert!(walk_bounds("/project/test/.*.js").dotfiles);
        assert!(walk_bounds("/project/test/*/.fixtures/*.js").dotfiles);
        // A hidden base directory is part of the literal prefix
        assert!(!walk_bounds("/project/.config/*.js").dotfiles);
    }

    #[test]
    fn resolve_pattern_strips_dot_slash() {
        let resolved = resolve_pattern(Path::new("/project"), "./test/*.js");
        assert_eq!(resolved, "/project/test/*.js");
    }

    #[test]
    fn star_does_not_cross_directories() {
        let glob = compile_glob("/project/test/*.js").unwrap().compile_matcher();
        assert!(is_match(&glob, Path::new("/project/test/a.js")));
        assert!(!is_match(&glob, Path::new("/project/test/nested/a.js")));
    }

    #[test]
    fn invalid_glob_is_a_discovery_error() {
        let err = compile_glob("/project/test/[*.js").unwrap_err();
        assert!(err.is_discovery());
    }
}
