//! Project override file
//!
//! A project can carry a `runtestsfile` next to its sources. Each line is a
//! directive that mutates the [`Configuration`] before discovery begins:
//!
//! ```text
//! # run every spec below test/
//! run "test/**/*.spec.js"
//! filter test/fixtures/*.js test/helpers.js
//! filter-match "slow|flaky"
//! bail
//! timeout 2000
//! grep "parser"
//! runner node --enable-source-maps
//! ```
//!
//! Directives are applied to a staged copy of the configuration; the copy
//! replaces the live configuration only once every directive succeeded.

use crate::config::{Configuration, FilterSpec};
use crate::error::{Error, Result};
use regex::Regex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Name of the override file looked up in the project root
pub const OVERRIDE_FILE_NAME: &str = "runtestsfile";

/// Something that can adjust the configuration before a run
pub trait OverrideSource {
    /// Apply overrides to `config`
    fn apply(&self, config: &mut Configuration) -> Result<()>;
}

impl<F> OverrideSource for F
where
    F: Fn(&mut Configuration) -> Result<()>,
{
    fn apply(&self, config: &mut Configuration) -> Result<()> {
        self(config)
    }
}

/// A single directive line
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// The directive name (first word)
    pub name: String,
    /// Directive arguments
    pub args: Vec<String>,
    /// Line number in the override file
    pub line_num: usize,
}

/// Parse override file content into directives
///
/// # Errors
/// Returns a parse error for an unterminated quote
pub fn parse(content: &str) -> Result<Vec<Directive>> {
    let mut directives = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let line_num = i + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut tokens = split_command_line(trimmed)
            .map_err(|message| Error::Parse {
                line: line_num,
                message,
            })?
            .into_iter();

        if let Some(name) = tokens.next() {
            directives.push(Directive {
                name,
                args: tokens.collect(),
                line_num,
            });
        }
    }

    Ok(directives)
}

/// Split a line into tokens, honoring quotes and backslash escapes
pub fn split_command_line(input: &str) -> std::result::Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current_token = String::new();
    let mut in_quotes = false;
    let mut quote_char = '"';
    let mut just_closed_quotes = false;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' | '\'' => {
                if in_quotes && ch == quote_char {
                    in_quotes = false;
                    just_closed_quotes = true;
                } else if !in_quotes {
                    in_quotes = true;
                    quote_char = ch;
                    just_closed_quotes = false;
                } else {
                    // The other quote character is literal inside quotes
                    current_token.push(ch);
                }
            }
            ' ' | '\t' if !in_quotes => {
                if !current_token.is_empty() || just_closed_quotes {
                    tokens.push(std::mem::take(&mut current_token));
                    just_closed_quotes = false;
                }
            }
            '\\' => match chars.next() {
                // Single quotes keep backslashes except before another quote or backslash
                Some(next) if in_quotes && quote_char == '\'' => match next {
                    '\\' | '\'' => current_token.push(next),
                    _ => {
                        current_token.push('\\');
                        current_token.push(next);
                    }
                },
                Some(next) => match next {
                    'n' => current_token.push('\n'),
                    't' => current_token.push('\t'),
                    '\\' | '"' | '\'' | ' ' => current_token.push(next),
                    _ => {
                        current_token.push('\\');
                        current_token.push(next);
                    }
                },
                None => current_token.push('\\'),
            },
            _ => {
                current_token.push(ch);
                just_closed_quotes = false;
            }
        }
    }

    if in_quotes {
        return Err(format!("unterminated {} quote", quote_char));
    }

    if !current_token.is_empty() || just_closed_quotes {
        tokens.push(current_token);
    }

    Ok(tokens)
}

/// Apply a single directive to `config`
pub fn apply_directive(config: &mut Configuration, directive: &Directive) -> Result<()> {
    let args = directive.args.as_slice();

    match directive.name.as_str() {
        "run" => {
            config.run_args(args)?;
        }
        "filter" => {
            config.filter(FilterSpec::from_args(args)?);
        }
        "filter-match" => {
            let [pattern] = args else {
                return Err(Error::invalid_argument(
                    "filter-match expects exactly one regex",
                ));
            };
            let regex = Regex::new(pattern)?;
            config.filter(FilterSpec::predicate(move |file: &Path| {
                Ok(regex.is_match(&file.to_string_lossy()))
            }));
        }
        "bail" => {
            let bail = match args {
                [] => true,
                [value] => parse_bool(value)?,
                _ => return Err(Error::invalid_argument("bail expects at most one value")),
            };
            config.bail(bail);
        }
        "timeout" => {
            let [value] = args else {
                return Err(Error::invalid_argument("timeout expects a number of milliseconds"));
            };
            let timeout = value.parse::<u64>().map_err(|_| {
                Error::invalid_argument(format!(
                    "timeout expects a number of milliseconds, got '{}'",
                    value
                ))
            })?;
            config.timeout(timeout);
        }
        "grep" => {
            let [pattern] = args else {
                return Err(Error::invalid_argument("grep expects exactly one pattern"));
            };
            config.grep(pattern.as_str());
        }
        "runner" => {
            config.runner(args.to_vec())?;
        }
        other => {
            return Err(Error::invalid_argument(format!(
                "unknown directive '{}'",
                other
            )));
        }
    }

    Ok(())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(Error::invalid_argument(format!(
            "bail expects true or false, got '{}'",
            value
        ))),
    }
}

/// The override file of a project
#[derive(Debug, Clone)]
pub struct OverrideFile {
    path: PathBuf,
}

impl OverrideFile {
    /// Use an override file at an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The override file at the well-known location inside `project_root`
    pub fn in_project(project_root: &Path) -> Self {
        Self::new(project_root.join(OVERRIDE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the file, `None` when it does not exist
    pub fn load(&self) -> Result<Option<Vec<Directive>>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::override_load(&self.path, 0, Error::Io(e))),
        };

        parse(&content).map(Some).map_err(|e| match e {
            Error::Parse { line, .. } => Error::override_load(&self.path, line, e),
            other => Error::override_load(&self.path, 0, other),
        })
    }
}

impl OverrideSource for OverrideFile {
    fn apply(&self, config: &mut Configuration) -> Result<()> {
        let Some(directives) = self.load()? else {
            tracing::debug!(path = %self.path.display(), "no override file");
            return Ok(());
        };

        let mut staged = config.clone();
        for directive in &directives {
            apply_directive(&mut staged, directive)
                .map_err(|e| Error::override_load(&self.path, directive.line_num, e))?;
        }

        tracing::debug!(
            path = %self.path.display(),
            directives = directives.len(),
            "applied overrides"
        );
        *config = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_command_line() {
        let tokens = split_command_line("run test/*.js").unwrap();
        assert_eq!(tokens, vec!["run", "test/*.js"]);

        let tokens = split_command_line("grep \"hello world\"").unwrap();
        assert_eq!(tokens, vec!["grep", "hello world"]);

        let tokens = split_command_line("grep \"escaped\\\"quote\"").unwrap();
        assert_eq!(tokens, vec!["grep", "escaped\"quote"]);

        let tokens = split_command_line("grep ''").unwrap();
        assert_eq!(tokens, vec!["grep", ""]);

        let tokens = split_command_line("runner node   --test\t-x").unwrap();
        assert_eq!(tokens, vec!["runner", "node", "--test", "-x"]);

        let tokens = split_command_line("filter-match 'a\\d+'").unwrap();
        assert_eq!(tokens, vec!["filter-match", "a\\d+"]);
    }

    #[test]
    fn test_unterminated_quote() {
        let err = split_command_line("grep \"oops").unwrap_err();
        assert!(err.contains("unterminated"));

        let err = parse("run a\ngrep 'oops").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let content = r#"# comment

run "test/**/*.js"
  # indented comment
bail
"#;
        let directives = parse(content).unwrap();
        assert_eq!(directives.len(), 2);
        assert_eq!(directives[0].name, "run");
        assert_eq!(directives[0].args, vec!["test/**/*.js"]);
        assert_eq!(directives[0].line_num, 3);
        assert_eq!(directives[1].name, "bail");
        assert!(directives[1].args.is_empty());
        assert_eq!(directives[1].line_num, 5);
    }

    fn directive(line: &str) -> Directive {
        parse(line).unwrap().remove(0)
    }

    #[test]
    fn test_apply_each_directive() {
        let mut config = Configuration::new();
        for line in [
            "run custom/**/*.js",
            "filter a.js b.js",
            "bail false",
            "timeout 0",
            "grep ''",
            "runner deno test",
        ] {
            apply_directive(&mut config, &directive(line)).unwrap();
        }

        assert_eq!(config.tests_glob, "custom/**/*.js");
        assert_eq!(config.ignore_pattern, vec!["a.js", "b.js"]);
        assert!(!config.bail);
        assert_eq!(config.timeout, Some(0));
        assert_eq!(config.grep.as_deref(), Some(""));
        assert_eq!(config.runner, vec!["deno", "test"]);
    }

    #[test]
    fn test_filter_match_excludes_matching_paths() {
        let mut config = Configuration::new();
        apply_directive(&mut config, &directive("filter-match 'slow'")).unwrap();

        let callback = config.filter_callback.expect("callback installed");
        assert!(callback(Path::new("/p/test/slow.spec.js")).unwrap());
        assert!(!callback(Path::new("/p/test/fast.spec.js")).unwrap());
        assert!(config.ignore_pattern.is_empty());
    }

    #[test]
    fn test_invalid_directives() {
        let mut config = Configuration::new();
        for line in [
            "run",
            "run a b",
            "filter",
            "bail maybe",
            "timeout soon",
            "grep",
            "runner",
            "foo",
        ] {
            let err = apply_directive(&mut config, &directive(line)).unwrap_err();
            assert!(
                matches!(err, Error::InvalidArgument(_)),
                "'{}' gave {:?}",
                line,
                err
            );
        }

        let err = apply_directive(&mut config, &directive("filter-match '('")).unwrap_err();
        assert!(matches!(err, Error::Regex(_)));
    }
}
