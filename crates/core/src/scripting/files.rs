//! Working-directory file handling: input files written before a run and
//! output files collected after it.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use regex::Regex;
use tokio::fs;

use crate::error::CoreError;

/// Reject names that would land outside the working directory.
pub fn validate_relative_path(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("File name cannot be empty".to_string()));
    }
    if name.contains('\0') {
        return Err(CoreError::Validation(format!(
            "File name '{name}' contains null bytes"
        )));
    }
    let escapes = Path::new(name).components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(CoreError::Validation(format!(
            "File name '{name}' must be a relative path inside the working directory"
        )));
    }
    Ok(())
}

/// Write each `name -> content` pair below `dir`, creating parent
/// directories. Returns the written paths in name order.
pub async fn write_input_files(
    dir: &Path,
    files: &BTreeMap<String, String>,
) -> std::io::Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(files.len());
    for (name, content) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, content).await?;
        written.push(path);
    }
    Ok(written)
}

// ---------------------------------------------------------------------------
// Output globs
// ---------------------------------------------------------------------------

/// Translate a glob into an anchored regex over `/`-separated relative paths.
///
/// `**/` matches zero or more directories, `**` anything, `*` anything but
/// `/`, `?` one character but `/`.
pub fn glob_to_regex(pattern: &str) -> Result<Regex, CoreError> {
    let mut re = String::from("^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    re.push_str("(?:.*/)?");
                } else {
                    re.push_str(".*");
                }
            }
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).map_err(|e| CoreError::Validation(format!("Invalid pattern '{pattern}': {e}")))
}

/// Compiled `outputFiles` patterns.
#[derive(Debug, Clone)]
pub struct OutputMatcher {
    patterns: Vec<Regex>,
}

impl OutputMatcher {
    pub fn new(patterns: &[String]) -> Result<Self, CoreError> {
        let patterns = patterns
            .iter()
            .map(|p| glob_to_regex(p.trim_start_matches("./")))
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, relative: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(relative))
    }

    /// Walk `dir` and return every regular file matching a pattern, keyed by
    /// its `/`-separated path relative to `dir`.
    pub async fn collect(&self, dir: &Path) -> std::io::Result<BTreeMap<String, PathBuf>> {
        let mut found = BTreeMap::new();
        if self.is_empty() {
            return Ok(found);
        }

        let mut pending = vec![dir.to_path_buf()];
        while let Some(current) = pending.pop() {
            let mut entries = fs::read_dir(&current).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }
                if !file_type.is_file() {
                    continue;
                }
                let Ok(relative) = path.strip_prefix(dir) else {
                    continue;
                };
                let relative = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if self.matches(&relative) {
                    found.insert(relative, path);
                }
            }
        }
        Ok(found)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn relative_names_are_accepted() {
        assert!(validate_relative_path("main.rb").is_ok());
        assert!(validate_relative_path("data/input.json").is_ok());
        assert!(validate_relative_path("./main.rb").is_ok());
    }

    #[test]
    fn escaping_names_are_rejected() {
        assert_matches!(validate_relative_path("../etc/passwd"), Err(CoreError::Validation(_)));
        assert_matches!(validate_relative_path("/etc/passwd"), Err(CoreError::Validation(_)));
        assert_matches!(validate_relative_path("a/../../b"), Err(CoreError::Validation(_)));
        assert_matches!(validate_relative_path("  "), Err(CoreError::Validation(_)));
    }

    #[test]
    fn glob_star_stays_in_one_directory() {
        let re = glob_to_regex("*.csv").expect("compile");
        assert!(re.is_match("output.csv"));
        assert!(!re.is_match("nested/output.csv"));
        assert!(!re.is_match("output.csv.bak"));
    }

    #[test]
    fn glob_double_star_crosses_directories() {
        let re = glob_to_regex("**/*.json").expect("compile");
        assert!(re.is_match("result.json"));
        assert!(re.is_match("a/b/result.json"));

        let re = glob_to_regex("out/**").expect("compile");
        assert!(re.is_match("out/x/y.txt"));
        assert!(!re.is_match("other/x.txt"));
    }

    #[test]
    fn glob_escapes_regex_metacharacters() {
        let re = glob_to_regex("report(1).txt").expect("compile");
        assert!(re.is_match("report(1).txt"));
        assert!(!re.is_match("report1.txt"));

        let re = glob_to_regex("file?.log").expect("compile");
        assert!(re.is_match("file1.log"));
        assert!(!re.is_match("file12.log"));
    }

    #[tokio::test]
    async fn inputs_are_written_and_outputs_collected() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut files = BTreeMap::new();
        files.insert("main.rb".to_string(), "puts 1".to_string());
        files.insert("data/in.json".to_string(), "[]".to_string());

        let written = write_input_files(dir.path(), &files).await.expect("write");
        assert_eq!(written.len(), 2);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("data/in.json")).expect("read"),
            "[]"
        );

        std::fs::write(dir.path().join("output.csv"), "a,b").expect("write csv");
        std::fs::write(dir.path().join("data/extra.csv"), "c,d").expect("write csv");

        let matcher = OutputMatcher::new(&["*.csv".to_string()]).expect("compile");
        let collected = matcher.collect(dir.path()).await.expect("collect");
        assert_eq!(collected.keys().collect::<Vec<_>>(), vec!["output.csv"]);

        let matcher = OutputMatcher::new(&["**/*.csv".to_string()]).expect("compile");
        let collected = matcher.collect(dir.path()).await.expect("collect");
        assert_eq!(
            collected.keys().collect::<Vec<_>>(),
            vec!["data/extra.csv", "output.csv"]
        );
    }

    #[tokio::test]
    async fn no_patterns_collect_nothing() {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::write(dir.path().join("x.txt"), "x").expect("write");
        let matcher = OutputMatcher::new(&[]).expect("compile");
        assert!(matcher.collect(dir.path()).await.expect("collect").is_empty());
    }
}
