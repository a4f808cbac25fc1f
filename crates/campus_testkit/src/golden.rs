//! Golden-file comparison.
//!
//! Set `UPDATE_GOLDEN=1` to rewrite the expected files from the actual
//! output instead of comparing.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A golden test that compares output against expected files.
pub struct GoldenTest {
    name: String,
    golden_dir: PathBuf,
    update_mode: bool,
}

impl GoldenTest {
    /// Creates a golden test reading `<golden_dir>/<name>[_suffix].golden`.
    pub fn new(name: impl Into<String>, golden_dir: impl AsRef<Path>) -> Self {
        Self {
            name: name.into(),
            golden_dir: golden_dir.as_ref().to_path_buf(),
            update_mode: std::env::var("UPDATE_GOLDEN").is_ok(),
        }
    }

    /// Creates a golden test using the workspace `docs/test_vectors` directory.
    pub fn with_default_dir(name: impl Into<String>) -> Self {
        let golden_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .and_then(|p| p.parent())
            .map(|p| p.join("docs").join("test_vectors"))
            .unwrap_or_else(|| PathBuf::from("test_vectors"));

        Self::new(name, golden_dir)
    }

    /// Asserts that `actual` matches the golden file.
    pub fn assert_text(&self, suffix: &str, actual: &str) {
        let path = self.file_path(suffix);

        if self.update_mode {
            self.update_golden_file(&path, actual.as_bytes());
            return;
        }

        if !path.exists() {
            panic!(
                "Golden file not found: {:?}\n\
                 Run with UPDATE_GOLDEN=1 to create it.\n\
                 Actual:\n{}",
                path, actual
            );
        }

        let expected = fs::read_to_string(&path).expect("Failed to read golden file");

        if normalize(actual) != normalize(&expected) {
            panic!(
                "Golden test '{}' failed for '{}':\n\
                 --- Expected ---\n{}\n\
                 --- Actual ---\n{}\n\
                 Run with UPDATE_GOLDEN=1 to update.",
                self.name, suffix, expected, actual
            );
        }
    }

    /// Asserts that the pretty JSON form of `value` matches the golden file.
    pub fn assert_json<T: Serialize>(&self, suffix: &str, value: &T) {
        let mut text = serde_json::to_string_pretty(value).expect("value is not serializable");
        text.push('\n');
        self.assert_text(suffix, &text);
    }

    fn file_path(&self, suffix: &str) -> PathBuf {
        let filename = if suffix.is_empty() {
            format!("{}.golden", self.name)
        } else {
            format!("{}_{}.golden", self.name, suffix)
        };
        self.golden_dir.join(filename)
    }

    fn update_golden_file(&self, path: &Path, data: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create golden directory");
        }
        fs::write(path, data).expect("Failed to write golden file");
        println!("Updated golden file: {:?}", path);
    }
}

// Checkouts on Windows may carry CRLF line endings.
fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn matching_text_passes() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("sample_a.golden"), "one\r\ntwo\n").unwrap();
        let golden = GoldenTest {
            name: "sample".into(),
            golden_dir: dir.path().to_path_buf(),
            update_mode: false,
        };
        golden.assert_text("a", "one\ntwo\n");
    }

    #[test]
    #[should_panic(expected = "Golden test 'sample' failed")]
    fn mismatch_panics() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("sample.golden"), "one\n").unwrap();
        let golden = GoldenTest {
            name: "sample".into(),
            golden_dir: dir.path().to_path_buf(),
            update_mode: false,
        };
        golden.assert_text("", "two\n");
    }
}
