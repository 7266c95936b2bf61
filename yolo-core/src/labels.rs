use std::path::Path;

use anyhow::{Context, Result};

/// Ordered class names, indexed by the network's class id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLabels {
    names: Vec<String>,
}

impl ClassLabels {
    /// Load labels from a newline-delimited names file.
    ///
    /// Lines are trimmed and blank lines skipped, so trailing newlines and
    /// Windows line endings do not produce phantom classes. A file with no
    /// names at all is an error.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read labels file {}", path.display()))?;
        let labels = Self::parse(&contents);
        anyhow::ensure!(
            !labels.is_empty(),
            "labels file {} contains no class names",
            path.display()
        );
        Ok(labels)
    }

    /// Build a table from raw text, one name per line.
    pub fn parse(contents: &str) -> Self {
        let names = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect();
        Self { names }
    }

    /// Build a table from already-resolved names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Look up the name for a class id.
    pub fn get(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[test]
    fn parse_trims_and_skips_blank_lines() {
        let labels = ClassLabels::parse("person\n  bicycle  \n\n\ncar\n");
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(0), Some("person"));
        assert_eq!(labels.get(1), Some("bicycle"));
        assert_eq!(labels.get(2), Some("car"));
        assert_eq!(labels.get(3), None);
    }

    #[test]
    fn parse_handles_windows_line_endings() {
        let labels = ClassLabels::parse("person\r\nbicycle\r\n");
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get(1), Some("bicycle"));
    }

    #[test]
    fn load_rejects_empty_file() {
        let mut temp = NamedTempFile::new().expect("temp file");
        temp.write_all(b"\n  \n\n").expect("write blanks");

        let err = ClassLabels::load_from_path(temp.path()).expect_err("blank file should fail");
        assert!(format!("{err}").contains("no class names"));
    }

    #[test]
    fn load_rejects_missing_file() {
        assert!(ClassLabels::load_from_path("missing.names").is_err());
    }

    #[test]
    fn load_reads_names_file() {
        let mut temp = NamedTempFile::new().expect("temp file");
        temp.write_all(b"person\nbicycle\ncar\n")
            .expect("write names");

        let labels = ClassLabels::load_from_path(temp.path()).expect("load names");
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(2), Some("car"));
    }
}
