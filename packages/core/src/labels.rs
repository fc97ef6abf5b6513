use std::{fs, io, path::Path};

/// Ordered class labels, index-aligned with the model output vector.
///
/// Parses the `labels.txt` format emitted by common TFLite export tooling:
/// one label per line, optionally prefixed with its numeric class index
/// (`0 Apple Scab`). Blank lines are skipped.
#[derive(Debug, Clone, Default)]
pub struct Labels(Vec<String>);

impl Labels {
    pub fn new(labels: Vec<String>) -> Self {
        Self(labels)
    }

    pub fn from_file(path: &Path) -> io::Result<Self> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    pub fn parse(contents: &str) -> Self {
        let labels = contents
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(strip_index)
            .map(str::to_string)
            .collect();
        Self(labels)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.0.get(idx).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }
}

/// Drops a leading `<index> ` prefix if present. A line that is nothing but
/// a number is kept verbatim.
fn strip_index(line: &str) -> &str {
    match line.split_once(char::is_whitespace) {
        Some((first, rest)) if first.parse::<usize>().is_ok() => rest.trim_start(),
        _ => line,
    }
}
