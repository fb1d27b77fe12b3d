use serde::Serialize;
use std::fs;
use std::path::Path;

pub fn format_fixed_f64(value: f64, width: usize, precision: usize) -> String {
    format!(
        "{value:>width$.precision$}",
        width = width,
        precision = precision
    )
}

/// One line per row, each component right-aligned in a fixed-width column.
pub fn format_vector_rows(rows: &[Vec<f64>], width: usize, precision: usize) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|value| format_fixed_f64(*value, width, precision))
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str) -> std::io::Result<()> {
    fs::write(path, normalize_text_artifact(content))
}

/// Pretty-printed JSON with a trailing newline; map keys come out sorted
/// because every record in this crate stores them in `BTreeMap`s.
pub fn to_json_artifact<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value).map(|content| normalize_text_artifact(&content))
}

pub fn write_json_artifact<T: Serialize + ?Sized>(path: &Path, value: &T) -> std::io::Result<()> {
    let content = to_json_artifact(value).map_err(std::io::Error::other)?;
    fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::{
        format_fixed_f64, format_vector_rows, normalize_text_artifact, write_json_artifact,
        write_text_artifact,
    };
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn fixed_width_float_formatting_is_deterministic() {
        assert_eq!(format_fixed_f64(1.23, 13, 5), "      1.23000");
        assert_eq!(format_fixed_f64(-0.5, 8, 3), "  -0.500");
    }

    #[test]
    fn vector_rows_are_aligned_per_component() {
        let rows = vec![vec![0.0, 0.1, -0.25], vec![1.5, 0.0, 0.0]];
        assert_eq!(
            format_vector_rows(&rows, 10, 4),
            "    0.0000    0.1000   -0.2500\n    1.5000    0.0000    0.0000"
        );
        assert_eq!(format_vector_rows(&[], 10, 4), "");
    }

    #[test]
    fn normalize_text_artifact_uses_canonical_line_endings() {
        let normalized = normalize_text_artifact("alpha\r\nbeta\rgamma");
        assert_eq!(normalized, "alpha\nbeta\ngamma\n");
    }

    #[test]
    fn repeated_text_writes_produce_identical_bytes() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("report.txt");
        let input = "line 1\r\nline 2\rline 3";

        write_text_artifact(&path, input).expect("first write should succeed");
        let first = fs::read(&path).expect("artifact should be readable");

        write_text_artifact(&path, input).expect("second write should succeed");
        let second = fs::read(&path).expect("artifact should be readable");

        assert_eq!(first, second);
        assert_eq!(second, b"line 1\nline 2\nline 3\n");
    }

    #[test]
    fn json_artifacts_end_with_a_newline() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("record.json");

        write_json_artifact(&path, &json!({"b": 1, "a": [1, 2]})).expect("write should succeed");
        let content = fs::read_to_string(&path).expect("artifact should be readable");

        assert!(content.ends_with("}\n"));
        let parsed: serde_json::Value = serde_json::from_str(&content).expect("valid JSON");
        assert_eq!(parsed, json!({"a": [1, 2], "b": 1}));
    }
}
