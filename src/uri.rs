//! Fetching line-oriented resources referenced from the configuration.
//!
//! The `*InUri` masks resolve their choice lists at bind time from a URI:
//! `http://` and `https://` fetch over the network (blocking, on the
//! calling thread), `file://` and bare paths read from disk.

use std::fs;

use anyhow::{Context, Result};

/// Reads a resource and splits it into its non-empty lines.
pub fn read_lines(uri: &str) -> Result<Vec<String>> {
    let body = if uri.starts_with("http://") || uri.starts_with("https://") {
        ureq::get(uri)
            .call()
            .with_context(|| format!("fetch '{uri}'"))?
            .into_string()
            .with_context(|| format!("read response body of '{uri}'"))?
    } else {
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        fs::read_to_string(path).with_context(|| format!("read '{uri}'"))?
    };
    let lines: Vec<String> = body
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if lines.is_empty() {
        anyhow::bail!("resource '{uri}' contains no usable lines");
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_lines_from_a_plain_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "alpha\n\nbeta").unwrap();
        let lines = read_lines(file.path().to_str().unwrap()).unwrap();
        assert_eq!(lines, vec!["alpha", "beta"]);
    }

    #[test]
    fn reads_lines_through_a_file_scheme() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "one").unwrap();
        let uri = format!("file://{}", file.path().display());
        assert_eq!(read_lines(&uri).unwrap(), vec!["one"]);
    }

    #[test]
    fn an_empty_resource_is_an_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(read_lines(file.path().to_str().unwrap()).is_err());
    }
}
