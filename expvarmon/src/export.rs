//! Optional per-service CSV export: one header row, then one row per poll tick.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::warn;

use crate::error::Result;
use crate::var::VarName;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug)]
pub struct CsvExport {
    path: PathBuf,
    w: BufWriter<File>,
}

impl CsvExport {
    /// Create `<dir>/<name>.csv` and write the header row.
    pub fn create(dir: &Path, name: &str, vars: &[VarName]) -> Result<Self> {
        let path = dir.join(format!("{}.csv", file_stem(name)));
        let file = File::create(&path)?;
        let mut export = Self {
            path,
            w: BufWriter::new(file),
        };
        let header: Vec<String> = std::iter::once("time".to_string())
            .chain(vars.iter().map(ToString::to_string))
            .collect();
        export.write_record(&header)?;
        Ok(export)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a timestamped row. Failures are logged, not returned.
    pub fn write_row(&mut self, values: &[String]) {
        let record: Vec<String> = std::iter::once(Local::now().format(TIME_FORMAT).to_string())
            .chain(values.iter().cloned())
            .collect();
        if let Err(e) = self.write_record(&record) {
            warn!(path = %self.path.display(), error = %e, "csv export write failed");
        }
    }

    pub fn close(mut self) {
        if let Err(e) = self.w.flush() {
            warn!(path = %self.path.display(), error = %e, "csv export flush failed");
        }
    }

    fn write_record(&mut self, fields: &[String]) -> std::io::Result<()> {
        let line = fields
            .iter()
            .map(|f| quote(f))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(self.w, "{line}")?;
        self.w.flush()
    }
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

// Display names may be `host:port` before the command line is known.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    if stem.is_empty() {
        "service".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting() {
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote("a,b"), "\"a,b\"");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(file_stem("localhost:1234"), "localhost_1234");
        assert_eq!(file_stem("server"), "server");
        assert_eq!(file_stem(""), "service");
    }

    #[test]
    fn header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let vars = vec![VarName::new("mem:memstats.Alloc"), VarName::new("goroutines")];
        let mut export = CsvExport::create(dir.path(), "localhost:1234", &vars).unwrap();
        assert_eq!(export.path(), dir.path().join("localhost_1234.csv"));
        export.write_row(&["1.0KB".to_string(), "N/A".to_string()]);
        let path = export.path().to_path_buf();
        export.close();

        let text = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "time,mem:memstats.Alloc,goroutines");
        assert!(lines[1].ends_with(",1.0KB,N/A"));
        // "YYYY-MM-DD HH:MM:SS"
        assert_eq!(lines[1].split(',').next().unwrap().len(), 19);
    }

    #[test]
    fn create_fails_for_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(CsvExport::create(&missing, "svc", &[]).is_err());
    }
}
