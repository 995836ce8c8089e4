// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Text output of recorded data.
//!
//! Rows are tab-delimited with times and voltages in C `%g` notation and ids
//! as integers. A [`CompatibleOutput`] writer can rewrite the file into the
//! standard format shared by all simulator backends.

use std::fmt::Write as _;
use std::path::Path;

use ndarray::Array2;

use neurobridge_core::Gid;

/// Metadata written ahead of the data rows
#[derive(Debug, Clone, PartialEq)]
pub struct OutputHeader {
    pub variable: String,
    /// Column layout, e.g. `"t id"`
    pub columns: String,
    pub dt: f64,
    pub n: usize,
    pub first_id: Option<Gid>,
    pub last_id: Option<Gid>,
    pub label: Option<String>,
}

impl OutputHeader {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("# variable = {}", self.variable),
            format!("# columns = {}", self.columns),
            format!("# dt = {}", format_g(self.dt)),
            format!("# n = {}", self.n),
        ];
        if let Some(id) = self.first_id {
            lines.push(format!("# first_id = {}", id));
        }
        if let Some(id) = self.last_id {
            lines.push(format!("# last_id = {}", id));
        }
        if let Some(label) = &self.label {
            lines.push(format!("# label = {}", label));
        }
        lines
    }
}

/// Post-processes a freshly written data file in place
pub trait CompatibleOutput {
    fn write_compatible_output(&self, path: &Path, header: &OutputHeader) -> std::io::Result<()>;
}

/// Prepends `# key = value` header lines to the data file
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardHeaderWriter;

impl CompatibleOutput for StandardHeaderWriter {
    fn write_compatible_output(&self, path: &Path, header: &OutputHeader) -> std::io::Result<()> {
        let data = std::fs::read_to_string(path)?;
        let mut out = header.lines().join("\n");
        out.push('\n');
        out.push_str(&data);
        std::fs::write(path, out)
    }
}

/// Render `data` as tab-delimited rows; the last column is an integer id.
pub fn format_rows(data: &Array2<f64>) -> String {
    let mut out = String::new();
    let ncols = data.ncols();
    for row in data.rows() {
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                out.push('\t');
            }
            if i + 1 == ncols {
                let _ = write!(out, "{}", *value as i64);
            } else {
                out.push_str(&format_g(*value));
            }
        }
        out.push('\n');
    }
    out
}

/// Format like C's `%g`: six significant digits, trailing zeros removed,
/// exponent notation for very small or large magnitudes.
pub fn format_g(value: f64) -> String {
    const PRECISION: i32 = 6;

    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Round to the target precision first; rounding can bump the exponent.
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exponent < -4 || exponent >= PRECISION {
        let mantissa = trim_fraction(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    } else {
        let decimals = (PRECISION - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_format_g_matches_printf() {
        assert_eq!(format_g(0.0), "0");
        assert_eq!(format_g(1.0), "1");
        assert_eq!(format_g(0.1), "0.1");
        assert_eq!(format_g(12.5), "12.5");
        assert_eq!(format_g(-65.0), "-65");
        assert_eq!(format_g(123456.0), "123456");
        assert_eq!(format_g(1234567.0), "1.23457e+06");
        assert_eq!(format_g(0.0001), "0.0001");
        assert_eq!(format_g(0.00001), "1e-05");
        assert_eq!(format_g(999999.5), "1e+06");
        assert_eq!(format_g(3.14159265), "3.14159");
    }

    #[test]
    fn test_rows_end_with_integer_id() {
        let data = array![[0.1, 3.0], [12.5, 7.0]];
        assert_eq!(format_rows(&data), "0.1\t3\n12.5\t7\n");

        let v = array![[0.0, -65.0, 2.0]];
        assert_eq!(format_rows(&v), "0\t-65\t2\n");
    }

    #[test]
    fn test_standard_header_is_prepended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spikes.dat");
        std::fs::write(&path, "0.1\t3\n").unwrap();

        let header = OutputHeader {
            variable: "spikes".to_string(),
            columns: "t id".to_string(),
            dt: 0.1,
            n: 1,
            first_id: Some(Gid(0)),
            last_id: Some(Gid(9)),
            label: Some("exc".to_string()),
        };
        StandardHeaderWriter
            .write_compatible_output(&path, &header)
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines[0], "# variable = spikes");
        assert_eq!(lines[1], "# columns = t id");
        assert_eq!(lines[2], "# dt = 0.1");
        assert!(lines.contains(&"# label = exc"));
        assert_eq!(*lines.last().unwrap(), "0.1\t3");
    }
}
