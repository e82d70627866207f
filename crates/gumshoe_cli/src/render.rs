use std::io::{self, Write};

use clap::ValueEnum;
use gumshoe::{ArtifactReport, ArtifactTable, DeviceReport, Diagnostic};
use serde::Serialize;

use crate::error::CliError;

const COLUMN_GAP: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned plain-text tables.
    Table,
    /// One pretty-printed JSON document.
    Json,
}

/// Everything one invocation collected, in the order it is printed.
#[derive(Debug, Default, Serialize)]
pub struct Output {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_info: Option<DeviceReport>,
    pub reports: Vec<ArtifactReport>,
}

impl Output {
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.device_info
            .iter()
            .flat_map(|device| device.diagnostics.iter())
            .chain(self.reports.iter().flat_map(|r| r.diagnostics.iter()))
    }

    pub fn write(&self, format: OutputFormat, out: &mut impl Write) -> Result<(), CliError> {
        match format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, self)?;
                writeln!(out)?;
            }
            OutputFormat::Table => {
                if let Some(device) = self.device_info.as_ref() {
                    write_table(out, &device.table())?;
                    writeln!(out)?;
                }
                for report in &self.reports {
                    writeln!(out, "*** {} ***", report.artifact.title())?;
                    writeln!(out)?;
                    for table in &report.tables {
                        write_table(out, table)?;
                        writeln!(out)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Writes `output` to stdout; in table mode diagnostics follow on stderr.
pub fn print(output: &Output, format: OutputFormat) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    output.write(format, &mut out)?;
    out.flush()?;

    if format == OutputFormat::Table {
        for diagnostic in output.diagnostics() {
            eprintln!("skipped {diagnostic}");
        }
    }
    Ok(())
}

/// Caption, header row, dashed rule, then one line per record.
pub fn write_table(out: &mut impl Write, table: &ArtifactTable) -> io::Result<()> {
    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for record in &table.records {
        for (width, field) in widths.iter_mut().zip(record.fields()) {
            *width = (*width).max(field.chars().count());
        }
    }

    writeln!(out, "{}", table.caption)?;
    write_row(out, &widths, table.headers.iter())?;
    write_row(out, &widths, widths.iter().map(|w| "-".repeat(*w)))?;
    if table.records.is_empty() {
        writeln!(out, "(none)")?;
    }
    for record in &table.records {
        write_row(out, &widths, record.fields())?;
    }
    Ok(())
}

fn write_row<S: AsRef<str>>(
    out: &mut impl Write,
    widths: &[usize],
    cells: impl IntoIterator<Item = S>,
) -> io::Result<()> {
    let mut line = String::new();
    for (index, (cell, width)) in cells.into_iter().zip(widths).enumerate() {
        if index > 0 {
            line.push_str(COLUMN_GAP);
        }
        let cell = cell.as_ref();
        line.push_str(cell);
        let pad = width.saturating_sub(cell.chars().count());
        line.extend(std::iter::repeat(' ').take(pad));
    }
    writeln!(out, "{}", line.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gumshoe::{collect, ArtifactType};

    fn render(table: &ArtifactTable) -> String {
        let mut buf = Vec::new();
        write_table(&mut buf, table).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn columns_align_to_the_widest_cell() {
        let raw = r#"{"values":{"Café Wi-Fi":{"value":{"added_by":"iPad"},"timestamp":631152000}}}"#;
        let report = collect(ArtifactType::WifiHistory, raw).unwrap();
        let text = render(&report.tables[0]);
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "Known Wi-Fi networks");
        assert_eq!(
            lines[1],
            "SSID        ADDED BY  OS VERSION     ADDED AT (UTC)"
        );
        assert_eq!(
            lines[2],
            "----------  --------  -------------  --------------------------------"
        );
        assert_eq!(
            lines[3],
            "Café Wi-Fi  iPad      Not Available  Jan 01 2021 00:00:00  (Estimate)"
        );
    }

    #[test]
    fn empty_tables_say_so() {
        let report = collect(ArtifactType::LocationHistory, r#"{"values":{}}"#).unwrap();
        let text = render(&report.tables[0]);
        assert!(text.ends_with("(none)\n"), "{text}");
    }

    #[test]
    fn json_output_omits_missing_device_info() {
        let report = collect(ArtifactType::LocationHistory, r#"{"values":{}}"#).unwrap();
        let output = Output {
            device_info: None,
            reports: vec![report],
        };
        let mut buf = Vec::new();
        output.write(OutputFormat::Json, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert!(value.get("device_info").is_none());
        assert_eq!(value["reports"][0]["artifact"], "location-history");
    }
}
