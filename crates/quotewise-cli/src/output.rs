use std::io::{self, Write};

use serde_json::Value;

use crate::cli::OutputFormat;
use crate::commands::CommandResult;
use crate::error::CliError;

pub fn render(result: &CommandResult, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_result(&mut out, result, format, pretty)?;
    out.flush()?;
    Ok(())
}

fn write_result<W: Write>(
    out: &mut W,
    result: &CommandResult,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => match result.rows.as_slice() {
            [single] => writeln!(out, "{}", single.payload.to_json_string(pretty)?)?,
            rows => {
                let array = Value::Array(rows.iter().map(|row| row.payload.to_value()).collect());
                let payload = if pretty {
                    serde_json::to_string_pretty(&array)?
                } else {
                    serde_json::to_string(&array)?
                };
                writeln!(out, "{payload}")?;
            }
        },
        OutputFormat::Ndjson => {
            for row in &result.rows {
                writeln!(out, "{}", row.payload.to_json_string(false)?)?;
            }
        }
        OutputFormat::Table => write_table(out, result)?,
    }

    Ok(())
}

fn write_table<W: Write>(out: &mut W, result: &CommandResult) -> io::Result<()> {
    let mut widths: Vec<usize> = result.headers.iter().map(|h| h.len()).collect();
    for row in &result.rows {
        for (width, cell) in widths.iter_mut().zip(&row.cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let headers: Vec<String> = result.headers.iter().map(|h| (*h).to_owned()).collect();
    write_line(out, &headers, &widths)?;
    for row in &result.rows {
        write_line(out, &row.cells, &widths)?;
    }
    Ok(())
}

fn write_line<W: Write>(out: &mut W, cells: &[String], widths: &[usize]) -> io::Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(out, "{}", line.trim_end())
}
