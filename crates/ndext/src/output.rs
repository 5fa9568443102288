use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// A single command result, rendered according to the output format.
///
/// `fields` drives the table and pretty renderings; `raw` is written verbatim
/// for [`OutputFormat::Raw`] and falls back to pretty when absent.
pub struct Record<'a, T: Serialize> {
    pub body: &'a T,
    pub fields: Vec<(&'static str, String)>,
    pub raw: Option<&'a [u8]>,
}

pub fn print_record<T: Serialize>(record: &Record<'_, T>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(record.body),
        OutputFormat::Table => {
            let mut table = new_table(vec!["FIELD", "VALUE"]);
            for (name, value) in &record.fields {
                table.add_row(vec![name.to_string(), value.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Raw => match record.raw {
            Some(bytes) => print_raw(bytes),
            None => print_pretty(&record.fields),
        },
        OutputFormat::Pretty => print_pretty(&record.fields),
    }
}

fn print_pretty(fields: &[(&'static str, String)]) {
    let line = fields
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(" ");
    println!("{line}");
}

/// Print rows of a listing. JSON emits one array; other formats share a table.
pub fn print_rows<T: Serialize>(
    rows: &[T],
    header: Vec<&'static str>,
    cells: impl Fn(&T) -> Vec<String>,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            let mut table = new_table(header);
            for row in rows {
                table.add_row(cells(row));
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for row in rows {
                let line = header
                    .iter()
                    .zip(cells(row))
                    .map(|(name, value)| format!("{}={value}", name.to_lowercase()))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("{line}");
            }
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn format_dims(dims: &[u32]) -> String {
    let inner = dims
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    if dims.len() == 1 {
        format!("({inner},)")
    } else {
        format!("({inner})")
    }
}

fn new_table(header: Vec<&'static str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}
