use ndext_registry::ExtRegistry;
use serde::Serialize;

use crate::cmd::support_name;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_rows, OutputFormat};

#[derive(Serialize)]
struct TagRow {
    tag: u8,
    element: &'static str,
    rank: usize,
    support: &'static str,
}

pub fn run(format: OutputFormat) -> CliResult<i32> {
    let rows = ExtRegistry::global()
        .entries()
        .into_iter()
        .map(|entry| TagRow {
            tag: entry.tag,
            element: entry.kind.element.name(),
            rank: entry.kind.rank.get(),
            support: support_name(entry.support),
        })
        .collect::<Vec<_>>();

    print_rows(
        &rows,
        vec!["TAG", "ELEMENT", "RANK", "SUPPORT"],
        |row| {
            vec![
                row.tag.to_string(),
                row.element.to_string(),
                row.rank.to_string(),
                row.support.to_string(),
            ]
        },
        format,
    );

    Ok(SUCCESS)
}
