use ndext_frame::{read_shape, strip_envelope};
use ndext_registry::ExtRegistry;
use serde::Serialize;

use crate::cmd::{support_name, InspectArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{format_dims, print_record, OutputFormat, Record};

#[derive(Serialize)]
struct InspectOutput {
    marker: String,
    envelope: &'static str,
    tag: u8,
    header_len: usize,
    body_len: usize,
    trailing: usize,
    kind: Option<String>,
    support: Option<&'static str>,
    dims: Option<Vec<u32>>,
}

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = args.input.read()?;
    let envelope = strip_envelope(&bytes).map_err(|err| frame_error("inspect failed", err))?;

    let entry = ExtRegistry::global().entry(envelope.tag);
    let dims = match entry {
        Some(entry) => {
            let kind = entry.kind;
            let shape = read_shape(kind.rank, kind.element.width(), envelope.payload)
                .map_err(|err| frame_error("inspect failed", err))?;
            Some(shape.dims().to_vec())
        }
        None => None,
    };

    let out = InspectOutput {
        marker: format!("0x{:02x}", envelope.form.marker()),
        envelope: envelope.form.name(),
        tag: envelope.tag,
        header_len: envelope.form.header_len(),
        body_len: envelope.payload.len(),
        trailing: bytes.len() - envelope.frame_len(),
        kind: entry.map(|entry| entry.kind.to_string()),
        support: entry.map(|entry| support_name(entry.support)),
        dims,
    };
    let unknown = || "unregistered".to_string();
    let fields = vec![
        ("marker", out.marker.clone()),
        ("envelope", out.envelope.to_string()),
        ("tag", out.tag.to_string()),
        ("header_len", out.header_len.to_string()),
        ("body_len", out.body_len.to_string()),
        ("trailing", out.trailing.to_string()),
        ("kind", out.kind.clone().unwrap_or_else(unknown)),
        (
            "support",
            out.support.map(str::to_string).unwrap_or_else(unknown),
        ),
        (
            "dims",
            out.dims
                .as_deref()
                .map(format_dims)
                .unwrap_or_else(unknown),
        ),
    ];
    print_record(
        &Record {
            body: &out,
            fields,
            raw: Some(envelope.payload),
        },
        format,
    );

    Ok(SUCCESS)
}
