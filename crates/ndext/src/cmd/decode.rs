use ndext_frame::strip_envelope;
use ndext_registry::{from_slice, ArrayValue, ExtRegistry};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cmd::{registry_for, DecodeArgs};
use crate::exit::{frame_error, registry_error, CliResult, SUCCESS};
use crate::json::array_to_json;
use crate::output::{format_dims, print_record, print_rows, OutputFormat, Record};

#[derive(Serialize)]
struct DecodeOutput {
    tag: u8,
    envelope: &'static str,
    kind: String,
    rank: usize,
    dims: Vec<u32>,
    data: Value,
}

#[derive(Serialize)]
struct DocumentArray {
    path: String,
    kind: String,
    rank: usize,
    dims: Vec<u32>,
    data: Value,
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = args.input.read()?;
    let registry = registry_for(Default::default(), args.strict);
    if args.document {
        return run_document(&registry, &bytes, format);
    }

    let envelope = strip_envelope(&bytes).map_err(|err| frame_error("decode failed", err))?;
    let trailing = bytes.len() - envelope.frame_len();
    if trailing > 0 {
        warn!(trailing, "ignoring bytes after the frame");
    }
    let value = registry
        .decode_body(envelope.tag, envelope.payload)
        .map_err(|err| registry_error("decode failed", err))?;
    let dims = dims_of(&value)?;
    debug!(tag = envelope.tag, kind = %value.kind(), "decoded array");

    let out = DecodeOutput {
        tag: envelope.tag,
        envelope: envelope.form.name(),
        kind: value.element().name().to_string(),
        rank: value.rank().get(),
        dims,
        data: array_to_json(&value),
    };
    let fields = vec![
        ("tag", out.tag.to_string()),
        ("envelope", out.envelope.to_string()),
        ("kind", out.kind.clone()),
        ("rank", out.rank.to_string()),
        ("dims", format_dims(&out.dims)),
        ("data", out.data.to_string()),
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

fn run_document(registry: &ExtRegistry, bytes: &[u8], format: OutputFormat) -> CliResult<i32> {
    let document = from_slice(bytes).map_err(|err| registry_error("decode failed", err))?;
    let arrays = registry
        .extract_arrays(&document)
        .map_err(|err| registry_error("decode failed", err))?;
    debug!(count = arrays.len(), "decoded document arrays");

    let rows = arrays
        .into_iter()
        .map(|(path, value)| {
            Ok(DocumentArray {
                path,
                kind: value.element().name().to_string(),
                rank: value.rank().get(),
                dims: dims_of(&value)?,
                data: array_to_json(&value),
            })
        })
        .collect::<CliResult<Vec<_>>>()?;

    print_rows(
        &rows,
        vec!["PATH", "KIND", "DIMS", "DATA"],
        |row| {
            vec![
                row.path.clone(),
                row.kind.clone(),
                format_dims(&row.dims),
                row.data.to_string(),
            ]
        },
        format,
    );

    Ok(SUCCESS)
}

fn dims_of(value: &ArrayValue) -> CliResult<Vec<u32>> {
    let shape = value
        .shape()
        .map_err(|err| frame_error("decode failed", err))?;
    Ok(shape.dims().to_vec())
}
