use std::fs;

use ndext_frame::{strip_envelope, ElementKind};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cmd::{read_stdin, registry_for, EncodeArgs};
use crate::exit::{frame_error, io_error, registry_error, CliError, CliResult, SUCCESS};
use crate::json::array_from_json;
use crate::output::{format_dims, print_record, OutputFormat, Record};

#[derive(Serialize)]
struct EncodeOutput {
    kind: String,
    rank: usize,
    dims: Vec<u32>,
    tag: u8,
    envelope: &'static str,
    size: usize,
    hex: String,
}

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let json = resolve_json(&args)?;
    let kind = ElementKind::from(args.kind);
    let value = array_from_json(kind, args.rank(), &json)?;

    let registry = registry_for(args.envelope.into(), false);
    let frame = registry
        .encode(&value)
        .map_err(|err| registry_error("encode failed", err))?;
    let shape = value
        .shape()
        .map_err(|err| frame_error("encode failed", err))?;
    let envelope = strip_envelope(&frame).map_err(|err| frame_error("encode failed", err))?;
    debug!(kind = %value.kind(), tag = envelope.tag, size = frame.len(), "encoded array");

    let out = EncodeOutput {
        kind: kind.name().to_string(),
        rank: shape.rank().get(),
        dims: shape.dims().to_vec(),
        tag: envelope.tag,
        envelope: envelope.form.name(),
        size: frame.len(),
        hex: hex::encode(&frame),
    };
    let fields = vec![
        ("kind", out.kind.clone()),
        ("rank", out.rank.to_string()),
        ("dims", format_dims(&out.dims)),
        ("tag", out.tag.to_string()),
        ("envelope", out.envelope.to_string()),
        ("size", out.size.to_string()),
        ("hex", out.hex.clone()),
    ];
    print_record(
        &Record {
            body: &out,
            fields,
            raw: Some(&frame[..]),
        },
        format,
    );

    Ok(SUCCESS)
}

fn resolve_json(args: &EncodeArgs) -> CliResult<Value> {
    let text = if let Some(json) = &args.json {
        json.clone()
    } else if let Some(path) = &args.file {
        fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?
    } else {
        let bytes = read_stdin()?;
        String::from_utf8(bytes).map_err(|_| CliError::usage("stdin is not valid UTF-8"))?
    };
    serde_json::from_str(&text)
        .map_err(|err| CliError::usage(format!("input is not valid JSON: {err}")))
}
