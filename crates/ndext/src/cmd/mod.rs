use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use ndext_frame::{ElementKind, EnvelopePolicy, FrameConfig, Rank};
use ndext_registry::{ExtRegistry, RegistryConfig, Support};

use crate::exit::{io_error, CliError, CliResult};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod inspect;
pub mod tags;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode a JSON nested list as an array extension frame.
    Encode(EncodeArgs),
    /// Decode an array extension frame (or a MessagePack document) to JSON.
    Decode(DecodeArgs),
    /// Describe a frame's envelope and dimension header without decoding it.
    Inspect(InspectArgs),
    /// List the registered extension tags.
    Tags,
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Inspect(args) => inspect::run(args, format),
        Command::Tags => tags::run(format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ElementArg {
    Float32,
    Float64,
    Int16,
    Int32,
    Int64,
}

impl From<ElementArg> for ElementKind {
    fn from(arg: ElementArg) -> Self {
        match arg {
            ElementArg::Float32 => ElementKind::Float32,
            ElementArg::Float64 => ElementKind::Float64,
            ElementArg::Int16 => ElementKind::Int16,
            ElementArg::Int32 => ElementKind::Int32,
            ElementArg::Int64 => ElementKind::Int64,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum EnvelopeArg {
    /// Always `ext 32` (0xC9).
    #[default]
    Ext32,
    /// Smallest `fixext`/`ext` form for the body size.
    Compact,
}

impl From<EnvelopeArg> for EnvelopePolicy {
    fn from(arg: EnvelopeArg) -> Self {
        match arg {
            EnvelopeArg::Ext32 => EnvelopePolicy::Ext32,
            EnvelopeArg::Compact => EnvelopePolicy::Compact,
        }
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Element type of the array.
    #[arg(long, short = 'k', value_name = "KIND")]
    pub kind: ElementArg,
    /// Array rank. Default: inferred from the JSON nesting depth.
    #[arg(long, short = 'r', value_parser = clap::value_parser!(u8).range(1..=3))]
    pub rank: Option<u8>,
    /// JSON nested list, e.g. '[[1,2],[3,4]]'.
    #[arg(long, conflicts_with = "file")]
    pub json: Option<String>,
    /// Read the JSON nested list from a file.
    #[arg(long, conflicts_with = "json")]
    pub file: Option<PathBuf>,
    /// Envelope form to emit.
    #[arg(long, value_name = "FORM", env = "NDEXT_ENVELOPE", default_value = "ext32")]
    pub envelope: EnvelopeArg,
}

impl EncodeArgs {
    pub fn rank(&self) -> Option<Rank> {
        self.rank.and_then(|rank| Rank::from_usize(rank.into()))
    }
}

/// Where frame bytes come from: a hex argument, a file, or stdin.
#[derive(Args, Debug)]
pub struct FrameInput {
    /// Frame bytes as hex (whitespace and a leading 0x are ignored).
    #[arg(value_name = "HEX", conflicts_with = "file")]
    pub hex: Option<String>,
    /// Read frame bytes from a file (raw binary or hex text).
    #[arg(long, conflicts_with = "hex")]
    pub file: Option<PathBuf>,
}

impl FrameInput {
    pub fn read(&self) -> CliResult<Vec<u8>> {
        if let Some(text) = &self.hex {
            return parse_hex(text);
        }
        let bytes = match &self.file {
            Some(path) => fs::read(path)
                .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?,
            None => read_stdin()?,
        };
        if looks_like_hex(&bytes) {
            let text = String::from_utf8_lossy(&bytes);
            return parse_hex(&text);
        }
        Ok(bytes)
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    #[command(flatten)]
    pub input: FrameInput,
    /// Treat the input as a MessagePack document and decode every array in it.
    #[arg(long)]
    pub document: bool,
    /// Fail on extension values with unregistered tags instead of skipping them.
    #[arg(long, requires = "document")]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: FrameInput,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn registry_for(envelope: EnvelopePolicy, fail_on_unknown_tag: bool) -> ExtRegistry {
    ExtRegistry::standard_with_config(RegistryConfig {
        frame: FrameConfig {
            envelope,
            ..FrameConfig::default()
        },
        fail_on_unknown_tag,
    })
}

pub fn support_name(support: Support) -> &'static str {
    match support {
        Support::Implemented => "implemented",
        Support::Unimplemented => "not-implemented",
    }
}

pub fn read_stdin() -> CliResult<Vec<u8>> {
    let mut buf = Vec::new();
    std::io::stdin()
        .read_to_end(&mut buf)
        .map_err(|err| io_error("failed reading stdin", err))?;
    Ok(buf)
}

fn looks_like_hex(bytes: &[u8]) -> bool {
    bytes.iter().any(u8::is_ascii_hexdigit)
        && bytes
            .iter()
            .all(|b| b.is_ascii_hexdigit() || b.is_ascii_whitespace())
}

pub fn parse_hex(text: &str) -> CliResult<Vec<u8>> {
    let compact: String = text.split_whitespace().collect();
    let digits = compact
        .strip_prefix("0x")
        .or_else(|| compact.strip_prefix("0X"))
        .unwrap_or(compact.as_str());
    hex::decode(digits).map_err(|err| CliError::usage(format!("input is not valid hex: {err}")))
}
