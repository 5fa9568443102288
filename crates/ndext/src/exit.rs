use std::fmt;
use std::io;

use ndext_frame::FrameError;
use ndext_registry::RegistryError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(DATA_INVALID, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound | io::ErrorKind::InvalidInput => USAGE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::NotImplemented { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
        FrameError::EmptyInput
        | FrameError::TruncatedHeader { .. }
        | FrameError::TruncatedPayload { .. }
        | FrameError::UnsupportedMarker(_)
        | FrameError::PayloadTooLarge { .. }
        | FrameError::TooManyRows { .. }
        | FrameError::Ragged { .. }
        | FrameError::TrailingBytes(_) => CliError::invalid(format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn registry_error(context: &str, err: RegistryError) -> CliError {
    match err {
        RegistryError::Frame(err) => frame_error(context, err),
        RegistryError::UnknownTag(_) | RegistryError::Decode(_) => {
            CliError::invalid(format!("{context}: {err}"))
        }
        RegistryError::Unregistered(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndext_frame::{ElementKind, Rank};

    #[test]
    fn malformed_frames_map_to_data_invalid() {
        let err = frame_error("decode failed", FrameError::EmptyInput);
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.starts_with("decode failed: "));

        let err = frame_error("decode failed", FrameError::UnsupportedMarker(0x92));
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn unimplemented_kinds_map_to_failure() {
        let err = registry_error(
            "encode failed",
            RegistryError::Frame(FrameError::NotImplemented {
                element: ElementKind::Int16,
                rank: Rank::Three,
            }),
        );
        assert_eq!(err.code, FAILURE);
    }

    #[test]
    fn unknown_tag_maps_to_data_invalid() {
        let err = registry_error("decode failed", RegistryError::UnknownTag(99));
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.contains("99"));
    }

    #[test]
    fn missing_file_is_a_usage_error() {
        let err = io_error(
            "failed reading input.bin",
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        assert_eq!(err.code, USAGE);
    }
}
