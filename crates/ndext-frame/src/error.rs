use crate::element::ElementKind;
use crate::shape::Rank;

/// Errors that can occur while packing, framing, or parsing array frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A header was required but the buffer was empty.
    #[error("invalid data: empty buffer")]
    EmptyInput,

    /// The declared length or dimension header could not be read.
    #[error("truncated {context} header: need {needed} bytes, have {available}")]
    TruncatedHeader {
        context: &'static str,
        needed: usize,
        available: usize,
    },

    /// The declared payload length runs past the end of the buffer.
    #[error("truncated payload: declared {declared} bytes, have {available}")]
    TruncatedPayload { declared: usize, available: usize },

    /// The first byte is not one of the recognized extension markers.
    #[error("unsupported extension format marker: 0x{0:02X}")]
    UnsupportedMarker(u8),

    /// No encode/decode routine exists for this element kind and rank.
    #[error("{element} rank {rank} arrays are not implemented")]
    NotImplemented { element: ElementKind, rank: Rank },

    /// A caller-supplied buffer is shorter than the packed values require.
    #[error("buffer too small ({available} bytes, need {needed})")]
    BufferTooSmall { needed: usize, available: usize },

    /// Dimensions with a zero extent describe more nested rows than the
    /// frame body can account for.
    #[error("{count} nested rows exceed the limit of {max} for this frame")]
    TooManyRows { count: usize, max: usize },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Bytes follow a buffer that must hold exactly one frame.
    #[error("{0} unexpected bytes after the frame")]
    TrailingBytes(usize),

    /// Sibling sequences at the same depth have different lengths.
    #[error("ragged array at depth {depth}: expected length {expected}, found {found}")]
    Ragged {
        depth: usize,
        expected: usize,
        found: usize,
    },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
