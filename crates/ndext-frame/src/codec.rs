use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::array::NdArray;
use crate::element::{unpack, Element};
use crate::error::{FrameError, Result};
use crate::flatten::{flatten, unflatten};
use crate::shape::{Rank, Shape};

/// `ext 8` marker: 1-byte length, 1-byte tag.
pub const EXT8: u8 = 0xC7;
/// `ext 16` marker: 2-byte big-endian length, 1-byte tag.
pub const EXT16: u8 = 0xC8;
/// `ext 32` marker: 4-byte big-endian length, 1-byte tag.
pub const EXT32: u8 = 0xC9;
/// `fixext 1` marker; `fixext 2/4/8/16` follow at 0xD5..=0xD8.
pub const FIXEXT1: u8 = 0xD4;
/// `fixext 16` marker.
pub const FIXEXT16: u8 = 0xD8;

/// Default maximum payload size: 64 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024 * 1024;

/// The envelope sub-format selected by a frame's marker byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeForm {
    Ext8,
    Ext16,
    Ext32,
    /// Fixed payload length of 1, 2, 4, 8 or 16 bytes with no length field.
    FixExt(u8),
}

impl EnvelopeForm {
    /// Recognize a marker byte.
    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            EXT8 => Some(EnvelopeForm::Ext8),
            EXT16 => Some(EnvelopeForm::Ext16),
            EXT32 => Some(EnvelopeForm::Ext32),
            FIXEXT1..=FIXEXT16 => Some(EnvelopeForm::FixExt(1 << (marker - FIXEXT1))),
            _ => None,
        }
    }

    pub fn marker(self) -> u8 {
        match self {
            EnvelopeForm::Ext8 => EXT8,
            EnvelopeForm::Ext16 => EXT16,
            EnvelopeForm::Ext32 => EXT32,
            EnvelopeForm::FixExt(len) => FIXEXT1 + len.trailing_zeros() as u8,
        }
    }

    /// Bytes in front of the payload: marker, length field and tag.
    pub fn header_len(self) -> usize {
        match self {
            EnvelopeForm::Ext8 => 3,
            EnvelopeForm::Ext16 => 4,
            EnvelopeForm::Ext32 => 6,
            EnvelopeForm::FixExt(_) => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EnvelopeForm::Ext8 => "ext 8",
            EnvelopeForm::Ext16 => "ext 16",
            EnvelopeForm::Ext32 => "ext 32",
            EnvelopeForm::FixExt(1) => "fixext 1",
            EnvelopeForm::FixExt(2) => "fixext 2",
            EnvelopeForm::FixExt(4) => "fixext 4",
            EnvelopeForm::FixExt(8) => "fixext 8",
            EnvelopeForm::FixExt(_) => "fixext 16",
        }
    }

    /// Smallest form able to carry `len` payload bytes.
    pub fn compact_for(len: usize) -> Self {
        match len {
            1 | 2 | 4 | 8 | 16 => EnvelopeForm::FixExt(len as u8),
            0..=0xFF => EnvelopeForm::Ext8,
            0x100..=0xFFFF => EnvelopeForm::Ext16,
            _ => EnvelopeForm::Ext32,
        }
    }
}

/// Which envelope the encoder emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopePolicy {
    /// Always `ext 32`, whatever the payload size. Wire-compatible default.
    #[default]
    Ext32,
    /// Smallest `fixext`/`ext` form for the payload size.
    Compact,
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Envelope form selection for encoding. Default: `ext 32` only.
    pub envelope: EnvelopePolicy,
    /// Maximum frame body size in bytes. Default: 64 MiB.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            envelope: EnvelopePolicy::default(),
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

/// A borrowed view of one extension frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    pub form: EnvelopeForm,
    pub tag: u8,
    /// The frame body: dimension header (rank 2/3) followed by element bytes.
    pub payload: &'a [u8],
}

impl Envelope<'_> {
    /// Total bytes the frame occupies in its buffer.
    pub fn frame_len(&self) -> usize {
        self.form.header_len() + self.payload.len()
    }
}

/// An owned extension frame, as produced by the stream reader.
#[derive(Debug, Clone)]
pub struct Frame {
    pub form: EnvelopeForm,
    pub tag: u8,
    pub payload: Bytes,
}

impl Frame {
    /// Create a frame that will be written with the given envelope form.
    pub fn new(form: EnvelopeForm, tag: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            form,
            tag,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        self.form.header_len() + self.payload.len()
    }

    /// Borrow as an [`Envelope`].
    pub fn envelope(&self) -> Envelope<'_> {
        Envelope {
            form: self.form,
            tag: self.tag,
            payload: self.payload.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Header {
    pub(crate) form: EnvelopeForm,
    pub(crate) tag: u8,
    pub(crate) len: usize,
}

pub(crate) fn read_header(data: &[u8]) -> Result<Header> {
    let Some(&marker) = data.first() else {
        return Err(FrameError::EmptyInput);
    };
    let form = EnvelopeForm::from_marker(marker).ok_or(FrameError::UnsupportedMarker(marker))?;

    let needed = form.header_len();
    if data.len() < needed {
        return Err(FrameError::TruncatedHeader {
            context: form.name(),
            needed,
            available: data.len(),
        });
    }

    let mut header = &data[1..needed];
    let len = match form {
        EnvelopeForm::Ext8 => header.get_u8() as usize,
        EnvelopeForm::Ext16 => header.get_u16() as usize,
        EnvelopeForm::Ext32 => header.get_u32() as usize,
        EnvelopeForm::FixExt(len) => len as usize,
    };
    let tag = header.get_u8();

    Ok(Header { form, tag, len })
}

/// Strip the extension envelope from `data`, exposing the tag and body.
///
/// Accepts every `ext`/`fixext` form even though the default encoder only
/// produces `ext 32`. Bytes past the declared length are left alone.
pub fn strip_envelope(data: &[u8]) -> Result<Envelope<'_>> {
    let header = read_header(data)?;
    let start = header.form.header_len();
    let available = data.len() - start;
    if available < header.len {
        return Err(FrameError::TruncatedPayload {
            declared: header.len,
            available,
        });
    }

    Ok(Envelope {
        form: header.form,
        tag: header.tag,
        payload: &data[start..start + header.len],
    })
}

/// Write an envelope header for a `len`-byte body.
///
/// Returns the form that was written.
pub fn write_envelope(
    tag: u8,
    len: usize,
    policy: EnvelopePolicy,
    dst: &mut BytesMut,
) -> Result<EnvelopeForm> {
    if len > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: len,
            max: u32::MAX as usize,
        });
    }

    let form = match policy {
        EnvelopePolicy::Ext32 => EnvelopeForm::Ext32,
        EnvelopePolicy::Compact => EnvelopeForm::compact_for(len),
    };

    dst.reserve(form.header_len() + len);
    dst.put_u8(form.marker());
    match form {
        EnvelopeForm::Ext8 => dst.put_u8(len as u8),
        EnvelopeForm::Ext16 => dst.put_u16(len as u16),
        EnvelopeForm::Ext32 => dst.put_u32(len as u32),
        EnvelopeForm::FixExt(_) => {}
    }
    dst.put_u8(tag);
    Ok(form)
}

/// Encode an opaque extension body into the wire format.
///
/// Wire format (`ext 32`):
/// ```text
/// ┌────────┬──────────────┬───────┬──────────────────┐
/// │ 0xC9   │ Length       │ Tag   │ Body             │
/// │ (1B)   │ (4B BE)      │ (1B)  │ (Length bytes)   │
/// └────────┴──────────────┴───────┴──────────────────┘
/// ```
pub fn encode_frame(
    tag: u8,
    payload: &[u8],
    policy: EnvelopePolicy,
    dst: &mut BytesMut,
) -> Result<EnvelopeForm> {
    let form = write_envelope(tag, payload.len(), policy, dst)?;
    dst.put_slice(payload);
    Ok(form)
}

/// Decode one frame from the front of a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    let header = match read_header(src) {
        Ok(header) => header,
        Err(FrameError::EmptyInput | FrameError::TruncatedHeader { .. }) => return Ok(None),
        Err(err) => return Err(err),
    };

    if header.len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: header.len,
            max: max_payload,
        });
    }

    let header_len = header.form.header_len();
    if src.len() < header_len + header.len {
        return Ok(None);
    }

    src.advance(header_len);
    let payload = src.split_to(header.len).freeze();

    Ok(Some(Frame {
        form: header.form,
        tag: header.tag,
        payload,
    }))
}

/// Encode a typed array as a complete extension frame.
///
/// Wire format (rank 3 shown; rank 2 drops `Dim2`, rank 1 has no dims):
/// ```text
/// ┌──────┬──────────┬─────┬──────────┬──────────┬──────────┬──────────────────┐
/// │ 0xC9 │ Length   │ Tag │ Dim0     │ Dim1     │ Dim2     │ Elements         │
/// │      │ (4B BE)  │     │ (4B LE)  │ (4B LE)  │ (4B LE)  │ (row-major, LE)  │
/// └──────┴──────────┴─────┴──────────┴──────────┴──────────┴──────────────────┘
/// ```
/// `Length` covers the dimension header and the elements.
pub fn encode_array<T: Element>(
    tag: u8,
    array: &NdArray<T>,
    config: &FrameConfig,
    dst: &mut BytesMut,
) -> Result<EnvelopeForm> {
    let shape = array.shape()?;
    let rank = shape.rank();
    let elements_len = shape.payload_len(T::WIDTH)?;
    let body_len = rank.header_len() + elements_len;
    if body_len > config.max_payload_size {
        return Err(FrameError::PayloadTooLarge {
            size: body_len,
            max: config.max_payload_size,
        });
    }

    let form = write_envelope(tag, body_len, config.envelope, dst)?;
    if rank != Rank::One {
        for &dim in shape.dims() {
            dst.put_u32_le(dim);
        }
    }

    let start = dst.len();
    dst.resize(start + elements_len, 0);
    flatten(array, &mut dst[start..])?;

    trace!(
        tag,
        kind = %T::KIND,
        rank = %rank,
        dims = %shape,
        bytes = body_len,
        envelope = form.name(),
        "encoded array frame"
    );
    Ok(form)
}

/// Encode a typed array into a freshly allocated frame.
pub fn marshal<T: Element>(tag: u8, array: &NdArray<T>, config: &FrameConfig) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    encode_array(tag, array, config, &mut buf)?;
    Ok(buf.freeze())
}

/// Read the declared shape from the front of a frame body.
///
/// Rank 2/3 sizes come from the dimension header; a rank 1 length is
/// implied by the body size and the element `width`.
pub fn read_shape(rank: Rank, width: usize, body: &[u8]) -> Result<Shape> {
    if rank == Rank::One {
        return Ok(Shape::rank1((body.len() / width) as u32));
    }

    let needed = rank.header_len();
    if body.len() < needed {
        return Err(FrameError::TruncatedHeader {
            context: "dimension",
            needed,
            available: body.len(),
        });
    }

    let mut header = &body[..needed];
    Ok(match rank {
        Rank::Two => Shape::rank2(header.get_u32_le(), header.get_u32_le()),
        _ => Shape::rank3(
            header.get_u32_le(),
            header.get_u32_le(),
            header.get_u32_le(),
        ),
    })
}

/// Decode a frame body (envelope already stripped) as an array of `rank`.
///
/// Rank 1 bodies hold `len / width` elements; a trailing partial element is
/// ignored.
pub fn decode_array<T: Element>(rank: Rank, body: &[u8]) -> Result<NdArray<T>> {
    if rank == Rank::One {
        return Ok(NdArray::Rank1(unpack(body, body.len() / T::WIDTH)?));
    }

    let shape = read_shape(rank, T::WIDTH, body)?;
    let array = unflatten(&shape, &body[rank.header_len()..])?;
    trace!(kind = %T::KIND, rank = %rank, dims = %shape, "decoded array frame");
    Ok(array)
}

/// Strip the envelope from `frame` and decode it as an array of `rank`.
///
/// Returns the frame's extension tag alongside the array.
pub fn unmarshal<T: Element>(rank: Rank, frame: &[u8]) -> Result<(u8, NdArray<T>)> {
    let envelope = strip_envelope(frame)?;
    let array = decode_array(rank, envelope.payload)?;
    Ok((envelope.tag, array))
}
