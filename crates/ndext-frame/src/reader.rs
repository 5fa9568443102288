use std::io::{self, ErrorKind, Read};

use bytes::Bytes;
use tracing::debug;

use crate::array::NdArray;
use crate::codec::{decode_array, read_header, EnvelopeForm, Frame, FrameConfig};
use crate::element::Element;
use crate::error::{FrameError, Result};
use crate::shape::Rank;

/// Pulls array frames off a blocking byte stream, one at a time.
///
/// Each call reads exactly the bytes of one frame: the marker, then the rest
/// of the envelope header, then the declared body. Nothing past the frame is
/// consumed, so the stream can be handed to another reader between frames.
pub struct ArrayReader<R> {
    inner: R,
    config: FrameConfig,
}

impl<R: Read> ArrayReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    pub fn with_config(inner: R, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next frame.
    ///
    /// Returns `Ok(None)` when the stream ends on a frame boundary and
    /// `FrameError::ConnectionClosed` when it ends inside one. Body lengths
    /// above `max_payload_size` are rejected before any body byte is read.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut marker = [0u8; 1];
        match self.inner.read_exact(&mut marker) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(err) => return Err(FrameError::Io(err)),
        }

        let form =
            EnvelopeForm::from_marker(marker[0]).ok_or(FrameError::UnsupportedMarker(marker[0]))?;
        let mut header = vec![0u8; form.header_len()];
        header[0] = marker[0];
        self.inner
            .read_exact(&mut header[1..])
            .map_err(closed_on_eof)?;
        let header = read_header(&header)?;

        let max = self.config.max_payload_size;
        if header.len > max {
            return Err(FrameError::PayloadTooLarge {
                size: header.len,
                max,
            });
        }

        // Grows with the data actually received rather than the declared length.
        let mut body = Vec::new();
        (&mut self.inner)
            .take(header.len as u64)
            .read_to_end(&mut body)
            .map_err(FrameError::Io)?;
        if body.len() < header.len {
            return Err(FrameError::ConnectionClosed);
        }

        debug!(
            tag = header.tag,
            envelope = form.name(),
            bytes = header.len,
            "read extension frame"
        );
        Ok(Some(Frame::new(form, header.tag, Bytes::from(body))))
    }

    /// Read the next frame and decode its body as an array of `rank`.
    pub fn read_array<E: Element>(&mut self, rank: Rank) -> Result<Option<(u8, NdArray<E>)>> {
        let Some(frame) = self.next_frame()? else {
            return Ok(None);
        };
        let array = decode_array(rank, &frame.payload)?;
        Ok(Some((frame.tag, array)))
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

fn closed_on_eof(err: io::Error) -> FrameError {
    if err.kind() == ErrorKind::UnexpectedEof {
        FrameError::ConnectionClosed
    } else {
        FrameError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::{encode_array, EnvelopePolicy};

    fn compact() -> FrameConfig {
        FrameConfig {
            envelope: EnvelopePolicy::Compact,
            ..FrameConfig::default()
        }
    }

    /// Hands out at most `step` bytes per read.
    struct Trickle {
        bytes: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.bytes.len() - self.pos);
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn mixed_rank_stream() {
        let first = NdArray::Rank1(vec![7i32, -8, 9]);
        let second = NdArray::Rank2(vec![vec![0.5f64, 1.5], vec![2.5, 3.5], vec![4.5, 5.5]]);
        let third = NdArray::Rank3(vec![vec![vec![1i16, 2]], vec![vec![3, 4]]]);

        let mut wire = BytesMut::new();
        let cfg = FrameConfig::default();
        encode_array(41, &first, &cfg, &mut wire).unwrap();
        encode_array(22, &second, &cfg, &mut wire).unwrap();
        encode_array(33, &third, &cfg, &mut wire).unwrap();

        let mut reader = ArrayReader::new(Cursor::new(wire.to_vec()));
        assert_eq!(reader.read_array::<i32>(Rank::One).unwrap(), Some((41, first)));
        assert_eq!(reader.read_array::<f64>(Rank::Two).unwrap(), Some((22, second)));
        assert_eq!(reader.read_array::<i16>(Rank::Three).unwrap(), Some((33, third)));
        assert_eq!(reader.read_array::<i16>(Rank::One).unwrap(), None);
    }

    #[test]
    fn compact_frames_split_across_reads() {
        let scalar = NdArray::Rank1(vec![1.25f32]);
        let matrix = NdArray::Rank2(vec![vec![1i64, 2], vec![3, 4]]);

        let mut wire = BytesMut::new();
        assert_eq!(
            encode_array(11, &scalar, &compact(), &mut wire).unwrap(),
            EnvelopeForm::FixExt(4)
        );
        assert_eq!(
            encode_array(52, &matrix, &compact(), &mut wire).unwrap(),
            EnvelopeForm::Ext8
        );

        for step in [1, 2, 3, 7] {
            let mut reader = ArrayReader::new(Trickle {
                bytes: wire.to_vec(),
                pos: 0,
                step,
            });
            let frame = reader.next_frame().unwrap().unwrap();
            assert_eq!((frame.form, frame.tag), (EnvelopeForm::FixExt(4), 11));
            assert_eq!(
                reader.read_array::<i64>(Rank::Two).unwrap(),
                Some((52, matrix.clone()))
            );
            assert!(reader.next_frame().unwrap().is_none());
        }
    }

    #[test]
    fn stops_at_frame_boundary() {
        let mut wire = BytesMut::new();
        encode_array(41, &NdArray::Rank1(vec![1i32]), &FrameConfig::default(), &mut wire).unwrap();
        let frame_len = wire.len();
        wire.extend_from_slice(&[0x81, 0xA1, b'a', 0x01]);

        let mut reader = ArrayReader::new(Cursor::new(wire.to_vec()));
        reader.next_frame().unwrap().unwrap();

        let rest = reader.into_inner();
        assert_eq!(rest.position() as usize, frame_len);
    }

    #[test]
    fn eof_inside_frame_is_connection_closed() {
        let mut wire = BytesMut::new();
        encode_array(42, &NdArray::Rank2(vec![vec![1i32, 2]]), &FrameConfig::default(), &mut wire)
            .unwrap();

        // Cut inside the envelope header, then inside the body.
        for cut in [3, wire.len() - 1] {
            let mut reader = ArrayReader::new(Cursor::new(wire[..cut].to_vec()));
            assert!(matches!(
                reader.next_frame(),
                Err(FrameError::ConnectionClosed)
            ));
        }
    }

    #[test]
    fn oversized_length_rejected_before_body() {
        // Declares 1 MiB but carries no body.
        let wire = vec![0xC9, 0x00, 0x10, 0x00, 0x00, 41];
        let cfg = FrameConfig {
            max_payload_size: 1024,
            ..FrameConfig::default()
        };
        let mut reader = ArrayReader::with_config(Cursor::new(wire), cfg);
        assert!(matches!(
            reader.next_frame(),
            Err(FrameError::PayloadTooLarge {
                size: 0x0010_0000,
                max: 1024
            })
        ));
    }

    #[test]
    fn unsupported_marker() {
        let mut reader = ArrayReader::new(Cursor::new(vec![0x93, 1, 2, 3]));
        assert!(matches!(
            reader.next_frame(),
            Err(FrameError::UnsupportedMarker(0x93))
        ));
    }

    #[test]
    fn empty_column_header_is_rejected_not_allocated() {
        let wire = vec![0xC9, 0, 0, 0, 8, 42, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0];
        let mut reader = ArrayReader::new(Cursor::new(wire));
        assert!(matches!(
            reader.read_array::<i32>(Rank::Two),
            Err(FrameError::TooManyRows { .. })
        ));
    }
}
