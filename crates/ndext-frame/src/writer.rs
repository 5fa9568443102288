use std::io::Write;

use bytes::BytesMut;
use tracing::debug;

use crate::array::NdArray;
use crate::codec::{encode_array, strip_envelope, EnvelopeForm, FrameConfig};
use crate::element::Element;
use crate::error::{FrameError, Result};

/// Pushes array frames onto a blocking byte stream.
///
/// A frame is encoded in full before any byte reaches the stream, so an
/// encode error (ragged input, oversized body) never leaves a partial frame
/// behind. Writes are not flushed per frame; call [`ArrayWriter::flush`].
pub struct ArrayWriter<W> {
    inner: W,
    buf: BytesMut,
    config: FrameConfig,
}

impl<W: Write> ArrayWriter<W> {
    pub fn new(inner: W) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    pub fn with_config(inner: W, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::new(),
            config,
        }
    }

    /// Encode `array` under `tag` and write it, returning the envelope form used.
    pub fn write_array<E: Element>(&mut self, tag: u8, array: &NdArray<E>) -> Result<EnvelopeForm> {
        self.buf.clear();
        let form = encode_array(tag, array, &self.config, &mut self.buf)?;
        self.inner.write_all(&self.buf)?;
        debug!(tag, envelope = form.name(), bytes = self.buf.len(), "wrote array frame");
        Ok(form)
    }

    /// Write a frame that was already encoded, e.g. by a tag registry.
    ///
    /// `frame` must hold exactly one complete frame.
    pub fn write_encoded(&mut self, frame: &[u8]) -> Result<EnvelopeForm> {
        let envelope = strip_envelope(frame)?;
        if envelope.frame_len() != frame.len() {
            return Err(FrameError::TrailingBytes(frame.len() - envelope.frame_len()));
        }
        if envelope.payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: envelope.payload.len(),
                max: self.config.max_payload_size,
            });
        }
        self.inner.write_all(frame)?;
        Ok(envelope.form)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
