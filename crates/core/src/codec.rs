//! Codec engine interface.
//!
//! The pipelines never touch a codec library directly. They drive a
//! [`Decoder`] on the input side and an [`Encoder`] on the output side,
//! writing into scratch buffers the pipeline owns:
//!
//! ```text
//! reassembled frame ──> Decoder::decode(input, &mut decoded) ──> CodecOutput
//! raw frame         ──> Encoder::encode(input, &mut encoded) ──> CodecOutput
//! ```
//!
//! [`CodecOutput::NoOutput`] is a normal result (encoder warming up, frame
//! intentionally dropped); only [`CodecError`] signals failure.

use crate::media::{AudioCodecInfo, VideoCodecInfo};

/// Parameters handed to a codec when it is opened.
#[derive(Debug, Clone, Copy)]
pub enum CodecParams<'a> {
    Video(&'a VideoCodecInfo),
    Audio(&'a AudioCodecInfo),
}

/// Result of one decode or encode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecOutput {
    /// Nothing was produced for this input.
    NoOutput,
    /// This many bytes were written to the output buffer.
    Produced(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("codec not open")]
    NotOpen,
    #[error("output buffer too small: need {needed} bytes, have {capacity}")]
    OutputTooSmall { needed: usize, capacity: usize },
    #[error("unsupported codec parameters: {0}")]
    Unsupported(String),
    #[error("{0}")]
    Failed(String),
}

/// Turns one whole encoded frame into raw media.
pub trait Decoder: Send {
    fn open(&mut self, params: CodecParams<'_>) -> Result<(), CodecError>;

    /// Decode `input` into `output`.
    fn decode(&mut self, input: &[u8], output: &mut [u8]) -> Result<CodecOutput, CodecError>;

    /// Release codec resources. Further calls fail until reopened.
    fn close(&mut self) {}
}

/// Turns one raw frame into encoded bytes.
pub trait Encoder: Send {
    fn open(&mut self, params: CodecParams<'_>) -> Result<(), CodecError>;

    /// Encode `input` into `output`.
    fn encode(&mut self, input: &[u8], output: &mut [u8]) -> Result<CodecOutput, CodecError>;

    fn close(&mut self) {}
}

/// Copies bytes through unchanged.
///
/// This is the PCM audio path (raw samples are their own encoding) and a
/// stand-in video codec for package-only relays and tests.
#[derive(Debug, Default)]
pub struct PassthroughCodec {
    open: bool,
}

impl PassthroughCodec {
    pub fn new() -> Self {
        Self::default()
    }

    fn copy(&self, input: &[u8], output: &mut [u8]) -> Result<CodecOutput, CodecError> {
        if !self.open {
            return Err(CodecError::NotOpen);
        }
        if input.is_empty() {
            return Ok(CodecOutput::NoOutput);
        }
        let capacity = output.len();
        let dst = output
            .get_mut(..input.len())
            .ok_or(CodecError::OutputTooSmall {
                needed: input.len(),
                capacity,
            })?;
        dst.copy_from_slice(input);
        Ok(CodecOutput::Produced(input.len()))
    }
}

impl Decoder for PassthroughCodec {
    fn open(&mut self, _params: CodecParams<'_>) -> Result<(), CodecError> {
        self.open = true;
        Ok(())
    }

    fn decode(&mut self, input: &[u8], output: &mut [u8]) -> Result<CodecOutput, CodecError> {
        self.copy(input, output)
    }

    fn close(&mut self) {
        self.open = false;
    }
}

impl Encoder for PassthroughCodec {
    fn open(&mut self, _params: CodecParams<'_>) -> Result<(), CodecError> {
        self.open = true;
        Ok(())
    }

    fn encode(&mut self, input: &[u8], output: &mut [u8]) -> Result<CodecOutput, CodecError> {
        self.copy(input, output)
    }

    fn close(&mut self) {
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened() -> PassthroughCodec {
        let mut codec = PassthroughCodec::new();
        Decoder::open(&mut codec, CodecParams::Audio(&AudioCodecInfo::default())).unwrap();
        codec
    }

    #[test]
    fn copies_input() {
        let mut codec = opened();
        let mut out = [0u8; 8];
        assert_eq!(
            codec.decode(&[1, 2, 3], &mut out).unwrap(),
            CodecOutput::Produced(3)
        );
        assert_eq!(&out[..3], &[1, 2, 3]);
    }

    #[test]
    fn empty_input_no_output() {
        let mut codec = opened();
        assert_eq!(
            codec.encode(&[], &mut [0u8; 4]).unwrap(),
            CodecOutput::NoOutput
        );
    }

    #[test]
    fn output_too_small() {
        let mut codec = opened();
        assert_eq!(
            codec.encode(&[0; 5], &mut [0u8; 4]).unwrap_err(),
            CodecError::OutputTooSmall {
                needed: 5,
                capacity: 4
            }
        );
    }

    #[test]
    fn closed_codec_fails() {
        let mut codec = opened();
        Decoder::close(&mut codec);
        assert_eq!(
            codec.decode(&[1], &mut [0u8; 4]).unwrap_err(),
            CodecError::NotOpen
        );
    }
}
