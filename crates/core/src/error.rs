//! Error types for the media pipeline.

use std::fmt;

use crate::codec::CodecError;
use crate::media::MediaKind;
use crate::media::vp8::DepacketizeError;

/// Errors reported by the input and output pipelines.
///
/// Every per-packet or per-frame variant is local: the pipeline that
/// returned it keeps serving subsequent packets.
///
/// - **Inbound**: [`MalformedPacket`](Self::MalformedPacket),
///   [`UnsupportedPayloadType`](Self::UnsupportedPayloadType),
///   [`Depacketize`](Self::Depacketize),
///   [`ReassemblyOverflow`](Self::ReassemblyOverflow).
/// - **Codec**: [`Codec`](Self::Codec) per frame,
///   [`CodecInit`](Self::CodecInit) at init time.
/// - **Setup**: [`InvalidConfig`](Self::InvalidConfig).
/// - **Outbound**: [`NotInitialized`](Self::NotInitialized),
///   [`PacketTooLarge`](Self::PacketTooLarge), [`Io`](Self::Io).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The RTP header could not be parsed. The packet was dropped.
    #[error("malformed RTP packet: {0}")]
    MalformedPacket(ParseErrorKind),

    /// The payload type does not match the one configured for the media kind.
    #[error("unsupported payload type {payload_type} (expected {expected})")]
    UnsupportedPayloadType { payload_type: u8, expected: u8 },

    /// The codec-specific payload descriptor was rejected.
    #[error("depacketize failed: {0}")]
    Depacketize(#[from] DepacketizeError),

    /// Appending a fragment would exceed the reassembly buffer. The
    /// in-progress frame was discarded.
    #[error("reassembly overflow: frame needs {needed} bytes, capacity is {capacity}")]
    ReassemblyOverflow { needed: usize, capacity: usize },

    /// The codec rejected a frame. The frame was dropped.
    #[error("{kind} codec failed: {source}")]
    Codec {
        kind: MediaKind,
        #[source]
        source: CodecError,
    },

    /// The codec could not be opened; this media kind stays disabled.
    #[error("{kind} codec could not be opened: {source}")]
    CodecInit {
        kind: MediaKind,
        #[source]
        source: CodecError,
    },

    /// The pipeline for this media kind is not armed (never initialized,
    /// disabled at init, or closed).
    #[error("{0} pipeline not initialized")]
    NotInitialized(MediaKind),

    /// A configuration value is out of range. Reported by `init`.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// An outbound packet would not fit the RTP send buffer.
    #[error("RTP packet of {len} bytes exceeds send buffer of {max}")]
    PacketTooLarge { len: usize, max: usize },

    /// Underlying I/O or socket error from a sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ParseErrorKind> for Error {
    fn from(kind: ParseErrorKind) -> Self {
        Self::MalformedPacket(kind)
    }
}

/// Specific kind of RTP header parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Fewer bytes than the 12-byte fixed header.
    TooShort,
    /// Version field was not 2.
    UnsupportedVersion(u8),
    /// CSRC list, header extension or padding runs past the end of the packet.
    Truncated,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort => write!(f, "packet shorter than fixed header"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported RTP version {v}"),
            Self::Truncated => write!(f, "header truncated"),
        }
    }
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
