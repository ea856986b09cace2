//! Media descriptions, raw frame hand-off and RTP payload formats.
//!
//! This module holds the data types shared by both pipeline directions and
//! the codec-specific payload handling they compose:
//!
//! - [`rtp`]: the RTP fixed header (RFC 3550 §5.1) and a borrowed packet view.
//! - [`vp8`]: VP8 payload descriptor parsing and frame fragmentation (RFC 7741).
//! - [`audio_level`]: RMS-to-dBov loudness for the RFC 6464 header extension.
//!
//! ## Payload types
//!
//! | Media | PT  | Clock  | Payload format |
//! |-------|-----|--------|----------------|
//! | Video | 100 | 90 kHz | VP8, fragmented across packets |
//! | Audio | 111 | codec  | one unit per packet (PCM by default) |

pub mod audio_level;
pub mod rtp;
pub mod vp8;

use std::fmt;

/// Dynamic payload type carrying VP8 video.
pub const VP8_PAYLOAD_TYPE: u8 = 100;

/// Dynamic payload type carrying audio. Negotiation may substitute the real
/// value downstream.
pub const AUDIO_PAYLOAD_TYPE: u8 = 111;

/// RTP clock rate for video (RFC 7741 §6.1).
pub const VIDEO_CLOCK_RATE: u32 = 90_000;

/// Which media stream a packet or frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    Vp8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    /// Unsigned 8-bit linear PCM.
    PcmU8,
    Opus,
}

/// Video codec parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoCodecInfo {
    pub codec: VideoCodec,
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub bit_rate: u32,
}

impl VideoCodecInfo {
    /// Size in bytes of one planar 4:2:0 frame at this resolution.
    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * 3 / 2
    }
}

impl Default for VideoCodecInfo {
    fn default() -> Self {
        Self {
            codec: VideoCodec::Vp8,
            width: 640,
            height: 480,
            frame_rate: 30,
            bit_rate: 1_000_000,
        }
    }
}

/// Audio codec parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioCodecInfo {
    pub codec: AudioCodec,
    pub sample_rate: u32,
    pub bit_rate: u32,
    pub channels: u8,
}

impl Default for AudioCodecInfo {
    fn default() -> Self {
        Self {
            codec: AudioCodec::PcmU8,
            sample_rate: 44_100,
            bit_rate: 64_000,
            channels: 1,
        }
    }
}

/// How much of the pipeline an output processor runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessorType {
    /// Encode raw frames, then packetize.
    #[default]
    Full,
    /// Frames arrive already encoded; only the packagers are armed.
    PackageOnly,
}

/// Declares which media a pipeline carries and with which parameters.
///
/// Fixed once a processor is constructed; scratch buffers are sized from it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaInfo {
    pub has_video: bool,
    pub has_audio: bool,
    pub video: VideoCodecInfo,
    pub audio: AudioCodecInfo,
    pub processor_type: ProcessorType,
}

impl MediaInfo {
    /// Video only, at the given resolution.
    pub fn video(width: u32, height: u32) -> Self {
        Self {
            has_video: true,
            video: VideoCodecInfo {
                width,
                height,
                ..VideoCodecInfo::default()
            },
            ..Self::default()
        }
    }

    /// Audio only, with default PCM parameters.
    pub fn audio() -> Self {
        Self {
            has_audio: true,
            ..Self::default()
        }
    }

    pub fn with_audio(mut self) -> Self {
        self.has_audio = true;
        self
    }

    pub fn package_only(mut self) -> Self {
        self.processor_type = ProcessorType::PackageOnly;
        self
    }
}

/// One whole raw (or, for packaging, encoded) media frame.
///
/// The data borrows the producer's buffer and is only valid for the
/// duration of the call it is passed to; consumers that need it longer
/// must copy it.
#[derive(Debug, Clone, Copy)]
pub struct RawMediaPacket<'a> {
    pub kind: MediaKind,
    pub data: &'a [u8],
    /// Presentation timestamp: milliseconds for video, the audio clock for
    /// audio. Zero means "absent" on the output side.
    pub pts: i64,
}

impl<'a> RawMediaPacket<'a> {
    pub fn video(data: &'a [u8], pts: i64) -> Self {
        Self {
            kind: MediaKind::Video,
            data,
            pts,
        }
    }

    pub fn audio(data: &'a [u8], pts: i64) -> Self {
        Self {
            kind: MediaKind::Audio,
            data,
            pts,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
