use crate::clock::rescale;
use crate::codec::{CodecError, CodecOutput, CodecParams, Decoder, PassthroughCodec};
use crate::error::{Error, Result};
use crate::media::rtp::RtpPacketView;
use crate::media::vp8::{Depacketizer, Vp8Depacketizer};
use crate::media::{AUDIO_PAYLOAD_TYPE, MediaInfo, MediaKind, RawMediaPacket, VIDEO_CLOCK_RATE, VP8_PAYLOAD_TYPE};
use crate::sink::RawDataSink;

use super::UNPACKAGED_BUFFER_SIZE;
use super::reassembly::{FrameAssembler, ReassemblyState};

/// Input-side configuration.
#[derive(Debug, Clone)]
pub struct InputConfig {
    /// Payload type accepted on the video stream.
    pub video_payload_type: u8,
    /// Payload type accepted on the audio stream.
    pub audio_payload_type: u8,
    /// Upper bound on one reassembled encoded video frame, in bytes.
    pub reassembly_capacity: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            video_payload_type: VP8_PAYLOAD_TYPE,
            audio_payload_type: AUDIO_PAYLOAD_TYPE,
            reassembly_capacity: UNPACKAGED_BUFFER_SIZE,
        }
    }
}

/// What happened to one inbound packet that was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Fragment stored; the frame is not complete yet.
    Pending,
    /// The frame completed but the decoder produced nothing for it.
    NoOutput,
    /// A decoded frame of this many bytes was delivered to the sink.
    Delivered(usize),
}

#[derive(Debug)]
struct VideoBuffers {
    assembler: FrameAssembler,
    decoded: Vec<u8>,
}

/// Depacketize, reassemble and decode inbound RTP, delivering whole raw
/// frames to a [`RawDataSink`].
///
/// ```text
/// RTP bytes ─> parse ─> PT check ─> depacketize ─> reassemble ─(marker)─> decode ─> sink
/// ```
///
/// Video payloads are VP8 fragments accumulated until the packet with the
/// marker bit; audio payloads are complete units and skip reassembly.
/// Scratch buffers are allocated by [`init`](Self::init) and reused for
/// every packet.
///
/// Every error returned by [`on_packet`](Self::on_packet) is local to that
/// packet or frame; the processor keeps accepting packets afterwards.
pub struct InputProcessor {
    info: MediaInfo,
    config: InputConfig,
    sink: Box<dyn RawDataSink>,
    video_decoder: Option<Box<dyn Decoder>>,
    audio_decoder: Box<dyn Decoder>,
    depacketizer: Box<dyn Depacketizer>,
    video: Option<VideoBuffers>,
    audio: Option<Vec<u8>>,
}

impl InputProcessor {
    /// Create a processor delivering to `sink`.
    ///
    /// Audio defaults to PCM passthrough and video to the VP8 depacketizer;
    /// a video decoder must be supplied with
    /// [`with_video_decoder`](Self::with_video_decoder) before
    /// [`init`](Self::init) if `info.has_video` is set.
    pub fn new(info: MediaInfo, sink: Box<dyn RawDataSink>) -> Self {
        Self::with_config(info, InputConfig::default(), sink)
    }

    pub fn with_config(info: MediaInfo, config: InputConfig, sink: Box<dyn RawDataSink>) -> Self {
        Self {
            info,
            config,
            sink,
            video_decoder: None,
            audio_decoder: Box::new(PassthroughCodec::new()),
            depacketizer: Box::new(Vp8Depacketizer),
            video: None,
            audio: None,
        }
    }

    pub fn with_video_decoder(mut self, decoder: Box<dyn Decoder>) -> Self {
        self.video_decoder = Some(decoder);
        self
    }

    pub fn with_audio_decoder(mut self, decoder: Box<dyn Decoder>) -> Self {
        self.audio_decoder = decoder;
        self
    }

    pub fn with_depacketizer(mut self, depacketizer: Box<dyn Depacketizer>) -> Self {
        self.depacketizer = depacketizer;
        self
    }

    /// Open the decoders and allocate scratch buffers for every media kind
    /// in the [`MediaInfo`].
    ///
    /// A kind whose decoder fails to open stays disabled and its error is
    /// returned; the other kind is still initialized. Calling `init` again
    /// closes and reopens everything.
    pub fn init(&mut self) -> Result<()> {
        self.close();
        let mut first_error = None;

        if self.info.has_video {
            if let Err(e) = self.open_video() {
                tracing::error!(error = %e, "video input disabled");
                first_error.get_or_insert(e);
            }
        }

        if self.info.has_audio {
            match self.audio_decoder.open(CodecParams::Audio(&self.info.audio)) {
                Ok(()) => self.audio = Some(vec![0; UNPACKAGED_BUFFER_SIZE]),
                Err(source) => {
                    tracing::error!(error = %source, "audio input disabled");
                    first_error.get_or_insert(Error::CodecInit {
                        kind: MediaKind::Audio,
                        source,
                    });
                }
            }
        }

        tracing::info!(
            video = self.video.is_some(),
            audio = self.audio.is_some(),
            "input processor initialized"
        );
        first_error.map_or(Ok(()), Err)
    }

    fn open_video(&mut self) -> Result<()> {
        let decoder = self.video_decoder.as_mut().ok_or(Error::CodecInit {
            kind: MediaKind::Video,
            source: CodecError::Unsupported("no video decoder configured".into()),
        })?;
        decoder
            .open(CodecParams::Video(&self.info.video))
            .map_err(|source| Error::CodecInit {
                kind: MediaKind::Video,
                source,
            })?;

        let frame_size = self.info.video.frame_size();
        tracing::debug!(
            width = self.info.video.width,
            height = self.info.video.height,
            frame_size,
            reassembly_capacity = self.config.reassembly_capacity,
            "video input buffers allocated"
        );
        self.video = Some(VideoBuffers {
            assembler: FrameAssembler::with_capacity(self.config.reassembly_capacity),
            decoded: vec![0; frame_size],
        });
        Ok(())
    }

    /// Feed one inbound RTP packet of the given media kind.
    ///
    /// Rejected packets leave reassembly state untouched, except on
    /// [`Error::ReassemblyOverflow`], which discards the frame in progress.
    /// When a frame completes it is decoded and, if the decoder produced
    /// output, delivered synchronously to the sink before this returns.
    pub fn on_packet(&mut self, packet: &[u8], kind: MediaKind) -> Result<Delivery> {
        let view = RtpPacketView::parse(packet).map_err(|e| {
            tracing::warn!(%kind, len = packet.len(), error = %e, "dropping malformed packet");
            Error::MalformedPacket(e)
        })?;

        match kind {
            MediaKind::Video => self.on_video(&view),
            MediaKind::Audio => self.on_audio(&view),
        }
    }

    fn on_video(&mut self, view: &RtpPacketView<'_>) -> Result<Delivery> {
        let (Some(video), Some(decoder)) = (self.video.as_mut(), self.video_decoder.as_deref_mut())
        else {
            return Err(Error::NotInitialized(MediaKind::Video));
        };
        check_payload_type(view, self.config.video_payload_type)?;

        let fragment = self.depacketizer.depacketize(view.payload()).map_err(|e| {
            tracing::warn!(seq = view.sequence(), error = %e, "dropping undecodable VP8 payload");
            Error::Depacketize(e)
        })?;

        if !video.assembler.push(fragment, view.marker())? {
            return Ok(Delivery::Pending);
        }

        let pts = rescale(view.timestamp() as i64, 1000, VIDEO_CLOCK_RATE as i64);
        let VideoBuffers { assembler, decoded } = video;
        let sink = self.sink.as_mut();
        assembler.finish(|frame| {
            tracing::debug!(len = frame.len(), ts = view.timestamp(), "video frame reassembled");
            decode_and_deliver(decoder, sink, MediaKind::Video, frame, decoded, pts)
        })
    }

    fn on_audio(&mut self, view: &RtpPacketView<'_>) -> Result<Delivery> {
        let Some(decoded) = self.audio.as_mut() else {
            return Err(Error::NotInitialized(MediaKind::Audio));
        };
        check_payload_type(view, self.config.audio_payload_type)?;

        decode_and_deliver(
            self.audio_decoder.as_mut(),
            self.sink.as_mut(),
            MediaKind::Audio,
            view.payload(),
            decoded,
            view.timestamp() as i64,
        )
    }

    /// Reassembly state of the video stream, or `None` if video is disabled.
    pub fn reassembly_state(&self) -> Option<ReassemblyState> {
        self.video.as_ref().map(|v| v.assembler.state())
    }

    pub fn is_enabled(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Video => self.video.is_some(),
            MediaKind::Audio => self.audio.is_some(),
        }
    }

    pub fn media_info(&self) -> &MediaInfo {
        &self.info
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    /// Close the decoders and release scratch buffers.
    ///
    /// Safe to call at any point between packets and more than once.
    /// Afterwards [`on_packet`](Self::on_packet) fails with
    /// [`Error::NotInitialized`] until [`init`](Self::init) is called again.
    pub fn close(&mut self) {
        let had_video = self.video.take().is_some();
        let had_audio = self.audio.take().is_some();
        if had_video {
            if let Some(decoder) = self.video_decoder.as_mut() {
                decoder.close();
            }
        }
        if had_audio {
            self.audio_decoder.close();
        }
        if had_video || had_audio {
            tracing::info!("input processor closed");
        }
    }
}

impl Drop for InputProcessor {
    fn drop(&mut self) {
        self.close();
    }
}

fn check_payload_type(view: &RtpPacketView<'_>, expected: u8) -> Result<()> {
    let payload_type = view.payload_type();
    if payload_type != expected {
        tracing::warn!(
            payload_type,
            expected,
            seq = view.sequence(),
            "dropping packet with unsupported payload type"
        );
        return Err(Error::UnsupportedPayloadType {
            payload_type,
            expected,
        });
    }
    Ok(())
}

fn decode_and_deliver(
    decoder: &mut dyn Decoder,
    sink: &mut dyn RawDataSink,
    kind: MediaKind,
    input: &[u8],
    output: &mut [u8],
    pts: i64,
) -> Result<Delivery> {
    match decoder.decode(input, output) {
        Ok(CodecOutput::Produced(n)) if n > 0 => {
            let n = n.min(output.len());
            sink.receive_raw_data(&RawMediaPacket {
                kind,
                data: &output[..n],
                pts,
            });
            tracing::trace!(%kind, len = n, pts, "raw frame delivered");
            Ok(Delivery::Delivered(n))
        }
        Ok(_) => {
            tracing::debug!(%kind, input = input.len(), "decoder produced no output");
            Ok(Delivery::NoOutput)
        }
        Err(source) => {
            tracing::warn!(%kind, input = input.len(), error = %source, "decode failed, frame dropped");
            Err(Error::Codec { kind, source })
        }
    }
}
