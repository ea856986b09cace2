use crate::clock::{Clock, SystemClock, rescale};
use crate::codec::{CodecError, CodecOutput, CodecParams, Encoder};
use crate::error::{Error, Result};
use crate::media::audio_level::audio_level;
use crate::media::rtp::{AudioLevelExtension, RtpHeader};
use crate::media::vp8::Vp8Fragmenter;
use crate::media::{
    AUDIO_PAYLOAD_TYPE, MediaInfo, MediaKind, ProcessorType, RawMediaPacket, VIDEO_CLOCK_RATE,
    VP8_PAYLOAD_TYPE,
};
use crate::sink::{RtpSink, SsrcSource};

use super::{PACKAGED_BUFFER_SIZE, UNPACKAGED_BUFFER_SIZE};

/// SSRC used when no [`SsrcSource`] is supplied.
pub const DEFAULT_SSRC: u32 = 55543;

/// Ceiling on one VP8 RTP payload (descriptor included), in bytes.
pub const DEFAULT_FRAGMENT_SIZE: usize = 1100;

/// Reference level passed to [`audio_level`] for 8-bit samples.
const AUDIO_LEVEL_OVERLOAD: u32 = 127;

/// Output-side configuration.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub video_payload_type: u8,
    pub audio_payload_type: u8,
    /// Maximum RTP payload per video packet.
    pub fragment_size: usize,
    /// SSRC stamped on packets when no [`SsrcSource`] is configured.
    pub default_ssrc: u32,
    pub video_clock_rate: u32,
    /// When set, audio packets carry an RFC 6464 audio level element with
    /// this one-byte extension ID. Must be 1 to 14 (RFC 8285 reserves 0 for
    /// padding and 15 as a terminator); checked by `init`.
    pub audio_level_extension: Option<u8>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            video_payload_type: VP8_PAYLOAD_TYPE,
            audio_payload_type: AUDIO_PAYLOAD_TYPE,
            fragment_size: DEFAULT_FRAGMENT_SIZE,
            default_ssrc: DEFAULT_SSRC,
            video_clock_rate: VIDEO_CLOCK_RATE,
            audio_level_extension: None,
        }
    }
}

/// 16-bit RTP sequence number, wrapping. One per media kind.
#[derive(Debug, Default)]
struct SequenceCounter {
    next: u16,
}

impl SequenceCounter {
    fn advance(&mut self) -> u16 {
        let seq = self.next;
        self.next = seq.wrapping_add(1);
        seq
    }
}

/// Encode raw frames and packetize them into RTP for an [`RtpSink`].
///
/// ```text
/// video: raw frame ─> Encoder ─> Vp8Fragmenter ─> RTP header per fragment ─> sink
/// audio: PCM chunk ─> (optional Encoder) ─> one RTP header ─> sink
/// ```
///
/// ## Header fields
///
/// - **Sequence number**: independent wrapping counters for video and
///   audio, reset only when a packager is (re)armed.
/// - **Timestamp**: video presentation timestamps are milliseconds
///   rescaled to the 90 kHz clock; a `pts` of exactly 0 means "absent" and
///   the wall clock is used instead. Audio timestamps are used verbatim.
/// - **Marker**: set on the last packet of each video frame, never on audio.
/// - **SSRC**: from the [`SsrcSource`] if one was supplied, else
///   [`OutputConfig::default_ssrc`].
pub struct OutputProcessor {
    info: MediaInfo,
    config: OutputConfig,
    sink: Box<dyn RtpSink>,
    ssrc_source: Option<Box<dyn SsrcSource>>,
    clock: Box<dyn Clock>,
    video_encoder: Option<Box<dyn Encoder>>,
    audio_encoder: Option<Box<dyn Encoder>>,
    video_encoder_open: bool,
    audio_encoder_open: bool,
    video_packager: Option<SequenceCounter>,
    audio_packager: Option<SequenceCounter>,
    encoded: Vec<u8>,
    encoded_audio: Vec<u8>,
    packaged: Vec<u8>,
    rtp: Vec<u8>,
}

impl OutputProcessor {
    pub fn new(info: MediaInfo, sink: Box<dyn RtpSink>) -> Self {
        Self::with_config(info, OutputConfig::default(), sink)
    }

    pub fn with_config(info: MediaInfo, config: OutputConfig, sink: Box<dyn RtpSink>) -> Self {
        Self {
            info,
            config,
            sink,
            ssrc_source: None,
            clock: Box::new(SystemClock),
            video_encoder: None,
            audio_encoder: None,
            video_encoder_open: false,
            audio_encoder_open: false,
            video_packager: None,
            audio_packager: None,
            encoded: Vec::new(),
            encoded_audio: Vec::new(),
            packaged: Vec::new(),
            rtp: Vec::new(),
        }
    }

    pub fn with_video_encoder(mut self, encoder: Box<dyn Encoder>) -> Self {
        self.video_encoder = Some(encoder);
        self
    }

    /// Encode audio before packaging. Without one, raw PCM is packaged as is.
    pub fn with_audio_encoder(mut self, encoder: Box<dyn Encoder>) -> Self {
        self.audio_encoder = Some(encoder);
        self
    }

    pub fn with_ssrc_source(mut self, source: Box<dyn SsrcSource>) -> Self {
        self.ssrc_source = Some(source);
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Allocate scratch buffers, open encoders and arm the packagers.
    ///
    /// With [`ProcessorType::PackageOnly`] both packagers are armed and no
    /// encoder is opened. Otherwise each media kind in the [`MediaInfo`] is
    /// armed once its encoder opens; a kind whose encoder fails stays
    /// disabled and its error is returned, while the other kind is still
    /// initialized. Calling `init` again closes and rearms everything.
    ///
    /// Fails with [`Error::InvalidConfig`] before arming anything if the
    /// audio level extension ID is outside 1 to 14.
    pub fn init(&mut self) -> Result<()> {
        self.close();

        if let Some(id) = self.config.audio_level_extension {
            if !(1..=14).contains(&id) {
                tracing::error!(id, "audio level extension ID out of range");
                return Err(Error::InvalidConfig(
                    "audio level extension ID must be 1 to 14",
                ));
            }
        }

        self.encoded = vec![0; UNPACKAGED_BUFFER_SIZE];
        self.packaged = Vec::with_capacity(self.config.fragment_size);
        self.rtp = Vec::with_capacity(PACKAGED_BUFFER_SIZE.max(self.config.fragment_size + 32));

        if self.info.processor_type == ProcessorType::PackageOnly {
            self.init_video_packager();
            self.init_audio_packager();
            tracing::info!("output processor initialized (package only)");
            return Ok(());
        }

        let mut first_error = None;

        if self.info.has_video {
            match self.video_encoder.as_mut() {
                Some(encoder) => match encoder.open(CodecParams::Video(&self.info.video)) {
                    Ok(()) => {
                        self.video_encoder_open = true;
                        self.init_video_packager();
                    }
                    Err(source) => {
                        tracing::error!(error = %source, "video encoder failed to open");
                        first_error.get_or_insert(Error::CodecInit {
                            kind: MediaKind::Video,
                            source,
                        });
                    }
                },
                None => {
                    tracing::error!("no video encoder configured");
                    first_error.get_or_insert(Error::CodecInit {
                        kind: MediaKind::Video,
                        source: CodecError::Unsupported("no video encoder configured".into()),
                    });
                }
            }
        }

        if self.info.has_audio {
            let opened = match self.audio_encoder.as_mut() {
                Some(encoder) => encoder.open(CodecParams::Audio(&self.info.audio)).map(|()| true),
                None => Ok(false),
            };
            match opened {
                Ok(has_encoder) => {
                    if has_encoder {
                        self.audio_encoder_open = true;
                        self.encoded_audio = vec![0; UNPACKAGED_BUFFER_SIZE];
                    }
                    self.init_audio_packager();
                }
                Err(source) => {
                    tracing::error!(error = %source, "audio encoder failed to open");
                    first_error.get_or_insert(Error::CodecInit {
                        kind: MediaKind::Audio,
                        source,
                    });
                }
            }
        }

        tracing::info!(
            video = self.video_packager.is_some(),
            audio = self.audio_packager.is_some(),
            "output processor initialized"
        );
        first_error.map_or(Ok(()), Err)
    }

    /// Arm the video packager and reset its sequence number to 0.
    pub fn init_video_packager(&mut self) {
        self.video_packager = Some(SequenceCounter::default());
        tracing::debug!("video packager armed");
    }

    /// Arm the audio packager and reset its sequence number to 0.
    pub fn init_audio_packager(&mut self) {
        self.audio_packager = Some(SequenceCounter::default());
        tracing::debug!("audio packager armed");
    }

    /// Encode (unless package-only) and packetize one frame.
    ///
    /// Returns the number of RTP packets emitted. An encoder that produces
    /// no output for the frame emits nothing and returns `Ok(0)`.
    pub fn on_raw_frame(&mut self, packet: &RawMediaPacket<'_>) -> Result<usize> {
        match packet.kind {
            MediaKind::Video => self.on_video_frame(packet),
            MediaKind::Audio => self.on_audio_frame(packet),
        }
    }

    fn on_video_frame(&mut self, packet: &RawMediaPacket<'_>) -> Result<usize> {
        if self.info.processor_type == ProcessorType::PackageOnly {
            return self.package_video(packet.data, packet.pts);
        }

        let Some(encoder) = self
            .video_encoder
            .as_deref_mut()
            .filter(|_| self.video_encoder_open)
        else {
            return Err(Error::NotInitialized(MediaKind::Video));
        };
        tracing::trace!(len = packet.len(), "encoding video");

        let len = encode(encoder, MediaKind::Video, packet.data, &mut self.encoded)?;
        if len == 0 {
            return Ok(0);
        }

        let encoded = std::mem::take(&mut self.encoded);
        let result = self.package_video(&encoded[..len], packet.pts);
        self.encoded = encoded;
        result
    }

    fn on_audio_frame(&mut self, packet: &RawMediaPacket<'_>) -> Result<usize> {
        if !self.audio_encoder_open {
            return self.package_audio(packet.data, packet.pts).map(|_| 1);
        }
        let Some(encoder) = self.audio_encoder.as_deref_mut() else {
            return Err(Error::NotInitialized(MediaKind::Audio));
        };

        let len = encode(
            encoder,
            MediaKind::Audio,
            packet.data,
            &mut self.encoded_audio,
        )?;
        if len == 0 {
            return Ok(0);
        }

        let encoded = std::mem::take(&mut self.encoded_audio);
        let result = self.package_audio(&encoded[..len], packet.pts);
        self.encoded_audio = encoded;
        result.map(|_| 1)
    }

    /// Fragment one encoded VP8 frame and send every fragment to the sink.
    ///
    /// `pts` is in milliseconds; 0 means "use the wall clock". All fragments
    /// share one timestamp and only the last carries the marker bit. Returns
    /// the number of packets sent; a sink error stops the frame and is
    /// returned without retrying.
    pub fn package_video(&mut self, frame: &[u8], pts: i64) -> Result<usize> {
        let Some(sequence) = self.video_packager.as_mut() else {
            tracing::debug!("video packager not initialized");
            return Err(Error::NotInitialized(MediaKind::Video));
        };
        if frame.is_empty() {
            return Ok(0);
        }

        let ssrc = self
            .ssrc_source
            .as_ref()
            .map_or(self.config.default_ssrc, |s| s.video_source_ssrc());
        let millis = if pts == 0 { self.clock.now_millis() } else { pts };
        let timestamp = rescale(millis, self.config.video_clock_rate as i64, 1000) as u32;

        let mut fragmenter = Vp8Fragmenter::new(frame, self.config.fragment_size);
        let mut sent = 0;
        while let Some(last) = fragmenter.next_packet(&mut self.packaged) {
            let header = RtpHeader {
                marker: last,
                payload_type: self.config.video_payload_type,
                sequence: sequence.advance(),
                timestamp,
                ssrc,
                extension: None,
            };
            self.rtp.clear();
            header.write_to(&mut self.rtp);
            self.rtp.extend_from_slice(&self.packaged);

            tracing::trace!(
                seq = header.sequence,
                marker = last,
                len = self.rtp.len(),
                "video packet"
            );
            self.sink.receive_rtp_data(&self.rtp)?;
            sent += 1;
        }

        tracing::debug!(
            frame_bytes = frame.len(),
            packets = sent,
            ts = timestamp,
            ssrc = format_args!("{:#010X}", ssrc),
            "video frame packaged"
        );
        Ok(sent)
    }

    /// Send one audio payload as a single RTP packet.
    ///
    /// The timestamp is `pts` verbatim (already in the audio clock) and the
    /// marker bit is never set. Returns the number of bytes sent.
    pub fn package_audio(&mut self, data: &[u8], pts: i64) -> Result<usize> {
        let Some(sequence) = self.audio_packager.as_mut() else {
            tracing::debug!("audio packager not initialized");
            return Err(Error::NotInitialized(MediaKind::Audio));
        };

        let ssrc = self
            .ssrc_source
            .as_ref()
            .map_or(self.config.default_ssrc, |s| s.audio_source_ssrc());
        let extension = self.config.audio_level_extension.map(|id| AudioLevelExtension {
            id,
            voice_activity: false,
            level: audio_level(data, 0, data.len(), AUDIO_LEVEL_OVERLOAD).unsigned_abs(),
        });
        let mut header = RtpHeader {
            marker: false,
            payload_type: self.config.audio_payload_type,
            sequence: 0,
            timestamp: pts as u32,
            ssrc,
            extension,
        };

        let len = header.len() + data.len();
        if len > PACKAGED_BUFFER_SIZE {
            tracing::warn!(len, max = PACKAGED_BUFFER_SIZE, "audio packet too large, dropped");
            return Err(Error::PacketTooLarge {
                len,
                max: PACKAGED_BUFFER_SIZE,
            });
        }
        header.sequence = sequence.advance();

        self.rtp.clear();
        header.write_to(&mut self.rtp);
        self.rtp.extend_from_slice(data);
        self.sink.receive_rtp_data(&self.rtp)?;

        tracing::trace!(seq = header.sequence, ts = header.timestamp, len, "audio packet");
        Ok(len)
    }

    /// Sequence number the next packet of `kind` will carry, if armed.
    pub fn next_sequence(&self, kind: MediaKind) -> Option<u16> {
        match kind {
            MediaKind::Video => self.video_packager.as_ref().map(|s| s.next),
            MediaKind::Audio => self.audio_packager.as_ref().map(|s| s.next),
        }
    }

    pub fn is_armed(&self, kind: MediaKind) -> bool {
        self.next_sequence(kind).is_some()
    }

    pub fn media_info(&self) -> &MediaInfo {
        &self.info
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Close encoders, disarm both packagers and release scratch buffers.
    ///
    /// Safe to call at any point between frames and more than once.
    pub fn close(&mut self) {
        let was_armed = self.video_packager.take().is_some() | self.audio_packager.take().is_some();

        if std::mem::take(&mut self.video_encoder_open) {
            if let Some(encoder) = self.video_encoder.as_mut() {
                encoder.close();
            }
        }
        if std::mem::take(&mut self.audio_encoder_open) {
            if let Some(encoder) = self.audio_encoder.as_mut() {
                encoder.close();
            }
        }

        self.encoded = Vec::new();
        self.encoded_audio = Vec::new();
        self.packaged = Vec::new();
        self.rtp = Vec::new();

        if was_armed {
            tracing::info!("output processor closed");
        }
    }
}

impl Drop for OutputProcessor {
    fn drop(&mut self) {
        self.close();
    }
}

/// Run `encoder`, mapping "nothing produced" to 0.
fn encode(
    encoder: &mut dyn Encoder,
    kind: MediaKind,
    input: &[u8],
    output: &mut [u8],
) -> Result<usize> {
    match encoder.encode(input, output) {
        Ok(CodecOutput::Produced(n)) => Ok(n.min(output.len())),
        Ok(CodecOutput::NoOutput) => {
            tracing::trace!(%kind, "encoder produced no output");
            Ok(0)
        }
        Err(source) => {
            tracing::warn!(%kind, error = %source, "encode failed, frame dropped");
            Err(Error::Codec { kind, source })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::codec::PassthroughCodec;
    use crate::media::rtp::RtpPacketView;

    type Packets = Arc<Mutex<Vec<Vec<u8>>>>;

    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now_millis(&self) -> i64 {
            self.0
        }
    }

    struct Source;

    impl SsrcSource for Source {
        fn audio_source_ssrc(&self) -> u32 {
            0xA0D10
        }
        fn video_source_ssrc(&self) -> u32 {
            0x71DE0
        }
    }

    /// Produces nothing for the first frame, like an encoder filling its
    /// lookahead.
    #[derive(Default)]
    struct WarmingEncoder {
        frames: usize,
    }

    impl Encoder for WarmingEncoder {
        fn open(&mut self, _params: CodecParams<'_>) -> std::result::Result<(), CodecError> {
            Ok(())
        }

        fn encode(
            &mut self,
            input: &[u8],
            output: &mut [u8],
        ) -> std::result::Result<CodecOutput, CodecError> {
            self.frames += 1;
            if self.frames == 1 {
                return Ok(CodecOutput::NoOutput);
            }
            output[..input.len()].copy_from_slice(input);
            Ok(CodecOutput::Produced(input.len()))
        }
    }

    fn armed(info: MediaInfo) -> (OutputProcessor, Packets) {
        let packets: Packets = Arc::default();
        let mut output = OutputProcessor::new(info, Box::new(packets.clone()))
            .with_video_encoder(Box::new(PassthroughCodec::new()))
            .with_clock(Box::new(FixedClock(2_000)));
        output.init().unwrap();
        (output, packets)
    }

    #[test]
    fn package_audio_header() {
        let (mut output, packets) = armed(MediaInfo::audio());
        let sent = output.package_audio(&[0x10; 160], 1000).unwrap();
        assert_eq!(sent, 172);

        let packets = packets.lock();
        assert_eq!(packets.len(), 1);
        let view = RtpPacketView::parse(&packets[0]).unwrap();
        assert_eq!(view.payload_type(), 111);
        assert!(!view.marker());
        assert_eq!(view.timestamp(), 1000);
        assert_eq!(view.sequence(), 0);
        assert_eq!(view.ssrc(), DEFAULT_SSRC);
        assert_eq!(view.payload(), &[0x10; 160]);
    }

    #[test]
    fn package_video_before_init() {
        let packets: Packets = Arc::default();
        let mut output = OutputProcessor::new(MediaInfo::video(64, 64), Box::new(packets.clone()));
        assert!(matches!(
            output.package_video(&[1, 2, 3], 1),
            Err(Error::NotInitialized(MediaKind::Video))
        ));
        assert!(matches!(
            output.package_audio(&[1], 1),
            Err(Error::NotInitialized(MediaKind::Audio))
        ));
        assert!(packets.lock().is_empty());
    }

    #[test]
    fn video_fragments_share_timestamp_and_mark_last() {
        let (mut output, packets) = armed(MediaInfo::video(64, 64));
        let sent = output.package_video(&[0xAB; 2500], 1000).unwrap();
        assert_eq!(sent, 3);

        let packets = packets.lock();
        let views: Vec<_> = packets
            .iter()
            .map(|p| RtpPacketView::parse(p).unwrap())
            .collect();
        assert_eq!(
            views.iter().map(|v| v.sequence()).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(
            views.iter().map(|v| v.marker()).collect::<Vec<_>>(),
            vec![false, false, true]
        );
        assert!(views.iter().all(|v| v.timestamp() == 90_000));
        assert!(views.iter().all(|v| v.payload_type() == 100));
        assert!(views.iter().all(|v| v.payload().len() <= DEFAULT_FRAGMENT_SIZE));
    }

    #[test]
    fn zero_pts_uses_wall_clock() {
        let (mut output, packets) = armed(MediaInfo::video(64, 64));
        output.package_video(&[1], 0).unwrap();
        let view_ts = RtpPacketView::parse(&packets.lock()[0]).unwrap().timestamp();
        assert_eq!(view_ts, 180_000);
    }

    #[test]
    fn sequence_counters_are_independent() {
        let (mut output, packets) = armed(MediaInfo::video(64, 64).with_audio());
        output.package_video(&[1], 10).unwrap();
        output.package_video(&[2], 20).unwrap();
        output.package_audio(&[3], 30).unwrap();
        assert_eq!(output.next_sequence(MediaKind::Video), Some(2));
        assert_eq!(output.next_sequence(MediaKind::Audio), Some(1));

        let seqs: Vec<(u8, u16)> = packets
            .lock()
            .iter()
            .map(|p| {
                let v = RtpPacketView::parse(p).unwrap();
                (v.payload_type(), v.sequence())
            })
            .collect();
        assert_eq!(seqs, vec![(100, 0), (100, 1), (111, 0)]);
    }

    #[test]
    fn sequence_wraps() {
        let (mut output, _) = armed(MediaInfo::audio());
        for _ in 0..=u16::MAX as u32 {
            output.package_audio(&[0], 0).unwrap();
        }
        assert_eq!(output.next_sequence(MediaKind::Audio), Some(0));
    }

    #[test]
    fn ssrc_from_source() {
        let packets: Packets = Arc::default();
        let mut output = OutputProcessor::new(
            MediaInfo::video(64, 64).with_audio().package_only(),
            Box::new(packets.clone()),
        )
        .with_ssrc_source(Box::new(Source));
        output.init().unwrap();
        output.package_video(&[1], 1).unwrap();
        output.package_audio(&[1], 1).unwrap();

        let packets = packets.lock();
        assert_eq!(RtpPacketView::parse(&packets[0]).unwrap().ssrc(), 0x71DE0);
        assert_eq!(RtpPacketView::parse(&packets[1]).unwrap().ssrc(), 0xA0D10);
    }

    #[test]
    fn encoder_without_output_emits_nothing() {
        let packets: Packets = Arc::default();
        let mut output = OutputProcessor::new(MediaInfo::video(64, 64), Box::new(packets.clone()))
            .with_video_encoder(Box::new(WarmingEncoder::default()));
        output.init().unwrap();

        let frame = [5u8; 100];
        assert_eq!(output.on_raw_frame(&RawMediaPacket::video(&frame, 40)).unwrap(), 0);
        assert!(packets.lock().is_empty());
        assert_eq!(output.on_raw_frame(&RawMediaPacket::video(&frame, 80)).unwrap(), 1);
        assert_eq!(packets.lock().len(), 1);
    }

    #[test]
    fn audio_frame_without_encoder_is_packaged_raw() {
        let (mut output, packets) = armed(MediaInfo::audio());
        let pcm = [0x42u8; 160];
        assert_eq!(output.on_raw_frame(&RawMediaPacket::audio(&pcm, 480)).unwrap(), 1);
        let packets = packets.lock();
        let view = RtpPacketView::parse(&packets[0]).unwrap();
        assert_eq!(view.payload(), &pcm);
        assert_eq!(view.timestamp(), 480);
    }

    #[test]
    fn audio_level_extension_hook() {
        let packets: Packets = Arc::default();
        let config = OutputConfig {
            audio_level_extension: Some(1),
            ..OutputConfig::default()
        };
        let mut output =
            OutputProcessor::with_config(MediaInfo::audio(), config, Box::new(packets.clone()));
        output.init().unwrap();
        output.package_audio(&[127; 160], 0).unwrap();
        output.package_audio(&[0; 160], 160).unwrap();

        let packets = packets.lock();
        let loud = RtpPacketView::parse(&packets[0]).unwrap();
        let silent = RtpPacketView::parse(&packets[1]).unwrap();
        assert_eq!(loud.audio_level(1).unwrap().level, 0);
        assert_eq!(silent.audio_level(1).unwrap().level, 127);
        assert_eq!(silent.payload(), &[0; 160]);
    }

    #[test]
    fn reserved_extension_ids_are_rejected() {
        for id in [0u8, 15, 200] {
            let config = OutputConfig {
                audio_level_extension: Some(id),
                ..OutputConfig::default()
            };
            let packets: Packets = Arc::default();
            let mut output =
                OutputProcessor::with_config(MediaInfo::audio(), config, Box::new(packets.clone()));
            assert!(matches!(output.init(), Err(Error::InvalidConfig(_))), "id {id}");
            assert!(!output.is_armed(MediaKind::Audio));
            assert!(packets.lock().is_empty());
        }

        let config = OutputConfig {
            audio_level_extension: Some(14),
            ..OutputConfig::default()
        };
        let mut output = OutputProcessor::with_config(
            MediaInfo::audio(),
            config,
            Box::new(Vec::<Vec<u8>>::new()),
        );
        assert!(output.init().is_ok());
    }

    #[test]
    fn oversized_audio_is_rejected() {
        let (mut output, packets) = armed(MediaInfo::audio());
        let err = output.package_audio(&[0; 2000], 0).unwrap_err();
        assert!(matches!(err, Error::PacketTooLarge { len: 2012, .. }));
        assert!(packets.lock().is_empty());
        assert_eq!(output.next_sequence(MediaKind::Audio), Some(0));
    }

    #[test]
    fn missing_video_encoder_keeps_audio() {
        let packets: Packets = Arc::default();
        let mut output = OutputProcessor::new(
            MediaInfo::video(64, 64).with_audio(),
            Box::new(packets.clone()),
        );
        assert!(matches!(
            output.init(),
            Err(Error::CodecInit {
                kind: MediaKind::Video,
                ..
            })
        ));
        assert!(!output.is_armed(MediaKind::Video));
        assert!(output.is_armed(MediaKind::Audio));
        assert!(output.package_audio(&[1], 1).is_ok());
    }

    #[test]
    fn close_disarms() {
        let (mut output, _) = armed(MediaInfo::video(64, 64));
        output.close();
        assert!(matches!(
            output.package_video(&[1], 1),
            Err(Error::NotInitialized(MediaKind::Video))
        ));
        output.init().unwrap();
        assert_eq!(output.next_sequence(MediaKind::Video), Some(0));
    }
}
