use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rtpmedia::processor::{DEFAULT_FRAGMENT_SIZE, OutputConfig};
use rtpmedia::transport::UdpSink;
use rtpmedia::{
    InputProcessor, MediaInfo, MediaKind, OutputProcessor, PassthroughCodec, RawDataSink,
    RawMediaPacket, RtpSink, audio_level,
};

type SharedPackets = Arc<parking_lot::Mutex<Vec<Vec<u8>>>>;

#[derive(Parser)]
#[command(name = "rtp-media", about = "RTP VP8/PCM media pipeline tools")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Packetize synthetic video frames and reassemble them again
    Loopback {
        /// Number of frames to push through
        #[arg(long, default_value_t = 30)]
        frames: usize,
        /// Bytes per frame
        #[arg(long, default_value_t = 4096, value_parser = clap::value_parser!(u32).range(1..))]
        frame_size: u32,
        /// Maximum RTP payload per packet
        #[arg(long, default_value_t = DEFAULT_FRAGMENT_SIZE)]
        fragment_size: usize,
        /// Also send every packet to this UDP address (host:port)
        #[arg(long)]
        send_to: Option<String>,
    },
    /// Print the RFC 6464 audio level of a file of unsigned 8-bit samples
    Level {
        file: PathBuf,
        /// Sample value treated as full scale
        #[arg(long, default_value_t = 127)]
        overload: u32,
    },
}

/// Keeps every packet for reassembly and optionally forwards it over UDP.
struct Tee {
    packets: SharedPackets,
    udp: Option<UdpSink>,
}

impl RtpSink for Tee {
    fn receive_rtp_data(&mut self, packet: &[u8]) -> rtpmedia::Result<()> {
        self.packets.lock().push(packet.to_vec());
        if let Some(udp) = self.udp.as_mut() {
            udp.receive_rtp_data(packet)?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct LastFrame(Option<Vec<u8>>);

impl RawDataSink for LastFrame {
    fn receive_raw_data(&mut self, packet: &RawMediaPacket<'_>) {
        self.0 = Some(packet.data.to_vec());
    }
}

fn loopback(
    frames: usize,
    frame_size: usize,
    fragment_size: usize,
    send_to: Option<String>,
) -> rtpmedia::Result<usize> {
    let udp = send_to.map(UdpSink::bind).transpose()?;
    if let Some(udp) = &udp {
        tracing::info!(peer = %udp.peer(), "forwarding packets");
    }

    // 4:2:0 frame large enough for the synthetic payload
    let side = ((frame_size as f64 / 1.5).sqrt().ceil() as u32).max(2);
    let info = MediaInfo::video(side, side);

    let packets = SharedPackets::default();
    let config = OutputConfig {
        fragment_size,
        ..OutputConfig::default()
    };
    let mut output = OutputProcessor::with_config(
        info.clone(),
        config,
        Box::new(Tee {
            packets: packets.clone(),
            udp,
        }),
    )
    .with_video_encoder(Box::new(PassthroughCodec::new()));
    output.init()?;

    let received = Arc::new(parking_lot::Mutex::new(LastFrame::default()));
    let mut input = InputProcessor::new(info, Box::new(received.clone()))
        .with_video_decoder(Box::new(PassthroughCodec::new()));
    input.init()?;

    let mut total_packets = 0;
    let mut matched = 0;
    for i in 0..frames {
        let frame: Vec<u8> = (0..frame_size).map(|b| (b + i) as u8).collect();
        let pts = (i as i64 + 1) * 33;
        output.on_raw_frame(&RawMediaPacket::video(&frame, pts))?;

        let sent = std::mem::take(&mut *packets.lock());
        total_packets += sent.len();
        for packet in &sent {
            input.on_packet(packet, MediaKind::Video)?;
        }

        match received.lock().0.take() {
            Some(data) if data == frame => matched += 1,
            Some(data) => tracing::warn!(frame = i, len = data.len(), "frame mismatch"),
            None => tracing::warn!(frame = i, "frame not delivered"),
        }
    }

    println!(
        "{matched}/{frames} frames reassembled intact, {total_packets} packets (fragment size {fragment_size})"
    );
    Ok(frames - matched)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    match args.command {
        Command::Loopback {
            frames,
            frame_size,
            fragment_size,
            send_to,
        } => match loopback(frames, frame_size as usize, fragment_size, send_to) {
            Ok(0) => ExitCode::SUCCESS,
            Ok(_) => ExitCode::FAILURE,
            Err(e) => {
                eprintln!("Loopback failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Command::Level { file, overload } => {
            let samples = match std::fs::read(&file) {
                Ok(samples) => samples,
                Err(e) => {
                    eprintln!("Failed to read {}: {}", file.display(), e);
                    return ExitCode::FAILURE;
                }
            };
            let level = audio_level(&samples[..], 0, samples.len(), overload);
            println!("{} dBov ({} samples)", level, samples.len());
            ExitCode::SUCCESS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_frame_size_is_a_usage_error() {
        let err = Args::try_parse_from(["rtp-media", "loopback", "--frame-size", "0"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn loopback_defaults() {
        let args = Args::try_parse_from(["rtp-media", "loopback"]).unwrap();
        match args.command {
            Command::Loopback {
                frames,
                frame_size,
                fragment_size,
                send_to,
            } => {
                assert_eq!(frames, 30);
                assert_eq!(frame_size, 4096);
                assert_eq!(fragment_size, DEFAULT_FRAGMENT_SIZE);
                assert!(send_to.is_none());
            }
            Command::Level { .. } => panic!("expected loopback"),
        }
    }

    #[test]
    fn single_byte_frames_round_trip() {
        assert_eq!(loopback(3, 1, DEFAULT_FRAGMENT_SIZE, None).unwrap(), 0);
    }
}
