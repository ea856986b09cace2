//! Output pipeline over a real loopback UDP socket into an input pipeline.

use std::net::UdpSocket;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use rtpmedia::transport::UdpSink;
use rtpmedia::{
    InputProcessor, MediaInfo, MediaKind, OutputProcessor, PassthroughCodec, RawDataSink,
    RawMediaPacket,
};

#[derive(Default)]
struct Frames(Vec<Vec<u8>>);

impl RawDataSink for Frames {
    fn receive_raw_data(&mut self, packet: &RawMediaPacket<'_>) {
        self.0.push(packet.data.to_vec());
    }
}

#[test]
fn video_frame_over_loopback_udp() {
    let receiver = UdpSocket::bind("127.0.0.1:0").expect("bind receiver");
    receiver
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let sink = UdpSink::bind(receiver.local_addr().unwrap()).expect("bind sink");

    let mut output = OutputProcessor::new(MediaInfo::video(160, 120), Box::new(sink))
        .with_video_encoder(Box::new(PassthroughCodec::new()));
    output.init().unwrap();

    let frames = Arc::new(Mutex::new(Frames::default()));
    let mut input = InputProcessor::new(MediaInfo::video(160, 120), Box::new(frames.clone()))
        .with_video_decoder(Box::new(PassthroughCodec::new()));
    input.init().unwrap();

    let frame: Vec<u8> = (0..4000u32).map(|i| (i * 7 % 256) as u8).collect();
    let sent = output
        .on_raw_frame(&RawMediaPacket::video(&frame, 1000))
        .unwrap();
    assert_eq!(sent, 4);

    let mut buf = [0u8; 2048];
    for _ in 0..sent {
        let (n, _) = receiver.recv_from(&mut buf).expect("recv RTP packet");
        input.on_packet(&buf[..n], MediaKind::Video).unwrap();
    }

    let frames = frames.lock();
    assert_eq!(frames.0.len(), 1);
    assert_eq!(frames.0[0], frame);
}
