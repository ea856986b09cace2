//! Where pipeline output goes.
//!
//! Each processor is handed its sink at construction; there is no
//! process-wide delivery target. To let one object serve as both the RTP
//! sink and the SSRC source (or to inspect it while a pipeline owns it),
//! share it as `Arc<parking_lot::Mutex<T>>`, which implements every trait
//! here by locking.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::media::RawMediaPacket;

/// Receives decoded frames from an [`InputProcessor`](crate::InputProcessor).
pub trait RawDataSink: Send {
    /// Called synchronously once per decoded frame. `packet.data` is only
    /// valid for the duration of the call.
    fn receive_raw_data(&mut self, packet: &RawMediaPacket<'_>);
}

/// Receives serialized RTP packets from an [`OutputProcessor`](crate::OutputProcessor).
pub trait RtpSink: Send {
    /// Called synchronously once per emitted packet. Errors are returned to
    /// the caller of the packaging operation; they are not retried.
    fn receive_rtp_data(&mut self, packet: &[u8]) -> Result<()>;
}

/// Supplies the SSRCs the media source publishes under.
pub trait SsrcSource: Send {
    fn audio_source_ssrc(&self) -> u32;
    fn video_source_ssrc(&self) -> u32;
}

/// Collects packets in memory.
impl RtpSink for Vec<Vec<u8>> {
    fn receive_rtp_data(&mut self, packet: &[u8]) -> Result<()> {
        self.push(packet.to_vec());
        Ok(())
    }
}

impl<T: RawDataSink> RawDataSink for Arc<Mutex<T>> {
    fn receive_raw_data(&mut self, packet: &RawMediaPacket<'_>) {
        self.lock().receive_raw_data(packet);
    }
}

impl<T: RtpSink> RtpSink for Arc<Mutex<T>> {
    fn receive_rtp_data(&mut self, packet: &[u8]) -> Result<()> {
        self.lock().receive_rtp_data(packet)
    }
}

impl<T: SsrcSource> SsrcSource for Arc<Mutex<T>> {
    fn audio_source_ssrc(&self) -> u32 {
        self.lock().audio_source_ssrc()
    }

    fn video_source_ssrc(&self) -> u32 {
        self.lock().video_source_ssrc()
    }
}
