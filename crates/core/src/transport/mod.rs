//! Network delivery for outbound RTP.
//!
//! The pipelines only see an [`RtpSink`](crate::RtpSink); this module
//! provides one that writes each packet to a UDP peer.

pub mod udp;

pub use udp::UdpSink;
