use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use crate::error::Result;
use crate::sink::RtpSink;

/// UDP transport for outbound RTP packet delivery.
///
/// Binds an ephemeral socket (`0.0.0.0:0`) and sends every packet it
/// receives as an [`RtpSink`] to one fixed peer. Send errors are returned
/// to the packager, which stops the current frame.
pub struct UdpSink {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpSink {
    /// Bind an ephemeral UDP socket sending to `peer`.
    pub fn bind(peer: impl ToSocketAddrs) -> Result<Self> {
        let peer = peer.to_socket_addrs()?.next().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "no peer address")
        })?;
        let local = if peer.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local)?;
        tracing::debug!(local = %socket.local_addr()?, %peer, "UDP sink bound");
        Ok(Self { socket, peer })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl RtpSink for UdpSink {
    fn receive_rtp_data(&mut self, packet: &[u8]) -> Result<()> {
        self.socket.send_to(packet, self.peer)?;
        Ok(())
    }
}
