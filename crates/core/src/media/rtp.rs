//! RTP fixed header (RFC 3550 §5.1).
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |V=2|P|X|  CC   |M|     PT      |       Sequence Number         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           Timestamp                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                             SSRC                              |
//! +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
//! |            CSRC list (CC * 4 bytes, inbound only)             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |      profile (0xBEDE)         |     length (32-bit words)     |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                  extension elements (X = 1)                   |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! [`RtpHeader`] builds outbound headers; [`RtpPacketView`] parses inbound
//! packets without copying. All integers are big-endian.

use crate::error::ParseErrorKind;

/// Size of the fixed header without CSRCs or extension.
pub const FIXED_HEADER_LEN: usize = 12;

/// RFC 8285 one-byte header extension profile.
pub const ONE_BYTE_EXTENSION_PROFILE: u16 = 0xBEDE;

const VERSION: u8 = 2;
const EXTENSION_HEADER_LEN: usize = 4;

/// Client-to-mixer audio level (RFC 6464) carried in a one-byte extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioLevelExtension {
    /// Extension element ID negotiated for `urn:ietf:params:rtp-hdrext:ssrc-audio-level` (1-14).
    pub id: u8,
    pub voice_activity: bool,
    /// Level in -dBov, 0 (loudest) to 127 (silence).
    pub level: u8,
}

impl AudioLevelExtension {
    /// Encoded size including the 4-byte extension header: one element
    /// byte, one data byte, two bytes of padding.
    const WIRE_LEN: usize = EXTENSION_HEADER_LEN + 4;

    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&ONE_BYTE_EXTENSION_PROFILE.to_be_bytes());
        out.extend_from_slice(&1u16.to_be_bytes());
        // length field is (data length - 1) = 0
        out.push((self.id & 0x0f) << 4);
        out.push(((self.voice_activity as u8) << 7) | (self.level & 0x7f));
        out.extend_from_slice(&[0, 0]);
    }
}

/// Outbound RTP header fields.
///
/// Version is always 2; padding and CSRC count are always 0. The extension
/// bit is set exactly when [`extension`](Self::extension) is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RtpHeader {
    pub marker: bool,
    /// 7-bit payload type (RFC 3551).
    pub payload_type: u8,
    pub sequence: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    pub extension: Option<AudioLevelExtension>,
}

impl RtpHeader {
    /// Serialized size of this header.
    pub fn len(&self) -> usize {
        FIXED_HEADER_LEN
            + self
                .extension
                .map_or(0, |_| AudioLevelExtension::WIRE_LEN)
    }

    /// Append the serialized header to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        let first_byte: u8 = (VERSION << 6) | ((self.extension.is_some() as u8) << 4);
        let second_byte: u8 = ((self.marker as u8) << 7) | (self.payload_type & 0x7f);

        out.push(first_byte);
        out.push(second_byte);
        out.extend_from_slice(&self.sequence.to_be_bytes());
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(&self.ssrc.to_be_bytes());
        if let Some(ext) = &self.extension {
            ext.write_to(out);
        }
    }
}

/// Borrowed view over an inbound RTP packet.
///
/// Only valid while the packet buffer is; never stored past the call that
/// parsed it.
#[derive(Debug, Clone, Copy)]
pub struct RtpPacketView<'a> {
    data: &'a [u8],
    header_len: usize,
    payload_end: usize,
    extension: Option<(u16, usize)>,
}

impl<'a> RtpPacketView<'a> {
    /// Parse the header of `data`, validating that the CSRC list, header
    /// extension and padding all fit.
    pub fn parse(data: &'a [u8]) -> Result<Self, ParseErrorKind> {
        if data.len() < FIXED_HEADER_LEN {
            return Err(ParseErrorKind::TooShort);
        }
        let version = data[0] >> 6;
        if version != VERSION {
            return Err(ParseErrorKind::UnsupportedVersion(version));
        }

        let has_padding = data[0] & 0x20 != 0;
        let has_extension = data[0] & 0x10 != 0;
        let csrc_count = (data[0] & 0x0f) as usize;

        let mut header_len = FIXED_HEADER_LEN + 4 * csrc_count;
        if header_len > data.len() {
            return Err(ParseErrorKind::Truncated);
        }

        let mut extension = None;
        if has_extension {
            let ext = data
                .get(header_len..header_len + EXTENSION_HEADER_LEN)
                .ok_or(ParseErrorKind::Truncated)?;
            let profile = u16::from_be_bytes([ext[0], ext[1]]);
            let words = u16::from_be_bytes([ext[2], ext[3]]) as usize;
            let ext_start = header_len + EXTENSION_HEADER_LEN;
            header_len = ext_start + 4 * words;
            if header_len > data.len() {
                return Err(ParseErrorKind::Truncated);
            }
            extension = Some((profile, ext_start));
        }

        let mut payload_end = data.len();
        if has_padding {
            let padding = data[data.len() - 1] as usize;
            if padding == 0 || header_len + padding > data.len() {
                return Err(ParseErrorKind::Truncated);
            }
            payload_end -= padding;
        }

        Ok(Self {
            data,
            header_len,
            payload_end,
            extension,
        })
    }

    pub fn payload_type(&self) -> u8 {
        self.data[1] & 0x7f
    }

    pub fn marker(&self) -> bool {
        self.data[1] & 0x80 != 0
    }

    pub fn sequence(&self) -> u16 {
        u16::from_be_bytes([self.data[2], self.data[3]])
    }

    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.data[4], self.data[5], self.data[6], self.data[7]])
    }

    pub fn ssrc(&self) -> u32 {
        u32::from_be_bytes([self.data[8], self.data[9], self.data[10], self.data[11]])
    }

    /// Header size including CSRCs and extension.
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// Payload bytes, excluding any padding.
    pub fn payload(&self) -> &'a [u8] {
        &self.data[self.header_len..self.payload_end]
    }

    /// Extension profile and element bytes, when the X bit is set.
    pub fn extension(&self) -> Option<(u16, &'a [u8])> {
        self.extension
            .map(|(profile, start)| (profile, &self.data[start..self.header_len]))
    }

    /// Look up an RFC 6464 audio level element with the given ID in a
    /// one-byte extension block.
    pub fn audio_level(&self, id: u8) -> Option<AudioLevelExtension> {
        let (profile, mut elements) = self.extension()?;
        if profile != ONE_BYTE_EXTENSION_PROFILE {
            return None;
        }
        while let Some((&first, rest)) = elements.split_first() {
            let element_id = first >> 4;
            if element_id == 0 {
                // padding
                elements = rest;
                continue;
            }
            if element_id == 15 {
                return None;
            }
            let len = (first & 0x0f) as usize + 1;
            let value = rest.get(..len)?;
            if element_id == id {
                return Some(AudioLevelExtension {
                    id,
                    voice_activity: value[0] & 0x80 != 0,
                    level: value[0] & 0x7f,
                });
            }
            elements = &rest[len..];
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_header() -> RtpHeader {
        RtpHeader {
            marker: false,
            payload_type: 100,
            sequence: 7,
            timestamp: 90_000,
            ssrc: 0xAABBCCDD,
            extension: None,
        }
    }

    fn written(h: &RtpHeader) -> Vec<u8> {
        let mut buf = Vec::new();
        h.write_to(&mut buf);
        buf
    }

    #[test]
    fn version_is_2() {
        let buf = written(&make_header());
        assert_eq!(buf.len(), FIXED_HEADER_LEN);
        assert_eq!(buf[0] >> 6, 2);
        assert_eq!(buf[0] & 0x10, 0);
    }

    #[test]
    fn marker_bit() {
        let mut h = make_header();
        assert_eq!(written(&h)[1] & 0x80, 0);
        h.marker = true;
        assert_eq!(written(&h)[1] & 0x80, 0x80);
    }

    #[test]
    fn fields_are_big_endian() {
        let buf = written(&make_header());
        assert_eq!(buf[1] & 0x7f, 100);
        assert_eq!(u16::from_be_bytes([buf[2], buf[3]]), 7);
        assert_eq!(
            u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
            90_000
        );
        assert_eq!(
            u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]),
            0xAABBCCDD
        );
    }

    #[test]
    fn parse_written_header() {
        let mut h = make_header();
        h.marker = true;
        let mut buf = written(&h);
        buf.extend_from_slice(&[1, 2, 3]);

        let view = RtpPacketView::parse(&buf).unwrap();
        assert!(view.marker());
        assert_eq!(view.payload_type(), 100);
        assert_eq!(view.sequence(), 7);
        assert_eq!(view.timestamp(), 90_000);
        assert_eq!(view.ssrc(), 0xAABBCCDD);
        assert_eq!(view.header_len(), 12);
        assert_eq!(view.payload(), &[1, 2, 3]);
        assert!(view.extension().is_none());
    }

    #[test]
    fn parse_too_short() {
        assert_eq!(
            RtpPacketView::parse(&[0x80; 11]).unwrap_err(),
            ParseErrorKind::TooShort
        );
    }

    #[test]
    fn parse_wrong_version() {
        let mut buf = written(&make_header());
        buf[0] = 0x40;
        assert_eq!(
            RtpPacketView::parse(&buf).unwrap_err(),
            ParseErrorKind::UnsupportedVersion(1)
        );
    }

    #[test]
    fn parse_skips_csrcs() {
        let mut buf = written(&make_header());
        buf[0] |= 2;
        buf.extend_from_slice(&[0; 8]);
        buf.push(0xEE);
        let view = RtpPacketView::parse(&buf).unwrap();
        assert_eq!(view.header_len(), 20);
        assert_eq!(view.payload(), &[0xEE]);
    }

    #[test]
    fn parse_truncated_csrcs() {
        let mut buf = written(&make_header());
        buf[0] |= 3;
        buf.extend_from_slice(&[0; 4]);
        assert_eq!(
            RtpPacketView::parse(&buf).unwrap_err(),
            ParseErrorKind::Truncated
        );
    }

    #[test]
    fn parse_strips_padding() {
        let mut buf = written(&make_header());
        buf[0] |= 0x20;
        buf.extend_from_slice(&[9, 9, 0, 0, 3]);
        let view = RtpPacketView::parse(&buf).unwrap();
        assert_eq!(view.payload(), &[9, 9]);
    }

    #[test]
    fn parse_bad_padding() {
        let mut buf = written(&make_header());
        buf[0] |= 0x20;
        buf.extend_from_slice(&[1, 200]);
        assert_eq!(
            RtpPacketView::parse(&buf).unwrap_err(),
            ParseErrorKind::Truncated
        );
    }

    #[test]
    fn audio_level_extension_roundtrip() {
        let mut h = make_header();
        h.payload_type = 111;
        h.extension = Some(AudioLevelExtension {
            id: 1,
            voice_activity: true,
            level: 42,
        });
        let mut buf = written(&h);
        assert_eq!(buf.len(), h.len());
        assert_eq!(h.len(), 20);
        assert_eq!(buf[0] & 0x10, 0x10);
        buf.extend_from_slice(&[0x10; 4]);

        let view = RtpPacketView::parse(&buf).unwrap();
        assert_eq!(view.header_len(), 20);
        assert_eq!(view.payload(), &[0x10; 4]);
        let (profile, elements) = view.extension().unwrap();
        assert_eq!(profile, ONE_BYTE_EXTENSION_PROFILE);
        assert_eq!(elements.len(), 4);
        assert_eq!(view.audio_level(1), h.extension);
        assert_eq!(view.audio_level(2), None);
    }

    #[test]
    fn parse_truncated_extension() {
        let mut buf = written(&make_header());
        buf[0] |= 0x10;
        buf.extend_from_slice(&[0xBE, 0xDE, 0x00, 0x02, 0x10]);
        assert_eq!(
            RtpPacketView::parse(&buf).unwrap_err(),
            ParseErrorKind::Truncated
        );
    }
}
