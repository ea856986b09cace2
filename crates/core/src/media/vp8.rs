//! VP8 RTP payload format (RFC 7741).
//!
//! Every VP8 RTP payload starts with a payload descriptor:
//!
//! ```text
//!       0 1 2 3 4 5 6 7
//!      +-+-+-+-+-+-+-+-+
//!      |X|R|N|S|R| PID | (REQUIRED)
//!      +-+-+-+-+-+-+-+-+
//! X:   |I|L|T|K| RSV   | (OPTIONAL)
//!      +-+-+-+-+-+-+-+-+
//! I:   |M| PictureID   | (OPTIONAL, second byte when M = 1)
//!      +-+-+-+-+-+-+-+-+
//! L:   |   TL0PICIDX   | (OPTIONAL)
//!      +-+-+-+-+-+-+-+-+
//! T/K: |TID|Y| KEYIDX  | (OPTIONAL)
//!      +-+-+-+-+-+-+-+-+
//! ```
//!
//! - **S** (start): set on the first packet of a VP8 partition.
//! - **PID**: partition index; the first packet of a frame has S=1, PID=0.
//!
//! The frame boundary itself is signalled by the RTP marker bit, not by
//! the descriptor, so [`Depacketizer`] only strips descriptors and the
//! caller tracks frame completion.

/// Size of the descriptor written by [`Vp8Fragmenter`].
pub const DESCRIPTOR_LEN: usize = 1;

const X_BIT: u8 = 0x80;
const N_BIT: u8 = 0x20;
const S_BIT: u8 = 0x10;
const PID_MASK: u8 = 0x07;
const I_BIT: u8 = 0x80;
const L_BIT: u8 = 0x40;
const T_BIT: u8 = 0x20;
const K_BIT: u8 = 0x10;
const M_BIT: u8 = 0x80;

/// Why a payload could not be depacketized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DepacketizeError {
    #[error("empty payload")]
    Empty,
    #[error("payload descriptor truncated")]
    TruncatedDescriptor,
}

/// Turns one RTP payload into the codec bytes it carries.
pub trait Depacketizer: Send {
    /// Strip codec framing from `payload`, returning the fragment to append
    /// to the frame being reassembled. The fragment may be empty.
    fn depacketize<'a>(&mut self, payload: &'a [u8]) -> Result<&'a [u8], DepacketizeError>;
}

/// Parsed VP8 payload descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Vp8Descriptor {
    pub non_reference: bool,
    pub start_of_partition: bool,
    pub partition_id: u8,
    /// 7- or 15-bit picture ID, when present.
    pub picture_id: Option<u16>,
    pub tl0_pic_idx: Option<u8>,
}

impl Vp8Descriptor {
    /// Parse the descriptor at the start of `payload`, returning it and its
    /// length in bytes.
    pub fn parse(payload: &[u8]) -> Result<(Self, usize), DepacketizeError> {
        let (&first, _) = payload.split_first().ok_or(DepacketizeError::Empty)?;
        let mut desc = Self {
            non_reference: first & N_BIT != 0,
            start_of_partition: first & S_BIT != 0,
            partition_id: first & PID_MASK,
            ..Self::default()
        };
        let mut pos = 1;
        if first & X_BIT == 0 {
            return Ok((desc, pos));
        }

        let byte = |pos: usize| {
            payload
                .get(pos)
                .copied()
                .ok_or(DepacketizeError::TruncatedDescriptor)
        };

        let ext = byte(pos)?;
        pos += 1;
        if ext & I_BIT != 0 {
            let b = byte(pos)?;
            pos += 1;
            if b & M_BIT != 0 {
                let low = byte(pos)?;
                pos += 1;
                desc.picture_id = Some((((b & 0x7f) as u16) << 8) | low as u16);
            } else {
                desc.picture_id = Some(b as u16);
            }
        }
        if ext & L_BIT != 0 {
            desc.tl0_pic_idx = Some(byte(pos)?);
            pos += 1;
        }
        if ext & (T_BIT | K_BIT) != 0 {
            byte(pos)?;
            pos += 1;
        }
        Ok((desc, pos))
    }
}

/// RFC 7741 depacketizer.
#[derive(Debug, Default)]
pub struct Vp8Depacketizer;

impl Depacketizer for Vp8Depacketizer {
    fn depacketize<'a>(&mut self, payload: &'a [u8]) -> Result<&'a [u8], DepacketizeError> {
        let (desc, len) = Vp8Descriptor::parse(payload)?;
        // may be empty; the packet still carries the marker bit
        let data = &payload[len..];
        tracing::trace!(
            start = desc.start_of_partition,
            pid = desc.partition_id,
            picture_id = ?desc.picture_id,
            len = data.len(),
            "VP8 fragment"
        );
        Ok(data)
    }
}

/// Splits one encoded VP8 frame into MTU-bounded RTP payloads.
///
/// Each payload is a 1-byte descriptor followed by a chunk of the frame;
/// the whole payload (descriptor included) never exceeds `mtu`. The first
/// payload carries S=1, PID=0; later ones carry S=0.
///
/// ```text
/// frame:    [..........................................]
/// payloads: [S|chunk 0      ][ |chunk 1      ][ |tail ]
///                                             last ^
/// ```
#[derive(Debug)]
pub struct Vp8Fragmenter<'a> {
    frame: &'a [u8],
    max_fragment: usize,
    offset: usize,
    first: bool,
}

impl<'a> Vp8Fragmenter<'a> {
    pub fn new(frame: &'a [u8], mtu: usize) -> Self {
        Self {
            frame,
            max_fragment: mtu.saturating_sub(DESCRIPTOR_LEN).max(1),
            offset: 0,
            first: true,
        }
    }

    /// Write the next payload into `out` (cleared first).
    ///
    /// Returns `Some(is_last)` for each payload and `None` once the frame
    /// is exhausted. An empty frame yields no payloads.
    pub fn next_packet(&mut self, out: &mut Vec<u8>) -> Option<bool> {
        if self.offset >= self.frame.len() {
            return None;
        }
        let remaining = self.frame.len() - self.offset;
        let last = remaining <= self.max_fragment;
        let chunk_size = remaining.min(self.max_fragment);
        let chunk = &self.frame[self.offset..self.offset + chunk_size];

        out.clear();
        out.push(if self.first { S_BIT } else { 0 });
        out.extend_from_slice(chunk);

        self.offset += chunk_size;
        self.first = false;
        Some(last)
    }
}
