pub mod clock;
pub mod codec;
pub mod error;
pub mod media;
pub mod processor;
pub mod sink;
pub mod transport;

pub use codec::{CodecOutput, Decoder, Encoder, PassthroughCodec};
pub use error::{Error, Result};
pub use media::audio_level::audio_level;
pub use media::{MediaInfo, MediaKind, RawMediaPacket};
pub use processor::{InputProcessor, OutputProcessor};
pub use sink::{RawDataSink, RtpSink, SsrcSource};
