//! The two pipeline directions.
//!
//! - [`InputProcessor`]: RTP packets in, decoded whole frames out to a
//!   [`RawDataSink`](crate::RawDataSink).
//! - [`OutputProcessor`]: raw frames in, RTP packets out to an
//!   [`RtpSink`](crate::RtpSink).
//!
//! Each processor is driven by one caller at a time and runs every call to
//! completion. An input and an output processor share no state, so they
//! may run on different threads without synchronization.

pub mod input;
pub mod output;
pub mod reassembly;

pub use input::{Delivery, InputConfig, InputProcessor};
pub use output::{DEFAULT_FRAGMENT_SIZE, DEFAULT_SSRC, OutputConfig, OutputProcessor};
pub use reassembly::{FrameAssembler, ReassemblyState};

/// Capacity of the reassembly, encoded and decoded-audio scratch buffers.
pub const UNPACKAGED_BUFFER_SIZE: usize = 150_000;

/// Largest RTP packet the output side builds for a single audio payload.
pub const PACKAGED_BUFFER_SIZE: usize = 2_000;
