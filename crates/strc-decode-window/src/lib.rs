//! Stitched audio buffering and decode-window selection for [`strc`].
//!
//! Split out from the `strc` core crate because these components own
//! audio/PCM and an async decode loop, while `strc` itself stays
//! synchronous and audio-agnostic.

mod buffer;
mod controller;
mod error;

pub use buffer::StitchedAudioBuffer;
pub use controller::{
    BoxFuture, ControllerState, DecodeWindowConfig, DecodeWindowController, DecodedSegment,
    SegmentDecoder,
};
pub use error::DecodeError;
