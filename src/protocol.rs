//! Streaming wire protocol
//!
//! Defines the typed events carried by the event channel and the decoder
//! that reconstructs them from an arbitrarily-chunked byte stream.

mod decoder;
mod types;

pub use decoder::FrameDecoder;
pub use types::*;
