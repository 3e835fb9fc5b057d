/*!
    Shared types for the ffmpeg crate ecosystem.

    This crate defines the vocabulary of the ecosystem: the types that cross crate
    boundaries. It has no dependency on FFmpeg, making it lightweight and enabling
    consumers to depend on it without pulling in FFmpeg bindings.
*/

mod codec;
mod error;
mod format;
mod frame;
mod packet;
mod stream;
mod time;

pub use codec::CodecId;
pub use error::{Error, Result};
pub use format::PixelFormat;
pub use frame::{PlanarYuvFrame, RasterFrame};
pub use packet::CompressedPacket;
pub use stream::VideoStreamInfo;
pub use time::{Pts, Rational, rescale_ts};
