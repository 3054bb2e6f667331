/*!
    Shared types for the framepipe frame processing pipeline.

    This crate defines the vocabulary of the pipeline: the types that cross crate
    boundaries. It has no dependency on FFmpeg, so stages and collaborators can be
    written (and tested) without linking the FFmpeg libraries.

    # Frames

    - [`Frame`] and [`Plane`] - Raw pixel buffers flowing through the chain
    - [`PixelFormat`] - Pixel layouts, with [`PixelFormat::CANONICAL_DECODE`] and
      [`PixelFormat::CANONICAL_ENCODE`] as the two layouts the pipeline standardizes on

    # Containers and Packets

    - [`StreamDescriptor`] and [`MediaKind`] - Stream metadata from a container
    - [`Packet`] - Compressed data read from a container
    - [`PacketSource`] - Anything that yields packets and can rewind to the start

    # Decoding

    - [`FrameDecoder`] - Send/receive decoding primitive
    - [`Pull`] - Outcome of pulling from a decoder or filter graph

    # Transform Chain

    - [`TransformStage`] - One link in the processing chain
    - [`from_fn`] - Build a stage from a closure

    # Time

    - [`Rational`] and [`Pts`] - Time bases, frame rates and timestamps

    # Error Handling

    - [`Error`] and [`Result`] - Common error types
*/

mod codec;
mod error;
mod format;
mod frame;
mod packet;
mod rational;
mod stage;
mod stream;
mod timestamp;

pub use codec::{FrameDecoder, Pull};
pub use error::{Error, Result};
pub use format::PixelFormat;
pub use frame::{Frame, Plane};
pub use packet::{Packet, PacketSource};
pub use rational::Rational;
pub use stage::{FnStage, TransformStage, from_fn};
pub use stream::{AudioParams, MediaKind, StreamDescriptor, VideoParams};
pub use timestamp::Pts;
