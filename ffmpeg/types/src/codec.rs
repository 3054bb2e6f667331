/*!
    Decoding primitives shared by decoders and filter graphs.
*/

use crate::{Frame, Packet, Result};

/**
    Outcome of pulling output from a decoder or filter graph.

    `NotReady` and `EndOfStream` are drain signals, not errors: they end the
    current drain loop and the caller moves on.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pull {
    /// A frame was written to the output buffer.
    Frame,
    /// More input is needed before further output is available.
    NotReady,
    /// The producer is fully drained and will not produce more output.
    EndOfStream,
}

impl Pull {
    /**
        Returns true if a frame was produced.
    */
    pub fn is_frame(self) -> bool {
        matches!(self, Self::Frame)
    }
}

/**
    Send/receive video decoding primitive.

    Implementations decode compressed packets and hand out frames already
    converted to [`PixelFormat::CANONICAL_DECODE`](crate::PixelFormat::CANONICAL_DECODE).
    A single packet may yield zero, one or several frames.
*/
pub trait FrameDecoder {
    /**
        Submit one compressed packet.
    */
    fn send_packet(&mut self, packet: &Packet) -> Result<()>;

    /**
        Submit the end-of-stream marker so buffered frames can be drained.
    */
    fn send_eof(&mut self) -> Result<()>;

    /**
        Pull the next decoded frame into `frame`.

        `frame` is only written when [`Pull::Frame`] is returned.
    */
    fn receive_frame(&mut self, frame: &mut Frame) -> Result<Pull>;

    /**
        Discard all buffered state, e.g. before decoding again from the start.
    */
    fn reset(&mut self);
}

impl<D: FrameDecoder + ?Sized> FrameDecoder for Box<D> {
    fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        (**self).send_packet(packet)
    }

    fn send_eof(&mut self) -> Result<()> {
        (**self).send_eof()
    }

    fn receive_frame(&mut self, frame: &mut Frame) -> Result<Pull> {
        (**self).receive_frame(frame)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_frame_is_frame() {
        assert!(Pull::Frame.is_frame());
        assert!(!Pull::NotReady.is_frame());
        assert!(!Pull::EndOfStream.is_frame());
    }
}
