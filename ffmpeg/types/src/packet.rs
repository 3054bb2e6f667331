/*!
    Encoded packet type and the packet source abstraction.
*/

use crate::{Pts, Rational, Result};

/**
    An encoded media packet.

    Contains compressed data from a single stream, with timing information.
    Packets are the unit of data between a container and a decoder.
*/
#[derive(Clone, Debug)]
pub struct Packet {
    /// Index of the stream this packet belongs to.
    pub stream_index: usize,
    /// Compressed data.
    pub data: Vec<u8>,
    /// Presentation timestamp (when to display).
    pub pts: Option<Pts>,
    /// Decode timestamp (may differ from PTS for B-frames).
    pub dts: Option<Pts>,
    /// Duration of this packet's content, in time base units.
    pub duration: i64,
    /// Time base for interpreting timestamps.
    pub time_base: Rational,
    /// Whether this is a keyframe (can be decoded independently).
    pub is_keyframe: bool,
}

impl Packet {
    /**
        Create a new packet with no timing information.
    */
    pub fn new(stream_index: usize, data: Vec<u8>, time_base: Rational) -> Self {
        Self {
            stream_index,
            data,
            pts: None,
            dts: None,
            duration: 0,
            time_base,
            is_keyframe: false,
        }
    }
}

/**
    A source of compressed packets, typically an opened media container.

    Packets of every stream are yielded in container order; consumers filter
    by [`Packet::stream_index`].
*/
pub trait PacketSource {
    /**
        Read the next packet.

        Returns `Ok(None)` once the source is exhausted.
    */
    fn read_packet(&mut self) -> Result<Option<Packet>>;

    /**
        Rewind so the next [`read_packet`](Self::read_packet) starts from
        the beginning of the given stream.
    */
    fn seek_to_start(&mut self, stream_index: usize) -> Result<()>;
}

impl<S: PacketSource + ?Sized> PacketSource for &mut S {
    fn read_packet(&mut self) -> Result<Option<Packet>> {
        (**self).read_packet()
    }

    fn seek_to_start(&mut self, stream_index: usize) -> Result<()> {
        (**self).seek_to_start(stream_index)
    }
}

// Ensure Packet is Send + Sync
static_assertions::assert_impl_all!(Packet: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    const TB_1_1000: Rational = Rational { num: 1, den: 1000 };

    #[test]
    fn new_packet_has_no_timing() {
        let packet = Packet::new(1, vec![0u8; 16], TB_1_1000);

        assert_eq!(packet.stream_index, 1);
        assert_eq!(packet.data.len(), 16);
        assert_eq!(packet.pts, None);
        assert_eq!(packet.dts, None);
        assert_eq!(packet.duration, 0);
        assert!(!packet.is_keyframe);
    }
}
