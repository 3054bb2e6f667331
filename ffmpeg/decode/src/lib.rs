/*!
    Video decoding and the decode loop for the framepipe pipeline.

    This crate turns the compressed packets of one video stream into raw
    frames and pushes each of them through a transform chain.

    # Example

    ```ignore
    use framepipe_decode::{DecodeSession, RunOptions};
    use framepipe_source::MediaContainer;
    use framepipe_transform::Inspect;

    let mut container = MediaContainer::open("video.mp4")?;
    let stream_index = container.best_video_stream().expect("no video stream");

    let mut session = DecodeSession::initialize(&mut container, stream_index)?;
    let mut head = Inspect::new();
    let frames = session.run(&mut head, RunOptions::with_max_frames(100))?;
    ```

    # Decode Loop

    A run always starts from the beginning of the stream. Packets from
    other streams are skipped. After every packet the decoder is drained
    until it needs more input; once the container is exhausted the decoder
    is flushed and drained once more, so trailing frames are delivered too.

    Decoders are pluggable through [`FrameDecoder`]; [`VideoDecoder`] is
    the FFmpeg implementation used by [`DecodeSession::initialize`].
*/

pub use framepipe_source::CodecConfig;
pub use framepipe_types::{Error, Frame, FrameDecoder, Packet, PacketSource, Pull, Result};

mod config;
mod session;
mod video;

pub use config::RunOptions;
pub use session::DecodeSession;
pub use video::VideoDecoder;
