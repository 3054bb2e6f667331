/*!
    Container probing and packet reading for the framepipe pipeline.

    This crate is the input side of the pipeline. It opens a media file,
    reports what streams it contains, and hands out compressed packets to
    whoever is decoding them.

    # Basic Usage

    ```ignore
    use framepipe_source::{MediaContainer, PacketSource};

    let mut container = MediaContainer::open("video.mp4")?;
    println!("{}", container.info());

    let video_index = container.best_video_stream().expect("no video stream");
    let codec_config = container.codec_config(video_index)?;

    container.seek_to_start(video_index)?;
    while let Some(packet) = container.read_packet()? {
        if packet.stream_index == video_index {
            // Hand the packet to a decoder
        }
    }
    ```

    # Stream Kinds

    Streams are classified as video, audio, subtitle or unknown. Data and
    attachment streams are reported as unknown; they are still listed so
    that stream indices match the container.
*/

pub use framepipe_types::{
    AudioParams, Error, MediaKind, Packet, PacketSource, Pts, Rational, Result, StreamDescriptor,
    VideoParams,
};

mod config;
mod container;

pub use config::CodecConfig;
pub use container::{ContainerInfo, MediaContainer, media_kind};
