/*!
    Video decoder implementation.
*/

use ffmpeg_next::{
    self as ffmpeg,
    codec::{self, decoder::Video as VideoDecoderFFmpeg},
    format::Pixel,
    util::error::EAGAIN,
    util::frame::video::Video as VideoFrameFFmpeg,
};
use tracing::debug;

use framepipe_source::CodecConfig;
use framepipe_transform::{VideoConverter, copy_from_ffmpeg};
use framepipe_types::{
    Error, Frame, FrameDecoder, MediaKind, Packet, PixelFormat, Pull, Rational, Result,
};

/**
    FFmpeg-backed video decoder.

    Decodes packets of one video stream and converts every decoded picture
    to [`PixelFormat::CANONICAL_DECODE`] before handing it out.
*/
pub struct VideoDecoder {
    decoder: VideoDecoderFFmpeg,
    converter: VideoConverter,
    decoded: VideoFrameFFmpeg,
    canonical: VideoFrameFFmpeg,
    time_base: Rational,
}

impl VideoDecoder {
    /**
        Create a new video decoder from codec configuration.

        Fails with a codec error if the stream is not video or no decoder
        is available, and with a conversion error if the stream's native
        pixel format cannot be converted.
    */
    pub fn new(codec_config: CodecConfig) -> Result<Self> {
        ffmpeg::init().map_err(|e| Error::codec(e.to_string()))?;

        if codec_config.kind() != MediaKind::Video {
            return Err(Error::codec(format!(
                "stream {} is {}, not video",
                codec_config.stream_index(),
                codec_config.kind()
            )));
        }

        let time_base = codec_config.time_base();
        let parameters = codec_config.into_parameters();

        let decoder_ctx = codec::context::Context::from_parameters(parameters)
            .map_err(|e| Error::codec(e.to_string()))?;

        let decoder = decoder_ctx
            .decoder()
            .video()
            .map_err(|e| Error::codec(e.to_string()))?;

        let mut converter = VideoConverter::new(PixelFormat::CANONICAL_DECODE);
        if decoder.format() != Pixel::None && decoder.width() > 0 && decoder.height() > 0 {
            converter.prepare(decoder.format(), decoder.width(), decoder.height())?;
        }

        debug!(
            codec = ?decoder.id(),
            width = decoder.width(),
            height = decoder.height(),
            format = ?decoder.format(),
            "opened video decoder"
        );

        Ok(Self {
            decoder,
            converter,
            decoded: VideoFrameFFmpeg::empty(),
            canonical: VideoFrameFFmpeg::empty(),
            time_base,
        })
    }

    /**
        Get the time base for this decoder.
    */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /**
        Get the coded width of the stream.
    */
    pub fn width(&self) -> u32 {
        self.decoder.width()
    }

    /**
        Get the coded height of the stream.
    */
    pub fn height(&self) -> u32 {
        self.decoder.height()
    }
}

impl FrameDecoder for VideoDecoder {
    fn send_packet(&mut self, packet: &Packet) -> Result<()> {
        let mut ffmpeg_pkt = ffmpeg::Packet::copy(&packet.data);
        ffmpeg_pkt.set_pts(packet.pts.map(i64::from));
        ffmpeg_pkt.set_dts(packet.dts.map(i64::from));
        ffmpeg_pkt.set_duration(packet.duration);
        if packet.is_keyframe {
            ffmpeg_pkt.set_flags(codec::packet::Flags::KEY);
        }

        self.decoder
            .send_packet(&ffmpeg_pkt)
            .map_err(|e| Error::codec(e.to_string()))
    }

    fn send_eof(&mut self) -> Result<()> {
        match self.decoder.send_eof() {
            Ok(()) | Err(ffmpeg::Error::Eof) => Ok(()),
            Err(e) => Err(Error::codec(e.to_string())),
        }
    }

    fn receive_frame(&mut self, frame: &mut Frame) -> Result<Pull> {
        match self.decoder.receive_frame(&mut self.decoded) {
            Ok(()) => {}
            Err(ffmpeg::Error::Other { errno }) if errno == EAGAIN => return Ok(Pull::NotReady),
            Err(ffmpeg::Error::Eof) => return Ok(Pull::EndOfStream),
            Err(e) => return Err(Error::codec(e.to_string())),
        }

        self.converter.run(&self.decoded, &mut self.canonical)?;
        copy_from_ffmpeg(&self.canonical, frame)?;

        Ok(Pull::Frame)
    }

    fn reset(&mut self) {
        self.decoder.flush();
    }
}

impl std::fmt::Debug for VideoDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoDecoder")
            .field("time_base", &self.time_base)
            .field("width", &self.decoder.width())
            .field("height", &self.decoder.height())
            .finish_non_exhaustive()
    }
}
