/*!
    Media container access.
*/

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ffmpeg_next::{self as ffmpeg, ffi, format::context::Input, media};
use tracing::{debug, warn};

use framepipe_types::{
    AudioParams, Error, MediaKind, Packet, PacketSource, Pts, Rational, Result, StreamDescriptor,
    VideoParams,
};

use crate::CodecConfig;

/**
    Map an FFmpeg media type onto the pipeline's stream kinds.

    Data and attachment streams have no dedicated kind and map to
    [`MediaKind::Unknown`].
*/
pub fn media_kind(medium: media::Type) -> MediaKind {
    match medium {
        media::Type::Video => MediaKind::Video,
        media::Type::Audio => MediaKind::Audio,
        media::Type::Subtitle => MediaKind::Subtitle,
        media::Type::Data | media::Type::Attachment | media::Type::Unknown => MediaKind::Unknown,
    }
}

pub(crate) fn rational_from_ffmpeg(value: ffmpeg::Rational) -> Rational {
    if value.denominator() == 0 {
        Rational::new(0, 1)
    } else {
        Rational::new(value.numerator(), value.denominator())
    }
}

/**
    Container-level summary, as probed at open time.
*/
#[derive(Clone, Debug)]
pub struct ContainerInfo {
    pub path: PathBuf,
    /// Short demuxer name (e.g. `mov,mp4,m4a,3gp,3g2,mj2`).
    pub format_name: String,
    /// Descriptive demuxer name.
    pub format_long_name: String,
    /// Total duration, if the container reports one.
    pub duration: Option<Duration>,
    /// Overall bit rate in bits per second (0 when unknown).
    pub bit_rate: i64,
    pub streams: Vec<StreamDescriptor>,
}

impl fmt::Display for ContainerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File Info:")?;
        writeln!(f, "File Name: {}", self.path.display())?;
        writeln!(f, "Format: {} ({})", self.format_name, self.format_long_name)?;
        match self.duration {
            Some(duration) => writeln!(f, "Total Duration: {} seconds", duration.as_secs())?,
            None => writeln!(f, "Total Duration: unknown")?,
        }
        writeln!(f, "Bit Rate: {} kbps", self.bit_rate / 1000)?;
        write!(f, "\nStream Info:")?;
        for stream in &self.streams {
            write!(f, "\n{stream}")?;
        }
        Ok(())
    }
}

/**
    An opened media container.

    Owns the FFmpeg demuxer context. Stream descriptors are read once at
    open time and stay valid until the container is dropped.
*/
pub struct MediaContainer {
    input: Input,
    info: ContainerInfo,
}

impl MediaContainer {
    /**
        Open and probe a media file.

        Fails with [`Error::Open`] if the file cannot be opened or its
        streams cannot be probed.
    */
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        ffmpeg::init().map_err(|e| Error::open(e.to_string()))?;

        let path = path.as_ref().to_path_buf();
        let input = ffmpeg::format::input(&path)
            .map_err(|e| Error::open(format!("could not open {}: {e}", path.display())))?;

        let streams = input.streams().map(|s| describe(&s)).collect::<Vec<_>>();

        let duration = match input.duration() {
            d if d <= 0 || d == ffi::AV_NOPTS_VALUE => None,
            d => Some(Duration::from_micros(d as u64)),
        };

        let info = ContainerInfo {
            path,
            format_name: input.format().name().to_string(),
            format_long_name: input.format().description().to_string(),
            duration,
            bit_rate: input.bit_rate(),
            streams,
        };

        debug!(
            path = %info.path.display(),
            format = %info.format_name,
            streams = info.streams.len(),
            "opened container"
        );

        Ok(Self { input, info })
    }

    /**
        Container-level summary.
    */
    pub fn info(&self) -> &ContainerInfo {
        &self.info
    }

    /**
        Path the container was opened from.
    */
    pub fn path(&self) -> &Path {
        &self.info.path
    }

    /**
        Stream descriptors, in container index order.
    */
    pub fn streams(&self) -> &[StreamDescriptor] {
        &self.info.streams
    }

    /**
        Descriptor of a single stream.
    */
    pub fn stream(&self, index: usize) -> Option<&StreamDescriptor> {
        self.info.streams.get(index)
    }

    /**
        Index of the stream FFmpeg considers the best video stream.
    */
    pub fn best_video_stream(&self) -> Option<usize> {
        self.input
            .streams()
            .best(media::Type::Video)
            .map(|stream| stream.index())
    }

    /**
        Codec parameters for one stream, for constructing a decoder.
    */
    pub fn codec_config(&self, index: usize) -> Result<CodecConfig> {
        let descriptor = self
            .stream(index)
            .ok_or_else(|| Error::codec(format!("stream {index} does not exist")))?;
        let stream = self
            .input
            .stream(index)
            .ok_or_else(|| Error::codec(format!("stream {index} does not exist")))?;

        Ok(CodecConfig::new(
            stream.parameters(),
            index,
            descriptor.kind,
            descriptor.time_base,
        ))
    }
}

impl PacketSource for MediaContainer {
    fn read_packet(&mut self) -> Result<Option<Packet>> {
        let mut packet = ffmpeg::Packet::empty();
        match packet.read(&mut self.input) {
            Ok(()) => {}
            Err(ffmpeg::Error::Eof) => return Ok(None),
            Err(e) => return Err(Error::io(format!("read packet: {e}"))),
        }

        let stream_index = packet.stream();
        let time_base = self
            .info
            .streams
            .get(stream_index)
            .map(|s| s.time_base)
            .unwrap_or(Rational::new(1, 1));

        let data = packet.data().map(<[u8]>::to_vec).unwrap_or_default();
        let mut copied = Packet::new(stream_index, data, time_base);
        copied.pts = packet.pts().map(Pts::from);
        copied.dts = packet.dts().map(Pts::from);
        copied.duration = packet.duration();
        copied.is_keyframe = packet.is_key();

        Ok(Some(copied))
    }

    fn seek_to_start(&mut self, stream_index: usize) -> Result<()> {
        if stream_index >= self.info.streams.len() {
            return Err(Error::invalid_data(format!(
                "stream {stream_index} does not exist"
            )));
        }

        // SAFETY: `input` owns a valid, open format context for the lifetime of self.
        let ret = unsafe {
            ffi::av_seek_frame(
                self.input.as_mut_ptr(),
                stream_index as i32,
                0,
                ffi::AVSEEK_FLAG_BACKWARD as i32,
            )
        };

        // Freshly opened files are already at the start; unseekable inputs only
        // matter for repeated runs, so this is not fatal.
        if ret < 0 {
            warn!(
                stream_index,
                error = %ffmpeg::Error::from(ret),
                "could not seek to start of stream"
            );
        }

        Ok(())
    }
}

impl fmt::Debug for MediaContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaContainer")
            .field("path", &self.info.path)
            .field("format", &self.info.format_name)
            .field("streams", &self.info.streams.len())
            .finish_non_exhaustive()
    }
}

fn describe(stream: &ffmpeg::format::stream::Stream) -> StreamDescriptor {
    let parameters = stream.parameters();
    let kind = media_kind(parameters.medium());

    let (codec_name, codec_long_name) = match ffmpeg::decoder::find(parameters.id()) {
        Some(codec) => (codec.name().to_string(), codec.description().to_string()),
        None => ("Unknown".to_string(), "Unknown".to_string()),
    };

    // SAFETY: the parameters point at the stream's codecpar, which lives as
    // long as the input context that `stream` borrows from.
    let raw = unsafe { &*parameters.as_ptr() };

    let video = (kind == MediaKind::Video).then(|| VideoParams {
        width: raw.width.max(0) as u32,
        height: raw.height.max(0) as u32,
        frame_rate: rational_from_ffmpeg(stream.rate()),
    });

    let audio = (kind == MediaKind::Audio).then(|| AudioParams {
        sample_rate: raw.sample_rate.max(0) as u32,
        channels: raw.ch_layout.nb_channels.max(0) as u16,
    });

    StreamDescriptor {
        index: stream.index(),
        kind,
        codec_name,
        codec_long_name,
        time_base: rational_from_ffmpeg(stream.time_base()),
        video,
        audio,
    }
}
