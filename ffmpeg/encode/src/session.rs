/*!
    Encode session: open, write, finalize.
*/

use std::{fs, mem};

use ffmpeg_next::{
    self as ffmpeg, Dictionary, codec, encoder, ffi, format, format::Pixel,
    util::error::EAGAIN, util::frame::video::Video as VideoFrameFFmpeg,
};
use tracing::{debug, info, warn};

use framepipe_transform::{VideoConverter, copy_to_ffmpeg, pixel_to_ffmpeg};
use framepipe_types::{Error, Frame, PixelFormat, Pts, Rational, Result};

use crate::{EncodeStage, EncoderConfig};

fn to_ffmpeg(value: Rational) -> ffmpeg::Rational {
    ffmpeg::Rational::new(value.num, value.den)
}

/**
    Everything owned while a session is open.
*/
struct Writer {
    output: format::context::Output,
    encoder: encoder::video::Encoder,
    converter: VideoConverter,
    staging: VideoFrameFFmpeg,
    yuv: VideoFrameFFmpeg,
    stream_index: usize,
    encoder_time_base: ffmpeg::Rational,
    stream_time_base: ffmpeg::Rational,
    next_pts: Pts,
    width: u32,
    height: u32,
}

impl Writer {
    /**
        Resolve the encoder, then create the output file and set everything up.

        The file is only touched once the encoder is known to exist. A file
        created here is removed again if a later step fails.
    */
    fn open(config: &EncoderConfig) -> Result<Self> {
        ffmpeg::init().map_err(|e| Error::codec(e.to_string()))?;

        let codec = encoder::find_by_name(&config.codec)
            .ok_or_else(|| Error::codec(format!("encoder not found: {}", config.codec)))?;

        let existed = config.path.exists();
        let output = format::output(&config.path).map_err(|e| {
            Error::io(format!(
                "could not create output {}: {e}",
                config.path.display()
            ))
        })?;

        Self::configure(output, codec, config).inspect_err(|_| {
            if existed {
                return;
            }
            if let Err(e) = fs::remove_file(&config.path) {
                warn!(path = %config.path.display(), "could not remove partial output: {e}");
            }
        })
    }

    fn configure(
        mut output: format::context::Output,
        codec: ffmpeg::Codec,
        config: &EncoderConfig,
    ) -> Result<Self> {
        let global_header = output
            .format()
            .flags()
            .contains(format::Flags::GLOBAL_HEADER);
        let time_base = to_ffmpeg(config.time_base());

        let mut stream = output
            .add_stream(codec)
            .map_err(|e| Error::codec(format!("add video stream: {e}")))?;
        stream.set_time_base(time_base);
        let stream_index = stream.index();

        let mut video = codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|e| Error::codec(format!("create encoder context: {e}")))?;

        video.set_width(config.width);
        video.set_height(config.height);
        video.set_format(Pixel::YUV420P);
        video.set_time_base(time_base);
        video.set_frame_rate(Some(to_ffmpeg(config.frame_rate)));

        let mut options = Dictionary::new();
        if codec.id() == codec::Id::H264 {
            let bit_rate = config
                .bit_rate
                .unwrap_or(config.width as usize * config.height as usize * 4);
            video.set_bit_rate(bit_rate);
            options.set("preset", "ultrafast");
            options.set("tune", "zerolatency");
        } else if let Some(bit_rate) = config.bit_rate {
            video.set_bit_rate(bit_rate);
        }

        if global_header {
            video.set_flags(codec::Flags::GLOBAL_HEADER);
        }

        let encoder = video
            .open_as_with(codec, options)
            .map_err(|e| Error::codec(format!("open encoder {}: {e}", config.codec)))?;
        stream.set_parameters(&encoder);

        output
            .write_header()
            .map_err(|e| Error::io(format!("write header: {e}")))?;

        // The muxer may pick its own stream time base while writing the header
        let stream_time_base = output
            .stream(stream_index)
            .map(|stream| stream.time_base())
            .ok_or_else(|| Error::codec("output stream disappeared"))?;

        Ok(Self {
            output,
            encoder,
            converter: VideoConverter::with_size(
                PixelFormat::CANONICAL_ENCODE,
                config.width,
                config.height,
            ),
            staging: VideoFrameFFmpeg::empty(),
            yuv: VideoFrameFFmpeg::new(Pixel::YUV420P, config.width, config.height),
            stream_index,
            encoder_time_base: time_base,
            stream_time_base,
            next_pts: Pts(0),
            width: config.width,
            height: config.height,
        })
    }

    fn write(&mut self, frame: &Frame) -> Result<()> {
        // The encoder may still reference the previous frame's buffers
        let ret = unsafe { ffi::av_frame_make_writable(self.yuv.as_mut_ptr()) };
        if ret < 0 {
            return Err(Error::conversion(format!(
                "could not make frame writable: {}",
                ffmpeg::Error::from(ret)
            )));
        }

        if frame.format() == PixelFormat::CANONICAL_ENCODE
            && frame.width() == self.width
            && frame.height() == self.height
        {
            copy_to_ffmpeg(frame, &mut self.yuv)?;
        } else {
            let format = pixel_to_ffmpeg(frame.format());
            if self.staging.format() != format
                || self.staging.width() != frame.width()
                || self.staging.height() != frame.height()
            {
                self.staging = VideoFrameFFmpeg::new(format, frame.width(), frame.height());
            }
            copy_to_ffmpeg(frame, &mut self.staging)?;
            self.converter.run(&self.staging, &mut self.yuv)?;
        }

        self.yuv.set_pts(Some(self.next_pts.into()));
        self.next_pts = self.next_pts.next();

        self.encoder
            .send_frame(&self.yuv)
            .map_err(|e| Error::codec(format!("send frame: {e}")))?;

        self.drain()
    }

    fn drain(&mut self) -> Result<()> {
        let mut packet = ffmpeg::Packet::empty();
        loop {
            match self.encoder.receive_packet(&mut packet) {
                Ok(()) => {}
                Err(ffmpeg::Error::Other { errno }) if errno == EAGAIN => return Ok(()),
                Err(ffmpeg::Error::Eof) => return Ok(()),
                Err(e) => return Err(Error::codec(format!("receive packet: {e}"))),
            }

            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, self.stream_time_base);
            packet
                .write_interleaved(&mut self.output)
                .map_err(|e| Error::io(format!("write packet: {e}")))?;
        }
    }

    fn finish(mut self) -> Result<()> {
        self.encoder
            .send_eof()
            .map_err(|e| Error::codec(format!("flush encoder: {e}")))?;
        self.drain()?;
        self.output
            .write_trailer()
            .map_err(|e| Error::io(format!("write trailer: {e}")))
    }
}

enum State {
    Closed,
    Open(Box<Writer>),
    Finalized,
}

/**
    Writes frames into a new video file.

    A session starts closed, is opened once with [`EncodeSession::open`],
    accepts any number of [`EncodeSession::write`] calls and must be
    finalized with [`EncodeSession::finalize`] for the file to be complete.

    Frames of any supported format and size are converted to YUV 4:2:0 at
    the configured size before encoding. Presentation timestamps count
    frames written, starting at 0.

    Dropping an open session releases everything but does not write the
    container trailer.
*/
pub struct EncodeSession {
    state: State,
    config: Option<EncoderConfig>,
    frames_written: u64,
}

impl EncodeSession {
    /**
        Create a closed session.
    */
    pub fn new() -> Self {
        Self {
            state: State::Closed,
            config: None,
            frames_written: 0,
        }
    }

    /**
        Create the output file, configure the encoder and write the header.

        Fails with a state error unless the session is closed. Nothing is
        kept if any step fails, and the session stays closed.
    */
    pub fn open(&mut self, config: EncoderConfig) -> Result<()> {
        match self.state {
            State::Closed => {}
            State::Open(_) => return Err(Error::state("encode session is already open")),
            State::Finalized => return Err(Error::state("encode session is finalized")),
        }

        config.validate()?;
        let writer = Writer::open(&config)?;

        info!(
            path = %config.path.display(),
            codec = %config.codec,
            width = config.width,
            height = config.height,
            frame_rate = %config.frame_rate,
            "opened output"
        );

        self.state = State::Open(Box::new(writer));
        self.config = Some(config);
        self.frames_written = 0;
        Ok(())
    }

    /**
        Encode one frame and write every packet the encoder produces.

        Fails with a state error, without touching the output, unless the
        session is open.
    */
    pub fn write(&mut self, frame: &Frame) -> Result<()> {
        let writer = match &mut self.state {
            State::Open(writer) => writer,
            State::Closed => return Err(Error::state("encode session is not open")),
            State::Finalized => return Err(Error::state("encode session is finalized")),
        };

        writer.write(frame)?;
        self.frames_written += 1;
        debug!(frames_written = self.frames_written, "encoded frame");
        Ok(())
    }

    /**
        Flush the encoder, write the trailer and release the output.

        Calling this more than once, or on a session that was never opened,
        does nothing. Resources are released even when flushing fails.
    */
    pub fn finalize(&mut self) -> Result<()> {
        match mem::replace(&mut self.state, State::Finalized) {
            State::Open(writer) => {
                (*writer).finish()?;
                info!(frames = self.frames_written, "finalized output");
                Ok(())
            }
            State::Closed => {
                self.state = State::Closed;
                Ok(())
            }
            State::Finalized => Ok(()),
        }
    }

    /**
        Returns true between a successful open and finalize.
    */
    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Open(_))
    }

    /**
        Returns true once the session has been finalized.
    */
    pub fn is_finalized(&self) -> bool {
        matches!(self.state, State::Finalized)
    }

    /**
        Number of frames accepted by [`EncodeSession::write`].
    */
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /**
        The configuration the session was opened with.
    */
    pub fn config(&self) -> Option<&EncoderConfig> {
        self.config.as_ref()
    }

    /**
        A transform stage that writes every frame it receives to this session.
    */
    pub fn stage(&mut self) -> EncodeStage<'_> {
        EncodeStage::new(self)
    }
}

impl Default for EncodeSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EncodeSession {
    fn drop(&mut self) {
        if self.is_open() {
            warn!(
                frames = self.frames_written,
                "encode session dropped without finalize, output is incomplete"
            );
        }
    }
}

impl std::fmt::Debug for EncodeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            State::Closed => "closed",
            State::Open(_) => "open",
            State::Finalized => "finalized",
        };
        f.debug_struct("EncodeSession")
            .field("state", &state)
            .field("config", &self.config)
            .field("frames_written", &self.frames_written)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_closed() {
        let session = EncodeSession::new();
        assert!(!session.is_open());
        assert!(!session.is_finalized());
        assert_eq!(session.frames_written(), 0);
        assert!(session.config().is_none());
    }

    #[test]
    fn write_before_open_is_state_error() {
        let mut session = EncodeSession::new();
        let err = session
            .write(&Frame::solid_rgb(2, 2, [0, 0, 0]))
            .unwrap_err();
        assert!(err.is_state());
    }

    #[test]
    fn finalize_without_open_is_noop() {
        let mut session = EncodeSession::new();
        session.finalize().unwrap();
        session.finalize().unwrap();
        assert!(!session.is_finalized());
        assert!(!session.is_open());
    }

    #[test]
    fn unknown_encoder_keeps_session_closed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.mp4");
        let mut session = EncodeSession::new();
        let config = EncoderConfig::new(&path, 64, 48).with_codec("no_such_encoder");
        let err = session.open(config).unwrap_err();
        assert!(matches!(err, Error::Codec { .. }), "{err}");
        assert!(!session.is_open());
        assert!(!path.exists());
    }

    #[test]
    fn unknown_encoder_leaves_existing_file_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("existing.mp4");
        fs::write(&path, b"previous contents").unwrap();

        let mut session = EncodeSession::new();
        let config = EncoderConfig::new(&path, 64, 48).with_codec("no_such_encoder");
        assert!(session.open(config).is_err());
        assert_eq!(fs::read(&path).unwrap(), b"previous contents");
    }

    #[test]
    fn failed_encoder_open_removes_created_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.mp4");

        // The png encoder exists but rejects YUV 4:2:0 input
        let mut session = EncodeSession::new();
        let config = EncoderConfig::new(&path, 64, 48).with_codec("png");
        let err = session.open(config).unwrap_err();
        assert!(matches!(err, Error::Codec { .. }), "{err}");
        assert!(!session.is_open());
        assert!(!path.exists());
    }

    #[test]
    fn invalid_size_is_rejected_before_io() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.mp4");
        let mut session = EncodeSession::new();
        let err = session.open(EncoderConfig::new(&path, 0, 48)).unwrap_err();
        assert!(matches!(err, Error::InvalidData { .. }));
        assert!(!path.exists());
    }
}
