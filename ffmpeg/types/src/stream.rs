/*!
    Stream metadata reported by a container.
*/

use std::fmt;

use crate::Rational;

/**
    Kind of media carried by a stream.

    Anything that is not video, audio or subtitles (data, attachments,
    unrecognized streams) is reported as `Unknown`.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
    Subtitle,
    Unknown,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Video => "Video",
            Self::Audio => "Audio",
            Self::Subtitle => "Subtitle",
            Self::Unknown => "Unknown",
        })
    }
}

/// Video-specific stream parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VideoParams {
    pub width: u32,
    pub height: u32,
    /// Base frame rate of the stream (0/1 when unknown).
    pub frame_rate: Rational,
}

/// Audio-specific stream parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioParams {
    pub sample_rate: u32,
    pub channels: u16,
}

/**
    Read-only description of one stream inside a container.

    Produced once when the container is opened.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamDescriptor {
    /// Position of the stream inside the container.
    pub index: usize,
    pub kind: MediaKind,
    /// Short decoder name, or `"Unknown"` when no decoder is available.
    pub codec_name: String,
    /// Descriptive decoder name, or `"Unknown"`.
    pub codec_long_name: String,
    pub time_base: Rational,
    /// Set for video streams only.
    pub video: Option<VideoParams>,
    /// Set for audio streams only.
    pub audio: Option<AudioParams>,
}

impl StreamDescriptor {
    /**
        Returns true if this is a video stream.
    */
    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    /**
        Returns the frame rate as frames per second, or 0.0 when unknown.
    */
    pub fn frames_per_second(&self) -> f64 {
        match self.video {
            Some(video) if video.frame_rate.den != 0 => video.frame_rate.to_f64(),
            _ => 0.0,
        }
    }
}

impl fmt::Display for StreamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stream #{} - {}:", self.index, self.kind)?;
        write!(f, "  Codec: {} ({})", self.codec_name, self.codec_long_name)?;
        if let Some(video) = self.video {
            write!(f, "\n  Resolution: {}x{}", video.width, video.height)?;
            write!(f, "\n  Frame Rate: {:.3} fps", self.frames_per_second())?;
        }
        if let Some(audio) = self.audio {
            write!(f, "\n  Sample Rate: {} Hz", audio.sample_rate)?;
            write!(f, "\n  Channels: {}", audio.channels)?;
        }
        Ok(())
    }
}
