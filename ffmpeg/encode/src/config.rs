/*!
    Encoder configuration types.
*/

use std::path::PathBuf;

use framepipe_types::{Error, Rational, Result};

/// Encoder used when none is given.
pub const DEFAULT_CODEC: &str = "libx264";

/**
    Configuration for an [`EncodeSession`](crate::EncodeSession).

    The container format is chosen from the extension of `path`.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct EncoderConfig {
    /// Output file; its extension selects the container.
    pub path: PathBuf,
    /// Encoded width in pixels.
    pub width: u32,
    /// Encoded height in pixels.
    pub height: u32,
    /// Frames per second. The encoder time base is its inverse.
    pub frame_rate: Rational,
    /// FFmpeg encoder name (e.g. `libx264`, `mpeg4`).
    pub codec: String,
    /// Target bit rate in bits per second. H.264 defaults to `width * height * 4`.
    pub bit_rate: Option<usize>,
}

impl EncoderConfig {
    /**
        Create a config with 30 fps and the default encoder.
    */
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            width,
            height,
            frame_rate: Rational::new(30, 1),
            codec: DEFAULT_CODEC.to_string(),
            bit_rate: None,
        }
    }

    /**
        Set the frame rate.
    */
    pub fn with_frame_rate(mut self, frame_rate: Rational) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /**
        Set the encoder by FFmpeg name.
    */
    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = codec.into();
        self
    }

    /**
        Set the target bit rate.
    */
    pub fn with_bit_rate(mut self, bit_rate: usize) -> Self {
        self.bit_rate = Some(bit_rate);
        self
    }

    /**
        Time base of the encoder, one tick per frame.

        # Panics

        Panics if the frame rate is zero.
    */
    pub fn time_base(&self) -> Rational {
        self.frame_rate.invert()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::invalid_data(format!(
                "invalid output size {}x{}",
                self.width, self.height
            )));
        }
        if !self.frame_rate.is_positive() {
            return Err(Error::invalid_data(format!(
                "invalid frame rate {}",
                self.frame_rate
            )));
        }
        Ok(())
    }
}
