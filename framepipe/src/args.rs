use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use framepipe_encode::DEFAULT_CODEC;
use framepipe_transform::{FilterStage, ImageKind};

#[derive(Parser, Debug)]
#[command(name = "framepipe")]
#[command(about = "Decode, filter, save and re-encode video frames")]
pub struct Args {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print container and stream information
    Info {
        /// Input media file
        input: PathBuf,
    },

    /// Decode frames and log each one
    Frames {
        /// Input media file
        input: PathBuf,

        #[command(flatten)]
        decode: DecodeArgs,
    },

    /// Save sampled frames as image files
    Extract {
        /// Input media file
        input: PathBuf,

        /// Directory to write images to
        #[arg(short, long, default_value = "frames")]
        output: PathBuf,

        /// Save every Nth frame
        #[arg(short, long, default_value = "30")]
        interval: u64,

        /// Image format
        #[arg(short, long, value_enum, default_value = "ppm")]
        format: ImageFormat,

        #[command(flatten)]
        decode: DecodeArgs,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Re-encode the video stream into a new file
    Transcode {
        /// Input media file
        input: PathBuf,

        /// Output file; the extension selects the container
        output: PathBuf,

        /// FFmpeg encoder name
        #[arg(long, default_value = DEFAULT_CODEC)]
        codec: String,

        /// Output frame rate (defaults to the input rate)
        #[arg(long)]
        fps: Option<f64>,

        /// Target bit rate in bits per second
        #[arg(long)]
        bit_rate: Option<usize>,

        #[command(flatten)]
        decode: DecodeArgs,

        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(clap::Args, Debug)]
pub struct DecodeArgs {
    /// Stream index to decode (defaults to the best video stream)
    #[arg(short, long)]
    pub stream: Option<usize>,

    /// Stop after this many frames (0 = all)
    #[arg(short = 'n', long)]
    pub max_frames: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub struct FilterArgs {
    /// Convert frames to grayscale
    #[arg(long, conflicts_with_all = ["brightness", "contrast"])]
    pub grayscale: bool,

    /// Brightness adjustment (eq filter)
    #[arg(long, allow_negative_numbers = true)]
    pub brightness: Option<f64>,

    /// Contrast adjustment (eq filter)
    #[arg(long, allow_negative_numbers = true)]
    pub contrast: Option<f64>,

    /// Custom FFmpeg filter description
    #[arg(long, conflicts_with_all = ["grayscale", "brightness", "contrast"])]
    pub filter: Option<String>,
}

impl FilterArgs {
    /**
        Build the filter stage these arguments describe, if any.
    */
    pub fn stage<'a>(&self) -> Option<FilterStage<'a>> {
        if let Some(description) = &self.filter {
            return Some(FilterStage::new(description.clone(), None));
        }
        if self.grayscale {
            return Some(FilterStage::grayscale(None));
        }
        if self.brightness.is_some() || self.contrast.is_some() {
            return Some(FilterStage::brightness_contrast(
                self.brightness.unwrap_or(0.0),
                self.contrast.unwrap_or(1.0),
                None,
            ));
        }
        None
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ImageFormat {
    Ppm,
    Png,
    Jpeg,
}

impl From<ImageFormat> for ImageKind {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Ppm => ImageKind::Ppm,
            ImageFormat::Png => ImageKind::Png,
            ImageFormat::Jpeg => ImageKind::Jpeg,
        }
    }
}
