/*!
    Stage that writes sampled frames to still image files.
*/

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::{
    ExtendedColorType, ImageEncoder,
    codecs::{
        jpeg::JpegEncoder,
        png::PngEncoder,
        pnm::{PnmEncoder, PnmSubtype, SampleEncoding},
    },
};
use tracing::{debug, info};

use framepipe_types::{Error, Frame, PixelFormat, Result, TransformStage};

use crate::VideoConverter;

const JPEG_QUALITY: u8 = 90;

/**
    Still image file format written by [`PersistStage`].
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ImageKind {
    /// Binary RGB pixmap (`P6`).
    #[default]
    Ppm,
    Png,
    Jpeg,
}

impl ImageKind {
    /**
        File extension used for this format.
    */
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Ppm => "ppm",
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/**
    Saves every `interval`-th frame as an image file.

    Frame `n` is saved when `n % interval == 0`, as
    `dir/frame_{n:05}.{ext}`. Frames in other formats are converted to RGB24
    first. This is a terminal stage: nothing is forwarded.
*/
pub struct PersistStage {
    dir: PathBuf,
    interval: u64,
    kind: ImageKind,
    converter: VideoConverter,
    rgb: Frame,
    saved: usize,
}

impl PersistStage {
    /**
        Create the stage, creating `dir` (and parents) if needed.

        An `interval` of 0 is treated as 1.
    */
    pub fn new(dir: impl Into<PathBuf>, interval: u64, kind: ImageKind) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            Error::io(format!("could not create directory {}: {e}", dir.display()))
        })?;

        Ok(Self {
            dir,
            interval: interval.max(1),
            kind,
            converter: VideoConverter::new(PixelFormat::Rgb24),
            rgb: Frame::new(0, 0, PixelFormat::Rgb24),
            saved: 0,
        })
    }

    /**
        Directory images are written to.
    */
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /**
        Effective save interval (never 0).
    */
    pub fn interval(&self) -> u64 {
        self.interval
    }

    /**
        Number of images written so far.
    */
    pub fn saved_count(&self) -> usize {
        self.saved
    }

    /**
        Path the image for `frame_number` is written to.
    */
    pub fn path_for(&self, frame_number: u64) -> PathBuf {
        self.dir
            .join(format!("frame_{frame_number:05}.{}", self.kind.extension()))
    }

    fn write_image(&self, frame: &Frame, path: &Path) -> Result<()> {
        let plane = frame
            .plane(0)
            .ok_or_else(|| Error::invalid_data("frame has no pixel data"))?;
        let (width, height) = (frame.width(), frame.height());

        let file = File::create(path)?;
        let writer = BufWriter::new(file);

        let encoded = match self.kind {
            ImageKind::Ppm => PnmEncoder::new(writer)
                .with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary))
                .write_image(plane.data(), width, height, ExtendedColorType::Rgb8),
            ImageKind::Png => PngEncoder::new(writer).write_image(
                plane.data(),
                width,
                height,
                ExtendedColorType::Rgb8,
            ),
            ImageKind::Jpeg => JpegEncoder::new_with_quality(writer, JPEG_QUALITY).write_image(
                plane.data(),
                width,
                height,
                ExtendedColorType::Rgb8,
            ),
        };

        encoded.map_err(|e| Error::io(format!("could not write {}: {e}", path.display())))
    }
}

impl TransformStage for PersistStage {
    fn process(&mut self, frame: &Frame, frame_number: u64) -> Result<()> {
        if frame_number % self.interval != 0 {
            return Ok(());
        }

        let path = self.path_for(frame_number);

        if frame.format() == PixelFormat::Rgb24 {
            self.write_image(frame, &path)?;
        } else {
            let mut rgb = std::mem::replace(&mut self.rgb, Frame::new(0, 0, PixelFormat::Rgb24));
            let result = self
                .converter
                .convert(frame, &mut rgb)
                .and_then(|()| self.write_image(&rgb, &path));
            self.rgb = rgb;
            result?;
        }

        self.saved += 1;
        debug!(frame_number, path = %path.display(), "saved frame");
        if self.saved == 1 {
            info!(dir = %self.dir.display(), kind = ?self.kind, "saving frames");
        }

        Ok(())
    }
}

impl std::fmt::Debug for PersistStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistStage")
            .field("dir", &self.dir)
            .field("interval", &self.interval)
            .field("kind", &self.kind)
            .field("saved", &self.saved)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn saves_every_nth_frame() {
        let tmp = tempfile::tempdir().unwrap();
        let mut stage = PersistStage::new(tmp.path(), 3, ImageKind::Ppm).unwrap();
        let frame = Frame::solid_rgb(4, 2, [10, 20, 30]);

        for n in 0..10 {
            stage.process(&frame, n).unwrap();
        }

        // ceil(10 / 3)
        assert_eq!(stage.saved_count(), 4);
        assert_eq!(
            files_in(tmp.path()),
            vec![
                "frame_00000.ppm",
                "frame_00003.ppm",
                "frame_00006.ppm",
                "frame_00009.ppm"
            ]
        );
    }

    #[test]
    fn ppm_is_binary_pixmap() {
        let tmp = tempfile::tempdir().unwrap();
        let mut stage = PersistStage::new(tmp.path(), 1, ImageKind::Ppm).unwrap();
        stage.process(&Frame::solid_rgb(2, 2, [1, 2, 3]), 0).unwrap();

        let bytes = fs::read(stage.path_for(0)).unwrap();
        assert!(bytes.starts_with(b"P6"));
        assert_eq!(&bytes[bytes.len() - 12..], &[1, 2, 3].repeat(4)[..]);
    }

    #[test]
    fn zero_interval_saves_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let mut stage = PersistStage::new(tmp.path(), 0, ImageKind::Png).unwrap();
        assert_eq!(stage.interval(), 1);
        for n in 0..3 {
            stage.process(&Frame::solid_rgb(2, 2, [0, 0, 0]), n).unwrap();
        }
        assert_eq!(stage.saved_count(), 3);
        assert!(stage.path_for(2).exists());
    }

    #[test]
    fn non_rgb_frames_are_converted() {
        let tmp = tempfile::tempdir().unwrap();
        let mut stage = PersistStage::new(tmp.path(), 1, ImageKind::Jpeg).unwrap();
        let gray = Frame::from_planes(8, 8, PixelFormat::Gray8, vec![vec![128; 64]]).unwrap();
        stage.process(&gray, 0).unwrap();

        let bytes = fs::read(stage.path_for(0)).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn creates_missing_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        let stage = PersistStage::new(&nested, 5, ImageKind::Png).unwrap();
        assert!(nested.is_dir());
        assert_eq!(stage.dir(), nested.as_path());
    }

    #[test]
    fn unwritable_directory_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("not_a_dir");
        fs::write(&file, b"x").unwrap();
        let err = PersistStage::new(file.join("sub"), 1, ImageKind::Ppm).unwrap_err();
        assert!(err.is_io(), "{err}");
    }
}
