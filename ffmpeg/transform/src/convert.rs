/*!
    Pixel format conversion backed by libswscale.
*/

use ffmpeg_next::{
    format::Pixel,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::frame::video::Video as VideoFrameFFmpeg,
};
use tracing::debug;

use framepipe_types::{Error, Frame, PixelFormat, Result};

use crate::bridge::{copy_from_ffmpeg, copy_to_ffmpeg, pixel_to_ffmpeg};

#[derive(Clone, Copy, PartialEq, Eq)]
struct Geometry {
    format: Pixel,
    width: u32,
    height: u32,
}

impl Geometry {
    fn of(frame: &VideoFrameFFmpeg) -> Self {
        Self {
            format: frame.format(),
            width: frame.width(),
            height: frame.height(),
        }
    }
}

/**
    Converts frames to a fixed target pixel format, optionally rescaling.

    The scaler is created lazily for the first input and recreated whenever
    the input format or size changes. When no target size is set the
    output keeps the input size.
*/
pub struct VideoConverter {
    target: PixelFormat,
    size: Option<(u32, u32)>,
    scaler: Option<(Geometry, ScalingContext)>,
    staging_in: Option<VideoFrameFFmpeg>,
    staging_out: VideoFrameFFmpeg,
}

impl VideoConverter {
    /**
        Create a converter that keeps the input size.
    */
    pub fn new(target: PixelFormat) -> Self {
        Self {
            target,
            size: None,
            scaler: None,
            staging_in: None,
            staging_out: VideoFrameFFmpeg::empty(),
        }
    }

    /**
        Create a converter that also scales to `width` x `height`.
    */
    pub fn with_size(target: PixelFormat, width: u32, height: u32) -> Self {
        Self {
            size: Some((width, height)),
            ..Self::new(target)
        }
    }

    /**
        Returns the output pixel format.
    */
    pub fn target(&self) -> PixelFormat {
        self.target
    }

    /**
        Returns true if `frame` is already in the output format and size.
    */
    pub fn is_passthrough(&self, frame: &Frame) -> bool {
        let (width, height) = self.output_size(frame.width(), frame.height());
        frame.format() == self.target && frame.width() == width && frame.height() == height
    }

    fn output_size(&self, width: u32, height: u32) -> (u32, u32) {
        self.size.unwrap_or((width, height))
    }

    fn scaler_for(&mut self, input: Geometry) -> Result<&mut ScalingContext> {
        let stale = !matches!(&self.scaler, Some((geometry, _)) if *geometry == input);
        if stale {
            let (width, height) = self.output_size(input.width, input.height);
            debug!(
                from = ?input.format,
                to = %self.target,
                width,
                height,
                "creating scaler"
            );
            let context = ScalingContext::get(
                input.format,
                input.width,
                input.height,
                pixel_to_ffmpeg(self.target),
                width,
                height,
                ScalingFlags::BILINEAR,
            )
            .map_err(|e| Error::conversion(e.to_string()))?;
            self.scaler = Some((input, context));
        }

        match &mut self.scaler {
            Some((_, context)) => Ok(context),
            None => Err(Error::conversion("scaler was not created")),
        }
    }

    /**
        Build the scaler for a known input ahead of the first frame.

        Fails with a conversion error if libswscale cannot convert between
        the two layouts.
    */
    pub fn prepare(&mut self, format: Pixel, width: u32, height: u32) -> Result<()> {
        self.scaler_for(Geometry {
            format,
            width,
            height,
        })
        .map(|_| ())
    }

    /**
        Convert an FFmpeg frame into `output`.

        `output` is allocated on first use and reused afterwards, as long
        as the output geometry stays the same.
    */
    pub fn run(&mut self, input: &VideoFrameFFmpeg, output: &mut VideoFrameFFmpeg) -> Result<()> {
        let geometry = Geometry::of(input);
        let (width, height) = self.output_size(geometry.width, geometry.height);
        let target = pixel_to_ffmpeg(self.target);

        // swscale only writes into an empty frame or one of the exact output shape
        if unsafe { !output.is_empty() }
            && (output.format() != target || output.width() != width || output.height() != height)
        {
            *output = VideoFrameFFmpeg::empty();
        }

        self.scaler_for(geometry)?
            .run(input, output)
            .map_err(|e| Error::conversion(e.to_string()))
    }

    /**
        Convert a pipeline frame into `output`.

        Frames already in the target layout are copied as-is.
    */
    pub fn convert(&mut self, input: &Frame, output: &mut Frame) -> Result<()> {
        if self.is_passthrough(input) {
            output.clone_from(input);
            return Ok(());
        }

        let format = pixel_to_ffmpeg(input.format());
        let reuse = matches!(
            &self.staging_in,
            Some(f) if f.format() == format
                && f.width() == input.width()
                && f.height() == input.height()
        );
        if !reuse {
            self.staging_in = Some(VideoFrameFFmpeg::new(format, input.width(), input.height()));
        }

        let mut staging_in = self
            .staging_in
            .take()
            .ok_or_else(|| Error::conversion("staging frame missing"))?;
        let mut staging_out = std::mem::replace(&mut self.staging_out, VideoFrameFFmpeg::empty());

        let result = copy_to_ffmpeg(input, &mut staging_in)
            .and_then(|()| self.run(&staging_in, &mut staging_out))
            .and_then(|()| copy_from_ffmpeg(&staging_out, output));

        self.staging_in = Some(staging_in);
        self.staging_out = staging_out;
        result
    }
}

impl std::fmt::Debug for VideoConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoConverter")
            .field("target", &self.target)
            .field("size", &self.size)
            .field("initialized", &self.scaler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [u8; 3], b: [u8; 3], tolerance: u8) -> bool {
        a.iter().zip(b).all(|(x, y)| x.abs_diff(y) <= tolerance)
    }

    #[test]
    fn passthrough_copies_without_scaler() {
        let mut converter = VideoConverter::new(PixelFormat::Rgb24);
        let input = Frame::solid_rgb(4, 4, [1, 2, 3]);
        let mut output = Frame::new(1, 1, PixelFormat::Gray8);
        converter.convert(&input, &mut output).unwrap();
        assert_eq!(output, input);
        assert!(converter.scaler.is_none());
    }

    #[test]
    fn rgb_to_yuv_and_back_keeps_colour() {
        let input = Frame::solid_rgb(16, 16, [200, 40, 40]);

        let mut to_yuv = VideoConverter::new(PixelFormat::Yuv420p);
        let mut yuv = Frame::new(1, 1, PixelFormat::Rgb24);
        to_yuv.convert(&input, &mut yuv).unwrap();
        assert_eq!(yuv.format(), PixelFormat::Yuv420p);
        assert_eq!(yuv.planes().len(), 3);

        let mut to_rgb = VideoConverter::new(PixelFormat::Rgb24);
        let mut rgb = Frame::new(1, 1, PixelFormat::Gray8);
        to_rgb.convert(&yuv, &mut rgb).unwrap();
        assert_eq!((rgb.width(), rgb.height()), (16, 16));
        let centre = rgb.rgb_at(8, 8).unwrap();
        assert!(close(centre, [200, 40, 40], 12), "{centre:?}");
    }

    #[test]
    fn scaling_converter_resizes() {
        let mut converter = VideoConverter::with_size(PixelFormat::Rgb24, 8, 6);
        let input = Frame::solid_rgb(16, 12, [0, 0, 255]);
        let mut output = Frame::new(1, 1, PixelFormat::Rgb24);
        converter.convert(&input, &mut output).unwrap();
        assert_eq!((output.width(), output.height()), (8, 6));
        assert!(close(output.rgb_at(4, 3).unwrap(), [0, 0, 255], 4));
    }

    #[test]
    fn geometry_change_rebuilds_scaler() {
        let mut converter = VideoConverter::new(PixelFormat::Gray8);
        let mut output = Frame::new(1, 1, PixelFormat::Gray8);

        converter
            .convert(&Frame::solid_rgb(8, 8, [255, 255, 255]), &mut output)
            .unwrap();
        assert_eq!((output.width(), output.height()), (8, 8));

        converter
            .convert(&Frame::solid_rgb(4, 2, [0, 0, 0]), &mut output)
            .unwrap();
        assert_eq!((output.width(), output.height()), (4, 2));
        assert!(output.plane(0).unwrap().data().iter().all(|&y| y < 32));
    }
}
