/*!
    Moving pixels between pipeline frames and FFmpeg frames.
*/

use ffmpeg_next::{format::Pixel, util::frame::video::Video as VideoFrameFFmpeg};

use framepipe_types::{Error, Frame, PixelFormat, Result};

/**
    Convert our pixel format to the FFmpeg equivalent.
*/
pub fn pixel_to_ffmpeg(format: PixelFormat) -> Pixel {
    match format {
        PixelFormat::Rgb24 => Pixel::RGB24,
        PixelFormat::Bgr24 => Pixel::BGR24,
        PixelFormat::Rgba => Pixel::RGBA,
        PixelFormat::Bgra => Pixel::BGRA,
        PixelFormat::Gray8 => Pixel::GRAY8,
        PixelFormat::Yuv420p => Pixel::YUV420P,
        PixelFormat::Yuv422p => Pixel::YUV422P,
        PixelFormat::Yuv444p => Pixel::YUV444P,
        PixelFormat::Nv12 => Pixel::NV12,
    }
}

/**
    Convert an FFmpeg pixel format to ours, if we have an equivalent.
*/
pub fn pixel_from_ffmpeg(format: Pixel) -> Option<PixelFormat> {
    match format {
        Pixel::RGB24 => Some(PixelFormat::Rgb24),
        Pixel::BGR24 => Some(PixelFormat::Bgr24),
        Pixel::RGBA => Some(PixelFormat::Rgba),
        Pixel::BGRA => Some(PixelFormat::Bgra),
        Pixel::GRAY8 => Some(PixelFormat::Gray8),
        Pixel::YUV420P => Some(PixelFormat::Yuv420p),
        Pixel::YUV422P => Some(PixelFormat::Yuv422p),
        Pixel::YUV444P => Some(PixelFormat::Yuv444p),
        Pixel::NV12 => Some(PixelFormat::Nv12),
        _ => None,
    }
}

/**
    Copy an FFmpeg frame into `frame`, reshaping it to match.

    FFmpeg rows are usually padded; the copy drops the padding so the
    result is tightly packed.
*/
pub fn copy_from_ffmpeg(source: &VideoFrameFFmpeg, frame: &mut Frame) -> Result<()> {
    let format = pixel_from_ffmpeg(source.format()).ok_or_else(|| {
        Error::conversion(format!("unsupported pixel format: {:?}", source.format()))
    })?;

    frame.reshape(source.width(), source.height(), format);

    for index in 0..format.plane_count() {
        let src = source.data(index);
        let src_stride = source.stride(index);
        let plane = frame
            .plane_mut(index)
            .ok_or_else(|| Error::conversion(format!("{format} has no plane {index}")))?;
        let row_bytes = plane.stride();

        for y in 0..plane.rows() {
            let start = y * src_stride;
            let src_row = src.get(start..start + row_bytes).ok_or_else(|| {
                Error::conversion(format!("plane {index} is shorter than its geometry"))
            })?;
            if let Some(dst_row) = plane.row_mut(y) {
                dst_row.copy_from_slice(src_row);
            }
        }
    }

    Ok(())
}

/**
    Copy `frame` into an FFmpeg frame of the same geometry and format.

    `target` must already be allocated with matching width, height and
    format; it is typically created with `Video::new`.
*/
pub fn copy_to_ffmpeg(frame: &Frame, target: &mut VideoFrameFFmpeg) -> Result<()> {
    if target.width() != frame.width()
        || target.height() != frame.height()
        || target.format() != pixel_to_ffmpeg(frame.format())
    {
        return Err(Error::conversion(format!(
            "target frame is {}x{} {:?}, source is {}x{} {}",
            target.width(),
            target.height(),
            target.format(),
            frame.width(),
            frame.height(),
            frame.format()
        )));
    }

    for (index, plane) in frame.planes().iter().enumerate() {
        let dst_stride = target.stride(index);
        let row_bytes = plane.stride();
        let dst = target.data_mut(index);

        for y in 0..plane.rows() {
            let start = y * dst_stride;
            let (Some(src_row), Some(dst_row)) =
                (plane.row(y), dst.get_mut(start..start + row_bytes))
            else {
                return Err(Error::conversion(format!(
                    "plane {index} does not fit the target frame"
                )));
            };
            dst_row.copy_from_slice(src_row);
        }
    }

    Ok(())
}
