/*!
    Pixel format types.
*/

use std::fmt;

/**
    Video pixel formats.

    This is the subset of formats the pipeline moves between stages.
    Not all FFmpeg pixel formats are represented.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Packed RGB, 24bpp
    Rgb24,
    /// Packed BGR, 24bpp
    Bgr24,
    /// Packed RGBA, 32bpp
    Rgba,
    /// Packed BGRA, 32bpp
    Bgra,
    /// Single-plane 8-bit luma
    Gray8,
    /// Planar YUV 4:2:0, 12bpp (most common video format)
    Yuv420p,
    /// Planar YUV 4:2:2, 16bpp
    Yuv422p,
    /// Planar YUV 4:4:4, 24bpp
    Yuv444p,
    /// Semi-planar YUV 4:2:0, 12bpp (common hardware decoder output)
    Nv12,
}

impl PixelFormat {
    /**
        Layout every decoded frame is converted to before entering the chain.
    */
    pub const CANONICAL_DECODE: Self = Self::Rgb24;

    /**
        Layout frames are converted to before being handed to a video encoder.
    */
    pub const CANONICAL_ENCODE: Self = Self::Yuv420p;

    /**
        Returns the number of separate data planes.
    */
    pub const fn plane_count(self) -> usize {
        match self {
            Self::Rgb24 | Self::Bgr24 | Self::Rgba | Self::Bgra | Self::Gray8 => 1,
            Self::Nv12 => 2,
            Self::Yuv420p | Self::Yuv422p | Self::Yuv444p => 3,
        }
    }

    /**
        Returns `(row_bytes, rows)` for the given plane of a tightly packed
        frame of this format, or `None` if the plane does not exist.

        Chroma dimensions round up, so odd sizes keep their last column/row.
    */
    pub const fn plane_geometry(
        self,
        plane: usize,
        width: u32,
        height: u32,
    ) -> Option<(usize, usize)> {
        if plane >= self.plane_count() {
            return None;
        }

        let w = width as usize;
        let h = height as usize;
        let half_w = w.div_ceil(2);
        let half_h = h.div_ceil(2);

        let geometry = match (self, plane) {
            (Self::Rgb24 | Self::Bgr24, _) => (w * 3, h),
            (Self::Rgba | Self::Bgra, _) => (w * 4, h),
            (Self::Gray8, _) => (w, h),
            (Self::Yuv420p | Self::Yuv422p | Self::Nv12, 0) | (Self::Yuv444p, _) => (w, h),
            (Self::Yuv420p, _) => (half_w, half_h),
            (Self::Yuv422p, _) => (half_w, h),
            (Self::Nv12, _) => (half_w * 2, half_h),
        };

        Some(geometry)
    }

    /**
        Returns the FFmpeg-style short name of this format (e.g. `rgb24`).
    */
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rgb24 => "rgb24",
            Self::Bgr24 => "bgr24",
            Self::Rgba => "rgba",
            Self::Bgra => "bgra",
            Self::Gray8 => "gray",
            Self::Yuv420p => "yuv420p",
            Self::Yuv422p => "yuv422p",
            Self::Yuv444p => "yuv444p",
            Self::Nv12 => "nv12",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_layouts_differ() {
        assert_eq!(PixelFormat::CANONICAL_DECODE, PixelFormat::Rgb24);
        assert_eq!(PixelFormat::CANONICAL_ENCODE, PixelFormat::Yuv420p);
        assert_ne!(PixelFormat::CANONICAL_DECODE, PixelFormat::CANONICAL_ENCODE);
    }

    #[test]
    fn yuv420p_geometry_rounds_chroma_up() {
        let f = PixelFormat::Yuv420p;
        assert_eq!(f.plane_geometry(0, 5, 3), Some((5, 3)));
        assert_eq!(f.plane_geometry(1, 5, 3), Some((3, 2)));
        assert_eq!(f.plane_geometry(2, 5, 3), Some((3, 2)));
        assert_eq!(f.plane_geometry(3, 5, 3), None);
    }

    #[test]
    fn nv12_interleaves_chroma() {
        let f = PixelFormat::Nv12;
        assert_eq!(f.plane_count(), 2);
        assert_eq!(f.plane_geometry(1, 4, 4), Some((4, 2)));
    }

    #[test]
    fn packed_formats_have_one_plane() {
        for format in [
            PixelFormat::Rgb24,
            PixelFormat::Bgr24,
            PixelFormat::Rgba,
            PixelFormat::Bgra,
            PixelFormat::Gray8,
        ] {
            assert_eq!(format.plane_count(), 1, "{format}");
        }
        assert_eq!(PixelFormat::Rgba.plane_geometry(0, 3, 2), Some((12, 2)));
    }

    #[test]
    fn names_match_ffmpeg() {
        assert_eq!(PixelFormat::Gray8.to_string(), "gray");
        assert_eq!(PixelFormat::Rgb24.to_string(), "rgb24");
    }
}
