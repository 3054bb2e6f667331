/*!
    Raw pixel frame types.
*/

use crate::{Error, PixelFormat, Result};

/**
    One plane of pixel data.

    `stride` is the number of bytes between the starts of two consecutive rows.
    Frames built by this crate are tightly packed, so `stride` equals the row
    width in bytes.
*/
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Plane {
    data: Vec<u8>,
    stride: usize,
}

impl Plane {
    /**
        Returns the raw bytes of this plane.
    */
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /**
        Returns the raw bytes of this plane, mutably.
    */
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /**
        Returns the number of bytes per row.
    */
    pub fn stride(&self) -> usize {
        self.stride
    }

    /**
        Returns the number of rows in this plane.
    */
    pub fn rows(&self) -> usize {
        if self.stride == 0 {
            0
        } else {
            self.data.len() / self.stride
        }
    }

    /**
        Returns row `y`, or `None` if it is out of range.
    */
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        let start = y.checked_mul(self.stride)?;
        self.data.get(start..start + self.stride)
    }

    /**
        Returns row `y` mutably, or `None` if it is out of range.
    */
    pub fn row_mut(&mut self, y: usize) -> Option<&mut [u8]> {
        let start = y.checked_mul(self.stride)?;
        self.data.get_mut(start..start + self.stride)
    }

    fn reshape(&mut self, stride: usize, rows: usize) {
        self.stride = stride;
        self.data.resize(stride * rows, 0);
    }
}

/**
    A raw video frame.

    Holds one [`Plane`] per plane of its [`PixelFormat`]. Frames are reused:
    the decode loop owns a single frame and rewrites it for every decoded
    picture, so a `&Frame` handed to a stage is only valid for the duration
    of that call. Stages that need the pixels later must clone them.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    format: PixelFormat,
    planes: Vec<Plane>,
}

impl Frame {
    /**
        Create a new zero-filled, tightly packed frame.
    */
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let mut frame = Self {
            width: 0,
            height: 0,
            format,
            planes: Vec::new(),
        };
        frame.reshape(width, height, format);
        frame
    }

    /**
        Create an RGB24 frame filled with a single colour.
    */
    pub fn solid_rgb(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut frame = Self::new(width, height, PixelFormat::Rgb24);
        for pixel in frame.planes[0].data.chunks_exact_mut(3) {
            pixel.copy_from_slice(&rgb);
        }
        frame
    }

    /**
        Create a frame from already-packed plane data.

        Each plane must hold exactly `row_bytes * rows` bytes for its position
        in `format`.
    */
    pub fn from_planes(
        width: u32,
        height: u32,
        format: PixelFormat,
        planes: Vec<Vec<u8>>,
    ) -> Result<Self> {
        if planes.len() != format.plane_count() {
            return Err(Error::invalid_data(format!(
                "{format} needs {} planes, got {}",
                format.plane_count(),
                planes.len()
            )));
        }

        let mut packed = Vec::with_capacity(planes.len());
        for (index, data) in planes.into_iter().enumerate() {
            let (stride, rows) = format
                .plane_geometry(index, width, height)
                .ok_or_else(|| Error::invalid_data(format!("{format} has no plane {index}")))?;
            if data.len() != stride * rows {
                return Err(Error::invalid_data(format!(
                    "plane {index} of a {width}x{height} {format} frame needs {} bytes, got {}",
                    stride * rows,
                    data.len()
                )));
            }
            packed.push(Plane { data, stride });
        }

        Ok(Self {
            width,
            height,
            format,
            planes: packed,
        })
    }

    /**
        Change the geometry and format of this frame in place.

        Existing allocations are reused where possible. Pixel contents are
        unspecified afterwards and must be rewritten by the caller.
    */
    pub fn reshape(&mut self, width: u32, height: u32, format: PixelFormat) {
        self.width = width;
        self.height = height;
        self.format = format;
        self.planes.resize_with(format.plane_count(), Plane::default);
        for (index, plane) in self.planes.iter_mut().enumerate() {
            if let Some((stride, rows)) = format.plane_geometry(index, width, height) {
                plane.reshape(stride, rows);
            }
        }
    }

    /**
        Returns the frame width in pixels.
    */
    pub fn width(&self) -> u32 {
        self.width
    }

    /**
        Returns the frame height in pixels.
    */
    pub fn height(&self) -> u32 {
        self.height
    }

    /**
        Returns the pixel format of the data.
    */
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /**
        Returns all planes, in format order.
    */
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /**
        Returns plane `index`, if the format has one.
    */
    pub fn plane(&self, index: usize) -> Option<&Plane> {
        self.planes.get(index)
    }

    /**
        Returns plane `index` mutably, if the format has one.
    */
    pub fn plane_mut(&mut self, index: usize) -> Option<&mut Plane> {
        self.planes.get_mut(index)
    }

    /**
        Returns the RGB value at `(x, y)` of an RGB24 frame.

        Returns `None` for other formats or out-of-range coordinates.
    */
    pub fn rgb_at(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if self.format != PixelFormat::Rgb24 || x >= self.width || y >= self.height {
            return None;
        }
        let row = self.planes[0].row(y as usize)?;
        let offset = x as usize * 3;
        Some([row[offset], row[offset + 1], row[offset + 2]])
    }

    /**
        Returns the most frequent colour of an RGB24 frame.

        Returns `None` for other formats or empty frames.
    */
    pub fn dominant_rgb(&self) -> Option<[u8; 3]> {
        if self.format != PixelFormat::Rgb24 {
            return None;
        }

        let mut counts = std::collections::HashMap::<[u8; 3], usize>::new();
        for pixel in self.planes[0].data.chunks_exact(3) {
            *counts.entry([pixel[0], pixel[1], pixel[2]]).or_default() += 1;
        }

        counts
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .map(|(rgb, _)| rgb)
    }
}

// Frames move between stages by reference, and across threads by callers
static_assertions::assert_impl_all!(Frame: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_frame_is_tightly_packed() {
        let frame = Frame::new(4, 2, PixelFormat::Rgb24);
        assert_eq!(frame.planes().len(), 1);
        assert_eq!(frame.planes()[0].stride(), 12);
        assert_eq!(frame.planes()[0].rows(), 2);
        assert!(frame.planes()[0].data().iter().all(|&b| b == 0));
    }

    #[test]
    fn planar_frame_has_three_planes() {
        let frame = Frame::new(6, 4, PixelFormat::Yuv420p);
        let strides: Vec<_> = frame.planes().iter().map(Plane::stride).collect();
        let rows: Vec<_> = frame.planes().iter().map(Plane::rows).collect();
        assert_eq!(strides, vec![6, 3, 3]);
        assert_eq!(rows, vec![4, 2, 2]);
    }

    #[test]
    fn solid_rgb_fills_every_pixel() {
        let frame = Frame::solid_rgb(3, 3, [10, 20, 30]);
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(frame.rgb_at(x, y), Some([10, 20, 30]));
            }
        }
        assert_eq!(frame.rgb_at(3, 0), None);
    }

    #[test]
    fn reshape_reuses_and_resizes() {
        let mut frame = Frame::solid_rgb(8, 8, [1, 2, 3]);
        frame.reshape(2, 2, PixelFormat::Yuv444p);
        assert_eq!(frame.format(), PixelFormat::Yuv444p);
        assert_eq!(frame.planes().len(), 3);
        assert!(frame.planes().iter().all(|p| p.data().len() == 4));

        frame.reshape(4, 1, PixelFormat::Rgb24);
        assert_eq!(frame.planes().len(), 1);
        assert_eq!(frame.planes()[0].data().len(), 12);
    }

    #[test]
    fn from_planes_validates_sizes() {
        let ok = Frame::from_planes(2, 2, PixelFormat::Gray8, vec![vec![7; 4]]);
        assert!(ok.is_ok());

        let wrong_len = Frame::from_planes(2, 2, PixelFormat::Gray8, vec![vec![7; 3]]);
        assert!(matches!(wrong_len, Err(Error::InvalidData { .. })));

        let wrong_count = Frame::from_planes(2, 2, PixelFormat::Yuv420p, vec![vec![0; 4]]);
        assert!(matches!(wrong_count, Err(Error::InvalidData { .. })));
    }

    #[test]
    fn dominant_rgb_picks_majority() {
        let mut frame = Frame::solid_rgb(4, 1, [200, 0, 0]);
        frame.plane_mut(0).unwrap().row_mut(0).unwrap()[..3].copy_from_slice(&[0, 0, 255]);
        assert_eq!(frame.dominant_rgb(), Some([200, 0, 0]));
        assert_eq!(Frame::new(2, 2, PixelFormat::Gray8).dominant_rgb(), None);
    }

    #[test]
    fn rgb_at_rejects_other_formats() {
        let frame = Frame::new(2, 2, PixelFormat::Bgr24);
        assert_eq!(frame.rgb_at(0, 0), None);
    }
}
