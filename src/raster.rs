//! Raster implementation.
//!
//! An `Image` owns its pixels in one of three layouts, one per pixel
//! format.  Each layout carries its own row codec, which converts a
//! scanline to and from the byte order used on disk:
//!
//!   Format     | Bytes per pixel | Disk order
//!   ---------- | ---------------:| ----------
//!   RGBA       |               4 | r, g, b, a
//!   Grayscale  |               2 | value, alpha
//!   Indexed    |               1 | index

use ::{AseError,AseResult};

/// Pixel format of a sprite and all of its images.
#[derive(Clone,Copy,Debug,Eq,PartialEq)]
pub enum PixelFormat {
    Rgba,
    GrayAlpha,
    Indexed,
}

/// An RGBA pixel, also used for palette entries.
#[derive(Clone,Copy,Debug,Default,Eq,PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// A grayscale pixel with alpha.
#[derive(Clone,Copy,Debug,Default,Eq,PartialEq)]
pub struct GrayAlpha {
    pub v: u8,
    pub a: u8,
}

/// Pixel storage, one variant per pixel format.
#[derive(Clone,Debug,Eq,PartialEq)]
pub enum Pixels {
    Rgba(Vec<Rgba>),
    GrayAlpha(Vec<GrayAlpha>),
    Indexed(Vec<u8>),
}

/// An owned pixel buffer.
#[derive(Clone,Debug,Eq,PartialEq)]
pub struct Image {
    w: usize,
    h: usize,
    pixels: Pixels,
}

/*--------------------------------------------------------------*/

impl PixelFormat {
    /// Bits per pixel, as stored in the document header.
    pub fn depth(self) -> u16 {
        match self {
            PixelFormat::Rgba => 32,
            PixelFormat::GrayAlpha => 16,
            PixelFormat::Indexed => 8,
        }
    }

    /// Pixel format for the header's depth field.
    ///
    /// Anything that is not 32 or 16 bits per pixel is indexed.
    pub fn from_depth(depth: u16) -> Self {
        match depth {
            32 => PixelFormat::Rgba,
            16 => PixelFormat::GrayAlpha,
            _ => PixelFormat::Indexed,
        }
    }

    /// Number of bytes a pixel occupies on disk.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba => 4,
            PixelFormat::GrayAlpha => 2,
            PixelFormat::Indexed => 1,
        }
    }

    /// Number of bytes a scanline of width `w` occupies on disk.
    pub fn row_size(self, w: usize) -> usize {
        self.bytes_per_pixel() * w
    }
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba { r: r, g: g, b: b, a: a }
    }
}

impl GrayAlpha {
    pub fn new(v: u8, a: u8) -> Self {
        GrayAlpha { v: v, a: a }
    }
}

impl Pixels {
    fn new(format: PixelFormat, len: usize) -> Self {
        match format {
            PixelFormat::Rgba => Pixels::Rgba(vec![Rgba::default(); len]),
            PixelFormat::GrayAlpha => Pixels::GrayAlpha(vec![GrayAlpha::default(); len]),
            PixelFormat::Indexed => Pixels::Indexed(vec![0; len]),
        }
    }

    fn format(&self) -> PixelFormat {
        match *self {
            Pixels::Rgba(_) => PixelFormat::Rgba,
            Pixels::GrayAlpha(_) => PixelFormat::GrayAlpha,
            Pixels::Indexed(_) => PixelFormat::Indexed,
        }
    }
}

impl Image {
    /// Allocate a new image, cleared to zero.
    ///
    /// # Examples
    ///
    /// ```
    /// let image = ase::Image::new(ase::PixelFormat::Indexed, 4, 3);
    /// assert_eq!(image.row_size(), 4);
    /// ```
    pub fn new(format: PixelFormat, w: usize, h: usize) -> Self {
        Image {
            w: w,
            h: h,
            pixels: Pixels::new(format, w * h),
        }
    }

    /// Wrap existing pixels, stored in row-major order.
    pub fn from_pixels(w: usize, h: usize, pixels: Pixels)
            -> AseResult<Self> {
        let len = match pixels {
            Pixels::Rgba(ref v) => v.len(),
            Pixels::GrayAlpha(ref v) => v.len(),
            Pixels::Indexed(ref v) => v.len(),
        };

        if len != w * h {
            return Err(AseError::BadInput);
        }

        Ok(Image { w: w, h: h, pixels: pixels })
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn format(&self) -> PixelFormat {
        self.pixels.format()
    }

    pub fn pixels(&self) -> &Pixels {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut Pixels {
        &mut self.pixels
    }

    /// Number of bytes one encoded scanline occupies.
    pub fn row_size(&self) -> usize {
        self.format().row_size(self.w)
    }

    /// Decode scanline `y` from its on-disk bytes.
    pub fn decode_row(&mut self, y: usize, src: &[u8]) {
        assert!(y < self.h);
        assert!(src.len() >= self.row_size());

        let start = self.w * y;
        let end = start + self.w;
        match self.pixels {
            Pixels::Rgba(ref mut buf) =>
                for (dst, c) in buf[start..end].iter_mut().zip(src.chunks(4)) {
                    *dst = Rgba::new(c[0], c[1], c[2], c[3]);
                },
            Pixels::GrayAlpha(ref mut buf) =>
                for (dst, c) in buf[start..end].iter_mut().zip(src.chunks(2)) {
                    *dst = GrayAlpha::new(c[0], c[1]);
                },
            Pixels::Indexed(ref mut buf) =>
                buf[start..end].copy_from_slice(&src[0..self.w]),
        }
    }

    /// Encode scanline `y` into its on-disk bytes.
    pub fn encode_row(&self, y: usize, dst: &mut [u8]) {
        assert!(y < self.h);
        assert!(dst.len() >= self.row_size());

        let start = self.w * y;
        let end = start + self.w;
        match self.pixels {
            Pixels::Rgba(ref buf) =>
                for (c, d) in buf[start..end].iter().zip(dst.chunks_mut(4)) {
                    d[0] = c.r;
                    d[1] = c.g;
                    d[2] = c.b;
                    d[3] = c.a;
                },
            Pixels::GrayAlpha(ref buf) =>
                for (c, d) in buf[start..end].iter().zip(dst.chunks_mut(2)) {
                    d[0] = c.v;
                    d[1] = c.a;
                },
            Pixels::Indexed(ref buf) =>
                dst[0..self.w].copy_from_slice(&buf[start..end]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth() {
        assert_eq!(PixelFormat::from_depth(32), PixelFormat::Rgba);
        assert_eq!(PixelFormat::from_depth(16), PixelFormat::GrayAlpha);
        assert_eq!(PixelFormat::from_depth(8), PixelFormat::Indexed);
        assert_eq!(PixelFormat::from_depth(0), PixelFormat::Indexed);
        assert_eq!(PixelFormat::Rgba.depth(), 32);
    }

    #[test]
    fn test_decode_row_rgba() {
        let src = [
            0x01, 0x02, 0x03, 0x04,
            0x11, 0x12, 0x13, 0x14 ];

        let mut image = Image::new(PixelFormat::Rgba, 2, 2);
        image.decode_row(1, &src);

        match *image.pixels() {
            Pixels::Rgba(ref buf) => {
                assert_eq!(buf[0], Rgba::default());
                assert_eq!(buf[2], Rgba::new(0x01, 0x02, 0x03, 0x04));
                assert_eq!(buf[3], Rgba::new(0x11, 0x12, 0x13, 0x14));
            },
            _ => panic!("wrong layout"),
        }
    }

    #[test]
    fn test_encode_row_gray() {
        let pixels = Pixels::GrayAlpha(vec![
            GrayAlpha::new(10, 255), GrayAlpha::new(20, 128),
            GrayAlpha::new(30, 0), GrayAlpha::new(40, 64) ]);
        let image = Image::from_pixels(2, 2, pixels).expect("image");

        let mut row = [0; 4];
        image.encode_row(1, &mut row);
        assert_eq!(row, [30, 0, 40, 64]);
    }

    #[test]
    fn test_from_pixels_wrong_size() {
        let res = Image::from_pixels(3, 3, Pixels::Indexed(vec![0; 8]));
        assert!(res.is_err());
    }
}
