//! Streaming zlib adapter for compressed cels.
//!
//! Compressed output never lines up with scanlines, so both directions
//! work through fixed-size windows and drain the (de)compressor until it
//! has nothing more to give for the current input.

use std::cmp::min;
use std::io::{self,Read,Write};
use flate2::{Compress,Compression,Decompress,FlushCompress,FlushDecompress,Status};

use ::{AseError,AseResult,Image};

/// Size of the window used to read and write compressed bytes.
pub const ZLIB_BLOCK_SIZE: usize = 4096;

/// Largest ratio of inflated to deflated bytes that zlib can produce.
pub const ZLIB_MAX_RATIO: u64 = 1032;

/// Inflate `h` scanlines of `row_size` bytes each.
///
/// Compressed bytes are read in blocks until the end of the stream or
/// until `r` is exhausted, so `r` should be limited to the chunk.  The
/// output grows with the inflated data rather than with `h`.
pub fn inflate_rows<R: Read>(r: &mut R, h: usize, row_size: usize)
        -> AseResult<Vec<u8>> {
    let mut z = Decompress::new(true);
    let mut compressed = vec![0; ZLIB_BLOCK_SIZE];
    let mut scanline = vec![0; row_size.max(1)];
    let total = h * row_size;
    let mut uncompressed = Vec::with_capacity(min(total, ZLIB_BLOCK_SIZE));

    'input: loop {
        let n = read_block(r, &mut compressed)?;
        if n == 0 {
            break;
        }

        let mut input = &compressed[..n];
        loop {
            let in0 = z.total_in();
            let out0 = z.total_out();
            let status = z.decompress(input, &mut scanline, FlushDecompress::None)
                .map_err(|e| AseError::Compression(e.to_string()))?;
            let consumed = (z.total_in() - in0) as usize;
            let produced = (z.total_out() - out0) as usize;
            input = &input[consumed..];

            if produced > 0 {
                if uncompressed.len() + produced > total {
                    return Err(AseError::Compression("too much image data".to_string()));
                }

                uncompressed.extend_from_slice(&scanline[..produced]);
            }

            if status == Status::StreamEnd {
                break 'input;
            } else if produced < scanline.len() {
                break;
            }
        }
    }

    if uncompressed.len() < total {
        return Err(AseError::Compression(format!(
                "incomplete image data, {} of {} bytes", uncompressed.len(), total)));
    }

    Ok(uncompressed)
}

/// Deflate an image, one scanline at a time, finishing the stream on
/// the last scanline.
pub fn deflate_image<W: Write>(image: &Image, level: Compression, w: &mut W)
        -> AseResult<()> {
    let mut z = Compress::new(level, true);
    let mut scanline = vec![0; image.row_size()];
    let mut compressed = vec![0; ZLIB_BLOCK_SIZE];

    for y in 0..image.height() {
        image.encode_row(y, &mut scanline);

        let last = y + 1 == image.height();
        let flush = if last { FlushCompress::Finish } else { FlushCompress::None };
        let mut input = &scanline[..];

        loop {
            let in0 = z.total_in();
            let out0 = z.total_out();
            let status = z.compress(input, &mut compressed, flush)
                .map_err(|e| AseError::Compression(e.to_string()))?;
            let consumed = (z.total_in() - in0) as usize;
            let produced = (z.total_out() - out0) as usize;
            input = &input[consumed..];

            w.write_all(&compressed[..produced])?;

            let done = if last {
                status == Status::StreamEnd
            } else {
                input.is_empty() && produced < compressed.len()
            };

            if done {
                break;
            } else if consumed == 0 && produced == 0 {
                return Err(AseError::Compression("deflate stalled".to_string()));
            }
        }
    }

    Ok(())
}

/// Fill `buf` from `r`, stopping early only at the end of input.
fn read_block<R: Read>(r: &mut R, buf: &mut [u8])
        -> AseResult<usize> {
    let mut n = 0;
    while n < buf.len() {
        match r.read(&mut buf[n..]) {
            Ok(0) => break,
            Ok(k) => n = n + k,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor,Read};
    use flate2::Compression;
    use ::{Image,PixelFormat,Pixels};
    use super::*;

    fn gradient(w: usize, h: usize) -> Image {
        let buf = (0..(w * h)).map(|i| (i % 251) as u8).collect();
        Image::from_pixels(w, h, Pixels::Indexed(buf)).expect("image")
    }

    #[test]
    fn test_deflate_inflate_large_image() {
        // Several compressed blocks, and rows that straddle them.
        let image = gradient(333, 97);
        let mut enc = Cursor::new(Vec::new());
        deflate_image(&image, Compression::default(), &mut enc).expect("deflate");

        let mut r = Cursor::new(enc.into_inner());
        let raw = inflate_rows(&mut r, 97, 333).expect("inflate");

        let mut decoded = Image::new(PixelFormat::Indexed, 333, 97);
        for (y, row) in raw.chunks(333).enumerate() {
            decoded.decode_row(y, row);
        }
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_inflate_stops_at_reader_limit() {
        let image = gradient(16, 16);
        let mut enc = Cursor::new(Vec::new());
        deflate_image(&image, Compression::best(), &mut enc).expect("deflate");

        let mut bytes = enc.into_inner();
        let len = bytes.len() as u64;
        bytes.extend_from_slice(&[0xAA; 32]);

        let mut r = Cursor::new(&bytes[..]);
        let raw = inflate_rows(&mut (&mut r).take(len), 16, 16).expect("inflate");
        assert_eq!(raw.len(), 256);
        assert_eq!(r.position(), len);
    }

    #[test]
    fn test_inflate_truncated() {
        let image = gradient(64, 64);
        let mut enc = Cursor::new(Vec::new());
        deflate_image(&image, Compression::none(), &mut enc).expect("deflate");

        let bytes = enc.into_inner();
        let mut r = Cursor::new(&bytes[..(bytes.len() / 2)]);
        match inflate_rows(&mut r, 64, 64) {
            Err(AseError::Compression(_)) => (),
            res => panic!("unexpected {:?}", res.map(|v| v.len())),
        }
    }

    #[test]
    fn test_inflate_huge_declared_size() {
        let image = gradient(4, 4);
        let mut enc = Cursor::new(Vec::new());
        deflate_image(&image, Compression::default(), &mut enc).expect("deflate");

        let bytes = enc.into_inner();
        match inflate_rows(&mut Cursor::new(&bytes[..]), 0xFFFF, 0xFFFF * 4) {
            Err(AseError::Compression(_)) => (),
            res => panic!("unexpected {:?}", res.map(|v| v.len())),
        }
    }

    #[test]
    fn test_inflate_garbage() {
        let bytes = [0xFF; 100];
        match inflate_rows(&mut Cursor::new(&bytes[..]), 4, 4) {
            Err(AseError::Compression(_)) => (),
            res => panic!("unexpected {:?}", res.map(|v| v.len())),
        }
    }
}
