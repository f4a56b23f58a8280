//! ASE implementation.
//!
//! An ASE document is a 128-byte header followed by one frame chunk
//! per frame.  Each frame chunk holds a 16-byte frame header and a
//! list of data chunks, described in the `codec` module.

use std::cmp::{max,min};
use std::fs::File;
use std::io::{BufReader,BufWriter,Cursor,Read,Seek,SeekFrom,Write};
use std::path::Path;
use byteorder::LittleEndian as LE;
use byteorder::{ReadBytesExt,WriteBytesExt};

use ::{AseError,AseResult,FileOp,PixelFormat,Sprite};
use codec::*;

/// Magic for an ASE file.
///
/// The file begins with a 128-byte header.  All values are little
/// endian:
///
///   Offset | Length |    Name     | Description
///   ------:| ------:|:-----------:| -----------------------------------
///        0 |      4 |    size     | The size of the entire file, including this header.
///        4 |      2 |    magic    | File format identifier.  Always 0xA5E0.
///        6 |      2 |   frames    | Number of frames.
///        8 |      2 |    width    | Sprite width in pixels.
///       10 |      2 |   height    | Sprite height in pixels.
///       12 |      2 |    depth    | Bits per pixel: 32 = RGBA, 16 = grayscale, 8 = indexed.
///       14 |      4 |    flags    | Set to 0.
///       18 |      2 |    speed    | Default frame duration in milliseconds.
///       20 |      4 |    next     | Set to 0.
///       24 |      4 |    frit     | Set to 0.
///       28 |      1 | transparent | Transparent palette index.
///       29 |      3 |  reserved   | Set to zeroes.
///       32 |      2 |   ncolors   | Palette size.  0 means 256.
///       34 |     94 |  reserved   | Set to zeroes.
pub const ASE_FILE_MAGIC: u16 = 0xA5E0;

/// Size of an ASE file header on disk.
pub const SIZE_OF_ASE_HEADER: usize = 128;

/// Magic for an ASE frame.
///
///   Offset | Length |   Name   | Description
///   ------:| ------:|:--------:| -----------------------------------
///        0 |      4 |   size   | The size of the frame, including this header and all its chunks.
///        4 |      2 |   magic  | Frame identifier.  Always 0xF1FA.
///        6 |      2 |  chunks  | Number of chunks in the frame.
///        8 |      2 | duration | Frame duration in milliseconds, or 0 for the header speed.
///       10 |      6 | reserved | Set to zeroes.
pub const ASE_FRAME_MAGIC: u16 = 0xF1FA;

/// Size of an ASE frame header on disk.
pub const SIZE_OF_ASE_FRAME: usize = 16;

/// ASE header.
struct AseHeader {
    size: u32,
    frames: u16,
    w: u16,
    h: u16,
    depth: u16,
    speed: u16,
    transparent_index: u8,
    ncolors: u16,
}

/// ASE frame header.
struct FrameHeader {
    size: u32,
    magic: u16,
    chunks: u16,
    duration: u16,
}

/// Writer for a single frame.
///
/// Reserves the frame header on creation, counts the chunks written
/// through it, and fills in the header when finished.  Only one frame
/// can be open at a time since it holds the writer.
struct FrameWriter<'a, W: 'a> {
    w: &'a mut W,
    start: u64,
    chunks: u16,
    duration: u16,
}

/*--------------------------------------------------------------*/

impl<'a, W: Write + Seek> FrameWriter<'a, W> {
    fn begin(w: &'a mut W, duration: u16)
            -> AseResult<Self> {
        let start = w.seek(SeekFrom::Current(0))?;
        w.write_all(&[0; SIZE_OF_ASE_FRAME])?;

        Ok(FrameWriter {
            w: w,
            start: start,
            chunks: 0,
            duration: duration,
        })
    }

    /// Write one chunk, `f` writing its body.
    fn chunk<F>(&mut self, magic: u16, f: F)
            -> AseResult<()>
            where F: FnOnce(&mut W) -> AseResult<()> {
        if self.chunks == ::std::u16::MAX {
            return Err(AseError::ExceededLimit);
        }

        let mark = open_chunk(&mut *self.w, magic)?;
        f(&mut *self.w)?;
        close_chunk(&mut *self.w, mark)?;

        self.chunks = self.chunks + 1;
        Ok(())
    }

    /// Fill in the frame header.  Returns the size of the frame.
    fn finish(self)
            -> AseResult<u64> {
        let end = self.w.seek(SeekFrom::Current(0))?;
        let size = end - self.start;
        if size > ::std::u32::MAX as u64 {
            return Err(AseError::ExceededLimit);
        }

        let hdr = FrameHeader {
            size: size as u32,
            magic: ASE_FRAME_MAGIC,
            chunks: self.chunks,
            duration: self.duration,
        };

        self.w.seek(SeekFrom::Start(self.start))?;
        write_frame_header(&hdr, &mut *self.w)?;
        self.w.seek(SeekFrom::Start(end))?;

        Ok(size)
    }
}

/*--------------------------------------------------------------*/

/// Load an ASE file.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
///
/// let mut fop = ase::FileOp::new();
/// if let Ok(sprite) = ase::load_ase(Path::new("ex.ase"), &mut fop) {
///     println!("{}x{}, {} frames", sprite.width(), sprite.height(), sprite.total_frames());
/// }
/// ```
pub fn load_ase(filename: &Path, fop: &mut FileOp)
        -> AseResult<Sprite> {
    if !filename.exists() {
        return Err(AseError::NoFile);
    } else if !filename.is_file() {
        return Err(AseError::NotARegularFile);
    }

    let file = File::open(filename)?;
    let mut r = BufReader::new(file);
    read_ase(&mut r, fop)
}

/// Save a sprite as an ASE file, replacing any existing file.
pub fn save_ase(filename: &Path, sprite: &Sprite, fop: &mut FileOp)
        -> AseResult<()> {
    if filename.exists() && !filename.is_file() {
        return Err(AseError::NotARegularFile);
    }

    let file = File::create(filename)?;
    let mut w = BufWriter::new(file);
    write_ase(&mut w, sprite, fop)?;
    w.flush()?;
    Ok(())
}

/// Decode an ASE document from a stream.
///
/// Only a bad header or a failing stream abort the load.  Chunks that
/// cannot be decoded are reported through `fop` and skipped.
pub fn read_ase<R: Read + Seek>(r: &mut R, fop: &mut FileOp)
        -> AseResult<Sprite> {
    let start = r.seek(SeekFrom::Current(0))?;
    let end = r.seek(SeekFrom::End(0))?;
    r.seek(SeekFrom::Start(start))?;
    let hdr = read_ase_header(r)?;

    debug!("ase {}x{}, depth {}, {} frames, {} colors",
           hdr.w, hdr.h, hdr.depth, hdr.frames, hdr.ncolors);

    let format = PixelFormat::from_depth(hdr.depth);
    let mut sprite = Sprite::new(format, hdr.w, hdr.h, hdr.ncolors as usize);
    sprite.set_total_frames(max(hdr.frames, 1));
    sprite.set_duration_for_all_frames(hdr.speed);
    sprite.set_transparent_index(hdr.transparent_index);

    let mut tree = LayerTreeBuilder::new(&sprite);
    let mut frame_pos = start + SIZE_OF_ASE_HEADER as u64;

    for frame in 0..hdr.frames {
        r.seek(SeekFrom::Start(frame_pos))?;
        fop.progress(fraction(frame_pos - start, hdr.size));

        let frame_hdr = read_frame_header(r)?;
        let frame_end = frame_pos + max(frame_hdr.size as u64, SIZE_OF_ASE_FRAME as u64);

        if frame_hdr.magic == ASE_FRAME_MAGIC {
            if frame_hdr.duration > 0 {
                sprite.set_frame_duration(frame, frame_hdr.duration);
            }

            let mut ctx = ChunkContext {
                sprite: &mut sprite,
                layers: &mut tree,
                fop: &mut *fop,
                frame: frame,
            };
            read_frame_chunks(r, &mut ctx, frame_pos, frame_hdr.chunks,
                              start, end, hdr.size)?;
        } else {
            fop.warning(&AseError::BadFrameMagic(frame, frame_hdr.magic));
        }

        frame_pos = frame_end;

        if fop.options().one_frame {
            break;
        } else if fop.is_stop() {
            debug!("load stopped after frame {}", frame);
            break;
        }
    }

    r.seek(SeekFrom::Start(frame_pos))?;
    fop.progress(1.0);
    Ok(sprite)
}

/// Decode the chunks of one frame.
///
/// Each chunk body is read through a reader limited to its declared
/// size, or to the end of the stream if that comes first.  The next
/// chunk is always found from the declared size.
fn read_frame_chunks<R: Read + Seek>(
        r: &mut R, ctx: &mut ChunkContext, frame_pos: u64, num_chunks: u16,
        start: u64, end: u64, total_size: u32)
        -> AseResult<()> {
    let mut chunk_pos = frame_pos + SIZE_OF_ASE_FRAME as u64;

    for _ in 0..num_chunks {
        r.seek(SeekFrom::Start(chunk_pos))?;
        ctx.fop.progress(fraction(chunk_pos - start, total_size));

        let (size, magic) = match read_chunk_header(r) {
            Ok(h) => h,
            Err(e) => {
                if e.is_fatal() {
                    return Err(e);
                }
                ctx.fop.warning(&e);
                break;
            },
        };

        if (size as usize) < SIZE_OF_CHUNK {
            ctx.fop.warning(&AseError::Corrupted);
            break;
        }

        trace!("frame {}: chunk {:#06x}, {} bytes at {}",
               ctx.frame, magic, size, chunk_pos);

        let body_pos = chunk_pos + SIZE_OF_CHUNK as u64;
        let body_size = min(size as u64 - SIZE_OF_CHUNK as u64, end.saturating_sub(body_pos));
        let res = decode_chunk(magic, &mut r.by_ref().take(body_size), ctx);
        if let Err(e) = res {
            if e.is_fatal() {
                return Err(e);
            }
            ctx.fop.warning(&e);
        }

        chunk_pos = chunk_pos + size as u64;
    }

    Ok(())
}

/// Encode a sprite as an ASE document.
///
/// Palettes are written when they change, layers and masks in the
/// first frame, and cels in layer order.  If the operation is stopped,
/// the document is closed after the current frame.
pub fn write_ase<W: Write + Seek>(w: &mut W, sprite: &Sprite, fop: &mut FileOp)
        -> AseResult<()> {
    let start = w.seek(SeekFrom::Current(0))?;

    // Reserve space for header.
    w.write_all(&[0; SIZE_OF_ASE_HEADER])?;

    let indexed = sprite.format() == PixelFormat::Indexed;
    let level = fop.options().compression;
    let layers = sprite.layers_preorder();
    let total_frames = sprite.total_frames();
    let mut frames_written = 0;

    for frame in 0..total_frames {
        let mut fw = FrameWriter::begin(w, sprite.frame_duration(frame))?;

        if indexed && (frame == 0
                || sprite.palette(frame - 1).count_diff(sprite.palette(frame)) > 0) {
            let pal = sprite.palette(frame);
            fw.chunk(ASE_CHUNK_COLOR2, |w| encode_ase_color2(pal, w))?;
        }

        if frame == 0 {
            for &id in layers.iter() {
                fw.chunk(ASE_CHUNK_LAYER, |w| encode_ase_layer(sprite, id, w))?;
            }

            for mask in sprite.masks() {
                fw.chunk(ASE_CHUNK_MASK, |w| encode_ase_mask(mask, w))?;
            }
        }

        for (index, &id) in layers.iter().enumerate() {
            if let Some(cel) = sprite.layer(id).cel(frame) {
                fw.chunk(ASE_CHUNK_CEL, |w| encode_ase_cel(sprite, index, cel, level, w))?;
            }
        }

        fw.finish()?;
        frames_written = frames_written + 1;

        if total_frames > 1 {
            fop.progress((frame + 1) as f32 / total_frames as f32);
        }

        if fop.is_stop() {
            debug!("save stopped after frame {}", frame);
            break;
        }
    }

    let end = w.seek(SeekFrom::Current(0))?;
    let size = end - start;
    let ncolors = sprite.palette(0).len();
    if size > ::std::u32::MAX as u64 || ncolors > ::std::u16::MAX as usize {
        return Err(AseError::ExceededLimit);
    }

    let hdr = AseHeader {
        size: size as u32,
        frames: frames_written,
        w: sprite.width(),
        h: sprite.height(),
        depth: sprite.format().depth(),
        speed: sprite.frame_duration(0),
        transparent_index: sprite.transparent_index(),
        ncolors: ncolors as u16,
    };

    w.seek(SeekFrom::Start(start))?;
    write_ase_header(&hdr, w)?;
    w.seek(SeekFrom::Start(end))?;

    fop.progress(1.0);
    Ok(())
}

/*--------------------------------------------------------------*/

/// Read the ASE header.
fn read_ase_header<R: Read>(r: &mut R)
        -> AseResult<AseHeader> {
    let size = r.read_u32::<LE>()?;
    let magic = r.read_u16::<LE>()?;
    if magic != ASE_FILE_MAGIC {
        return Err(AseError::BadMagic);
    }

    let mut buf = [0; SIZE_OF_ASE_HEADER - 6];
    r.read_exact(&mut buf)?;

    let mut r = Cursor::new(&buf[..]);
    let frames = r.read_u16::<LE>()?;
    let w = r.read_u16::<LE>()?;
    let h = r.read_u16::<LE>()?;
    let depth = r.read_u16::<LE>()?;
    let _flags = r.read_u32::<LE>()?;
    let speed = r.read_u16::<LE>()?;
    let _next = r.read_u32::<LE>()?;
    let _frit = r.read_u32::<LE>()?;
    let transparent_index = r.read_u8()?;
    read_padding(&mut r, 3)?;
    let ncolors = match r.read_u16::<LE>()? {
        0 => 256,
        n => n,
    };

    Ok(AseHeader {
        size: size,
        frames: frames,
        w: w,
        h: h,
        depth: depth,
        speed: speed,
        transparent_index: transparent_index,
        ncolors: ncolors,
    })
}

/// Write the ASE header.
fn write_ase_header<W: Write>(hdr: &AseHeader, w: &mut W)
        -> AseResult<()> {
    w.write_u32::<LE>(hdr.size)?;
    w.write_u16::<LE>(ASE_FILE_MAGIC)?;
    w.write_u16::<LE>(hdr.frames)?;
    w.write_u16::<LE>(hdr.w)?;
    w.write_u16::<LE>(hdr.h)?;
    w.write_u16::<LE>(hdr.depth)?;
    w.write_u32::<LE>(0)?; // flags
    w.write_u16::<LE>(hdr.speed)?;
    w.write_u32::<LE>(0)?; // next
    w.write_u32::<LE>(0)?; // frit
    w.write_u8(hdr.transparent_index)?;
    write_padding(w, 3)?;
    w.write_u16::<LE>(hdr.ncolors)?;
    write_padding(w, SIZE_OF_ASE_HEADER - 34)?;
    Ok(())
}

/// Read a frame header.
fn read_frame_header<R: Read>(r: &mut R)
        -> AseResult<FrameHeader> {
    let mut buf = [0; SIZE_OF_ASE_FRAME];
    r.read_exact(&mut buf)?;

    let mut r = Cursor::new(&buf[..]);
    let size = r.read_u32::<LE>()?;
    let magic = r.read_u16::<LE>()?;
    let chunks = r.read_u16::<LE>()?;
    let duration = r.read_u16::<LE>()?;

    Ok(FrameHeader {
        size: size,
        magic: magic,
        chunks: chunks,
        duration: duration,
    })
}

/// Write a frame header.
fn write_frame_header<W: Write>(hdr: &FrameHeader, w: &mut W)
        -> AseResult<()> {
    w.write_u32::<LE>(hdr.size)?;
    w.write_u16::<LE>(hdr.magic)?;
    w.write_u16::<LE>(hdr.chunks)?;
    w.write_u16::<LE>(hdr.duration)?;
    write_padding(w, 6)?;
    Ok(())
}

/// Read a chunk header, returning its size and type.
fn read_chunk_header<R: Read>(r: &mut R)
        -> AseResult<(u32, u16)> {
    let mut buf = [0; SIZE_OF_CHUNK];
    r.read_exact(&mut buf)?;

    let mut r = Cursor::new(&buf[..]);
    let size = r.read_u32::<LE>()?;
    let magic = r.read_u16::<LE>()?;
    Ok((size, magic))
}

/// Position within the document as a fraction of its declared size.
fn fraction(pos: u64, total_size: u32) -> f32 {
    if total_size == 0 {
        0.0
    } else {
        pos as f32 / total_size as f32
    }
}
