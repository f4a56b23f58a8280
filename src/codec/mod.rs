//! ASE chunk encoding and decoding subroutines.
//!
//! Each chunk begins with a 6-byte header:
//!
//!   Offset | Length | Name | Description
//!   ------:| ------:|:----:| ---------------------------------------
//!        0 |      4 | size | The size of the chunk, including this header.
//!        4 |      2 | type | Data type identifier.
//!        6 | size-6 | data | The chunk data.
//!
//! A reader that does not understand a chunk type can skip `size`
//! bytes and resume at the next chunk, so the declared size is always
//! trusted over whatever a chunk decoder actually consumed.

macro_rules! module {
    ($e:ident) => {
        pub use self::$e::*;
        mod $e;
    };
}

use std::io::{self,Read,Seek,SeekFrom,Take,Write};
use byteorder::LittleEndian as LE;
use byteorder::{ReadBytesExt,WriteBytesExt};

use ::{AseError,AseResult,FileOp,Sprite};

module!(codec004);
module!(codec011);
module!(codec2004);
module!(codec2005);
module!(codec2016);
module!(codec2017);
module!(zlib);

/// Size of a chunk header on disk.
pub const SIZE_OF_CHUNK: usize = 6;

/// Position and type of a chunk whose header has not been written yet.
#[derive(Clone,Copy,Debug)]
pub struct ChunkMark {
    start: u64,
    magic: u16,
}

/// Everything a chunk decoder may modify.
pub struct ChunkContext<'a> {
    pub sprite: &'a mut Sprite,
    pub layers: &'a mut LayerTreeBuilder,
    pub fop: &'a mut FileOp,
    pub frame: u16,
}

/*--------------------------------------------------------------*/

/// Decode a chunk body, based on the chunk type.
///
/// The reader is limited to the chunk body, and decoders size their
/// buffers against what is left of it.
pub fn decode_chunk<R: Read>(magic: u16, r: &mut Take<R>, ctx: &mut ChunkContext)
        -> AseResult<()> {
    match magic {
        ASE_CHUNK_COLOR | ASE_CHUNK_COLOR2 =>
            decode_palette_chunk(magic, r, ctx.sprite, ctx.frame),
        ASE_CHUNK_LAYER => {
            decode_ase_layer(r, ctx.sprite, ctx.layers)?;
            Ok(())
        },
        ASE_CHUNK_CEL =>
            decode_ase_cel(r, ctx.sprite, ctx.frame, ctx.fop),
        ASE_CHUNK_MASK => {
            let mask = decode_ase_mask(r)?;
            ctx.sprite.add_mask(mask);
            Ok(())
        },
        ASE_CHUNK_PATH => decode_ase_path(r),
        _ => Err(AseError::UnsupportedChunkType(magic)),
    }
}

/// Decode either palette chunk on top of the palette active at
/// `frame`, installing the result if anything changed.
fn decode_palette_chunk<R: Read>(
        magic: u16, r: &mut R, sprite: &mut Sprite, frame: u16)
        -> AseResult<()> {
    if sprite.format() != ::PixelFormat::Indexed {
        return Err(AseError::UnexpectedPalette);
    }

    let mut pal = sprite.palette(frame).clone();
    pal.set_frame(frame);

    if magic == ASE_CHUNK_COLOR {
        decode_ase_color(r, &mut pal)?;
    } else {
        decode_ase_color2(r, &mut pal)?;
    }

    if sprite.palette(frame).count_diff(&pal) > 0 {
        sprite.set_palette(pal);
    }

    Ok(())
}

/*--------------------------------------------------------------*/

/// Skip `bytes` bytes of padding.
pub fn read_padding<R: Read>(r: &mut R, bytes: u64)
        -> AseResult<()> {
    let n = io::copy(&mut r.by_ref().take(bytes), &mut io::sink())?;
    if n < bytes {
        return Err(AseError::Truncated);
    }
    Ok(())
}

/// Write `bytes` zeroes.
pub fn write_padding<W: Write>(w: &mut W, bytes: usize)
        -> AseResult<()> {
    for _ in 0..bytes {
        w.write_u8(0)?;
    }
    Ok(())
}

/// Read a string: a 16-bit byte length followed by the bytes.
pub fn read_string<R: Read>(r: &mut R)
        -> AseResult<String> {
    let len = r.read_u16::<LE>()? as usize;
    let mut buf = vec![0; len];
    r.read_exact(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write a string: a 16-bit byte length followed by the bytes.
pub fn write_string<W: Write>(w: &mut W, s: &str)
        -> AseResult<()> {
    if s.len() > ::std::u16::MAX as usize {
        return Err(AseError::ExceededLimit);
    }

    w.write_u16::<LE>(s.len() as u16)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

/*--------------------------------------------------------------*/

/// Reserve space for a chunk header.
pub fn open_chunk<W: Write + Seek>(w: &mut W, magic: u16)
        -> AseResult<ChunkMark> {
    let start = w.seek(SeekFrom::Current(0))?;
    w.write_all(&[0; SIZE_OF_CHUNK])?;
    Ok(ChunkMark { start: start, magic: magic })
}

/// Fill in a chunk header now that the body has been written.
///
/// Returns the size of the chunk, including its header.
pub fn close_chunk<W: Write + Seek>(w: &mut W, mark: ChunkMark)
        -> AseResult<usize> {
    let end = w.seek(SeekFrom::Current(0))?;
    let size = end - mark.start;
    if size > ::std::u32::MAX as u64 {
        return Err(AseError::ExceededLimit);
    }

    w.seek(SeekFrom::Start(mark.start))?;
    w.write_u32::<LE>(size as u32)?;
    w.write_u16::<LE>(mark.magic)?;
    w.seek(SeekFrom::Start(end))?;

    Ok(size as usize)
}
