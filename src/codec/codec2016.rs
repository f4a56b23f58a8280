//! Codec for chunk type 0x2016 = ASE_CHUNK_MASK.

use std::io::{Read,Take,Write};
use byteorder::LittleEndian as LE;
use byteorder::{ReadBytesExt,WriteBytesExt};

use ::{AseError,AseResult,Mask};
use super::{read_padding,read_string,write_padding,write_string};

/// Magic for an ASE_CHUNK_MASK chunk - Selection Mask.
///
///   Offset | Length |   Name   | Description
///   ------:| ------:|:--------:| -------------------------------
///        0 |      2 |    x     | Signed x position.
///        2 |      2 |    y     | Signed y position.
///        4 |      2 |  width   | Width of the bitmap.
///        6 |      2 |  height  | Height of the bitmap.
///        8 |      8 | reserved | Set to zeroes.
///       16 |    2+n |   name   | Mask name.
///      ... |      - |  bitmap  | One bit per pixel, MSB first.
///
/// Each row of the bitmap is padded to a whole number of bytes.
pub const ASE_CHUNK_MASK: u16 = 0x2016;

/// Decode an ASE_CHUNK_MASK chunk.
///
/// The reader is limited to the chunk.  A bitmap larger than the rest
/// of the chunk is rejected before it is allocated.
pub fn decode_ase_mask<R: Read>(r: &mut Take<R>)
        -> AseResult<Mask> {
    let x = r.read_i16::<LE>()?;
    let y = r.read_i16::<LE>()?;
    let w = r.read_u16::<LE>()? as usize;
    let h = r.read_u16::<LE>()? as usize;
    read_padding(r, 8)?;
    let name = read_string(r)?;

    if (h * ((w + 7) / 8)) as u64 > r.limit() {
        return Err(AseError::Truncated);
    }

    let mut mask = Mask::new(&name, x, y, w, h);
    let mut row = vec![0; (w + 7) / 8];
    for v in 0..h {
        r.read_exact(&mut row)?;
        for u in 0..w {
            let bit = row[u / 8] & (0x80 >> (u % 8));
            mask.set(u, v, bit != 0);
        }
    }

    Ok(mask)
}

/// Encode an ASE_CHUNK_MASK chunk.
pub fn encode_ase_mask<W: Write>(mask: &Mask, w: &mut W)
        -> AseResult<()> {
    if mask.width() > ::std::u16::MAX as usize
            || mask.height() > ::std::u16::MAX as usize {
        return Err(AseError::ExceededLimit);
    }

    w.write_i16::<LE>(mask.x)?;
    w.write_i16::<LE>(mask.y)?;
    w.write_u16::<LE>(mask.width() as u16)?;
    w.write_u16::<LE>(mask.height() as u16)?;
    write_padding(w, 8)?;
    write_string(w, &mask.name)?;

    let mut row = vec![0u8; (mask.width() + 7) / 8];
    for v in 0..mask.height() {
        for b in row.iter_mut() {
            *b = 0;
        }
        for u in 0..mask.width() {
            if mask.get(u, v) {
                row[u / 8] |= 0x80 >> (u % 8);
            }
        }
        w.write_all(&row)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor,Read,Take};
    use ::Mask;
    use super::*;

    fn chunk(body: &[u8]) -> Take<Cursor<&[u8]>> {
        Cursor::new(body).take(body.len() as u64)
    }

    #[test]
    fn test_decode_ase_mask() {
        let src = [
            0xFF, 0xFF, 0x02, 0x00, // x -1, y 2
            0x0A, 0x00, 0x02, 0x00, // 10x2
            0, 0, 0, 0, 0, 0, 0, 0,
            0x03, 0x00, b's', b'e', b'l',
            0b1000_0001, 0b0100_0000,
            0b0000_0000, 0b1111_1111 ];

        let mask = decode_ase_mask(&mut chunk(&src)).expect("mask");
        assert_eq!(mask.name, "sel");
        assert_eq!((mask.x, mask.y), (-1, 2));
        assert_eq!((mask.width(), mask.height()), (10, 2));

        assert!(mask.get(0, 0));
        assert!(!mask.get(1, 0));
        assert!(mask.get(7, 0));
        assert!(!mask.get(8, 0));
        assert!(mask.get(9, 0));
        assert!(!mask.get(7, 1));
        assert!(mask.get(8, 1));
        assert!(mask.get(9, 1));
    }

    #[test]
    fn test_decode_ase_mask_truncated() {
        let src = [
            0x00, 0x00, 0x00, 0x00,
            0x08, 0x00, 0x04, 0x00,
            0, 0, 0, 0, 0, 0, 0, 0,
            0x00, 0x00,
            0xFF, 0xFF ];

        match decode_ase_mask(&mut chunk(&src)) {
            Err(AseError::Truncated) => (),
            res => panic!("unexpected {:?}", res),
        }
    }

    #[test]
    fn test_decode_ase_mask_larger_than_chunk() {
        let src = [
            0x00, 0x00, 0x00, 0x00,
            0xFF, 0xFF, 0xFF, 0xFF, // 65535x65535
            0, 0, 0, 0, 0, 0, 0, 0,
            0x01, 0x00, b'm',
            0xFF, 0xFF, 0xFF, 0xFF ];

        match decode_ase_mask(&mut chunk(&src)) {
            Err(AseError::Truncated) => (),
            res => panic!("unexpected {:?}", res),
        }
    }

    #[test]
    fn test_encode_ase_mask() {
        let expected = [
            0x03, 0x00, 0xFE, 0xFF, // x 3, y -2
            0x09, 0x00, 0x01, 0x00, // 9x1
            0, 0, 0, 0, 0, 0, 0, 0,
            0x01, 0x00, b'm',
            0b0010_0000, 0b1000_0000 ];

        let mut mask = Mask::new("m", 3, -2, 9, 1);
        mask.set(2, 0, true);
        mask.set(8, 0, true);

        let mut enc = Cursor::new(Vec::new());
        assert!(encode_ase_mask(&mask, &mut enc).is_ok());
        assert_eq!(&enc.get_ref()[..], &expected[..]);
    }
}
