//! Codec for chunk type 4 = ASE_CHUNK_COLOR2.

use std::io::{Read,Write};
use byteorder::LittleEndian as LE;
use byteorder::{ReadBytesExt,WriteBytesExt};

use ::{AseError,AseResult,Palette,Rgba};

/// Magic for an ASE_CHUNK_COLOR2 chunk - 256-Level Color.
///
/// The data in this chunk is organized in packets.  The first word
/// following the chunk header is a count of the number of packets in
/// the chunk.
///
/// Each packet consists of a one-byte color index skip count, a
/// one-byte color count and three bytes of color information for each
/// color defined.
///
/// At the start of the chunk, the color index is assumed to be zero.
/// Before processing any colors in a packet, the color index skip
/// count is added to the current color index.  The colors of a packet
/// do not advance the color index, only the skip counts do.  The number
/// of colors defined in the packet is retrieved.  A zero in this byte
/// indicates 256 colors follow.  The three bytes for each color define
/// the red, green, and blue components of the color in that order.
/// Each component can range from 0 (off) to 255 (full on).  Decoded
/// colors are always fully opaque.
pub const ASE_CHUNK_COLOR2: u16 = 4;

/// Decode an ASE_CHUNK_COLOR2 chunk.
pub fn decode_ase_color2<R: Read>(r: &mut R, pal: &mut Palette)
        -> AseResult<()> {
    decode_color_packets(r, pal, |c| c)
}

/// Decode a list of palette packets, mapping each component through
/// `scale`.
pub fn decode_color_packets<R, F>(r: &mut R, pal: &mut Palette, scale: F)
        -> AseResult<()>
        where R: Read, F: Fn(u8) -> u8 {
    let mut idx0 = 0;

    let count = r.read_u16::<LE>()?;
    for _ in 0..count {
        let nskip = r.read_u8()? as usize;
        let ncopy = match r.read_u8()? {
            0 => 256 as usize,
            n => n as usize,
        };

        let start = idx0 + nskip;
        let end = start + ncopy;
        if end > 256 {
            return Err(AseError::Corrupted);
        }

        let mut rgb = [0; 3];
        for idx in start..end {
            r.read_exact(&mut rgb)?;
            pal.set_entry(idx, Rgba::new(scale(rgb[0]), scale(rgb[1]), scale(rgb[2]), 255));
        }

        idx0 = start;
    }

    Ok(())
}

/// Encode an ASE_CHUNK_COLOR2 chunk.
///
/// The whole palette is written as a single packet.
pub fn encode_ase_color2<W: Write>(pal: &Palette, w: &mut W)
        -> AseResult<()> {
    if pal.is_empty() || pal.len() > 256 {
        return Err(AseError::BadInput);
    }

    let count = 1;
    let nskip = 0;
    let ncopy = if pal.len() == 256 { 0 } else { pal.len() as u8 };
    w.write_u16::<LE>(count)?;
    w.write_u8(nskip)?;
    w.write_u8(ncopy)?;

    for c in pal.entries() {
        w.write_all(&[c.r, c.g, c.b])?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use ::{Palette,Rgba};
    use super::*;

    #[test]
    fn test_decode_ase_color2() {
        let src = [
            0x02, 0x00, // count 2
            1, 2,       // skip 1, copy 2
            0x0A, 0x0B, 0x0C, 0x1A, 0x1B, 0x1C,
            3, 1,       // skip 3, copy 1
            0x2A, 0x2B, 0x2C ];

        let mut pal = Palette::new(0, 8);
        let res = decode_ase_color2(&mut Cursor::new(&src[..]), &mut pal);
        assert!(res.is_ok());

        let black = Rgba::new(0, 0, 0, 255);
        assert_eq!(pal.entries(), &[
            black,
            Rgba::new(0x0A, 0x0B, 0x0C, 255),
            Rgba::new(0x1A, 0x1B, 0x1C, 255),
            black,
            Rgba::new(0x2A, 0x2B, 0x2C, 255),
            black, black, black ][..]);
    }

    #[test]
    fn test_decode_ase_color2_skip_only() {
        let src = [
            0x02, 0x00, // count 2
            1, 1,       // skip 1, copy 1
            0xFF, 0x00, 0x00,
            1, 1,       // skip 1, copy 1
            0x00, 0xFF, 0x00 ];

        let mut pal = Palette::new(0, 4);
        let res = decode_ase_color2(&mut Cursor::new(&src[..]), &mut pal);
        assert!(res.is_ok());

        assert_eq!(pal.entry(1), Some(Rgba::new(255, 0, 0, 255)));
        assert_eq!(pal.entry(2), Some(Rgba::new(0, 255, 0, 255)));
        assert_eq!(pal.entry(3), Some(Rgba::new(0, 0, 0, 255)));
    }

    #[test]
    fn test_decode_ase_color2_256() {
        let mut src = vec![
            0x01, 0x00, // count 1
            0, 0 ];     // skip 0, copy 256
        for i in 0..256 {
            src.extend_from_slice(&[i as u8, 0, 0]);
        }

        let mut pal = Palette::new(0, 0);
        let res = decode_ase_color2(&mut Cursor::new(&src[..]), &mut pal);
        assert!(res.is_ok());
        assert_eq!(pal.len(), 256);
        assert_eq!(pal.entry(255), Some(Rgba::new(255, 0, 0, 255)));
    }

    #[test]
    fn test_decode_ase_color2_overflow() {
        let mut src = vec![
            0x01, 0x00, // count 1
            1, 0 ];     // skip 1, copy 256
        src.extend_from_slice(&[0; 3 * 256]);

        let mut pal = Palette::new(0, 256);
        match decode_ase_color2(&mut Cursor::new(&src[..]), &mut pal) {
            Err(AseError::Corrupted) => (),
            res => panic!("unexpected {:?}", res),
        }
    }

    #[test]
    fn test_encode_ase_color2() {
        let expected = [
            0x01, 0x00, // count 1
            0, 2,       // skip 0, copy 2
            0x0A, 0x0B, 0x0C, 0x1A, 0x1B, 0x1C ];

        let mut pal = Palette::new(0, 2);
        pal.set_entry(0, Rgba::new(0x0A, 0x0B, 0x0C, 255));
        pal.set_entry(1, Rgba::new(0x1A, 0x1B, 0x1C, 128));

        let mut enc = Cursor::new(Vec::new());
        assert!(encode_ase_color2(&pal, &mut enc).is_ok());
        assert_eq!(&enc.get_ref()[..], &expected[..]);
    }

    #[test]
    fn test_encode_ase_color2_full() {
        let pal = Palette::new(0, 256);
        let mut enc = Cursor::new(Vec::new());
        assert!(encode_ase_color2(&pal, &mut enc).is_ok());
        assert_eq!(&enc.get_ref()[0..4], &[0x01, 0x00, 0, 0]);
        assert_eq!(enc.get_ref().len(), 4 + 3 * 256);
    }
}
