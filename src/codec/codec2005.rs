//! Codec for chunk type 0x2005 = ASE_CHUNK_CEL.

use std::io::{Read,Take,Write};
use byteorder::LittleEndian as LE;
use byteorder::{ReadBytesExt,WriteBytesExt};
use flate2::Compression;

use ::{AseError,AseResult,Cel,FileOp,Image,Sprite};
use super::{deflate_image,inflate_rows,read_padding,write_padding,ZLIB_MAX_RATIO};

/// Magic for an ASE_CHUNK_CEL chunk - Cel.
///
/// A cel places an image on one layer for the current frame:
///
///   Offset | Length |    Name     | Description
///   ------:| ------:|:-----------:| -------------------------------
///        0 |      2 | layer index | Pre-order index of an image layer.
///        2 |      2 |      x      | Signed x position.
///        4 |      2 |      y      | Signed y position.
///        6 |      1 |   opacity   | 0 = transparent, 255 = opaque.
///        7 |      2 |  cel type   | Raw, linked or compressed.
///        9 |      7 |  reserved   | Set to zeroes.
///       16 |      - |    data     | Depends on the cel type.
pub const ASE_CHUNK_CEL: u16 = 0x2005;

/// Cel type: width, height, then uncompressed scanlines.
pub const ASE_CEL_RAW: u16 = 0;

/// Cel type: frame number of a cel on the same layer to copy.
pub const ASE_CEL_LINK: u16 = 1;

/// Cel type: width, height, then a zlib stream of the scanlines.
pub const ASE_CEL_COMPRESSED: u16 = 2;

/// Decode an ASE_CHUNK_CEL chunk, placing the cel in its layer.
///
/// The reader is limited to the chunk, since compressed data runs
/// until its end.  Cel dimensions that the rest of the chunk cannot
/// hold are rejected before any pixels are allocated.  A broken
/// compressed stream is reported to `fop` and leaves a blank image in
/// the cel.
pub fn decode_ase_cel<R: Read>(
        r: &mut Take<R>, sprite: &mut Sprite, frame: u16, fop: &mut FileOp)
        -> AseResult<()> {
    let layer_index = r.read_u16::<LE>()?;
    let x = r.read_i16::<LE>()?;
    let y = r.read_i16::<LE>()?;
    let opacity = r.read_u8()?;
    let cel_type = r.read_u16::<LE>()?;
    read_padding(r, 7)?;

    let layer = match sprite.index_to_layer(layer_index as usize) {
        Some(layer) => layer,
        None => return Err(AseError::DanglingLayerReference {
            frame: frame,
            layer_index: layer_index,
        }),
    };

    if !sprite.layer(layer).is_image() {
        return Err(AseError::UnsupportedCelTarget {
            frame: frame,
            layer_index: layer_index,
        });
    }

    let image = match cel_type {
        ASE_CEL_RAW => {
            let w = r.read_u16::<LE>()? as usize;
            let h = r.read_u16::<LE>()? as usize;

            if w > 0 && h > 0 {
                if image_size(sprite, w, h) > r.limit() {
                    return Err(AseError::Truncated);
                }

                let mut image = Image::new(sprite.format(), w, h);
                decode_raw_image(r, &mut image)?;
                Some(sprite.stock_mut().add(image))
            } else {
                None
            }
        },

        ASE_CEL_LINK => {
            let link_frame = r.read_u16::<LE>()?;
            let link = match sprite.layer(layer).cel(link_frame) {
                Some(cel) => cel.image,
                None => return Err(AseError::MissingLinkedCel {
                    frame: frame,
                    link_frame: link_frame,
                }),
            };

            // Copy, so that each cel owns its image.
            link.and_then(|id| sprite.stock_mut().duplicate(id))
        },

        ASE_CEL_COMPRESSED => {
            let w = r.read_u16::<LE>()? as usize;
            let h = r.read_u16::<LE>()? as usize;

            if w > 0 && h > 0 {
                if image_size(sprite, w, h) > r.limit().saturating_mul(ZLIB_MAX_RATIO) {
                    return Err(AseError::Corrupted);
                }

                let mut image = Image::new(sprite.format(), w, h);
                match decode_compressed_image(r, &mut image) {
                    Ok(()) => (),
                    Err(e) => {
                        if e.is_fatal() {
                            return Err(e);
                        }
                        fop.warning(&e);
                    },
                }
                Some(sprite.stock_mut().add(image))
            } else {
                None
            }
        },

        _ => return Err(AseError::UnsupportedCelType(cel_type)),
    };

    let cel = Cel {
        frame: frame,
        x: x as i32,
        y: y as i32,
        opacity: opacity,
        image: image,
    };

    sprite.add_cel(layer, cel)
}

/// Number of bytes in the scanlines of a `w` by `h` image.
fn image_size(sprite: &Sprite, w: usize, h: usize) -> u64 {
    sprite.format().row_size(w) as u64 * h as u64
}

/// Decode uncompressed scanlines.
fn decode_raw_image<R: Read>(r: &mut R, image: &mut Image)
        -> AseResult<()> {
    let mut scanline = vec![0; image.row_size()];
    for y in 0..image.height() {
        r.read_exact(&mut scanline)?;
        image.decode_row(y, &scanline);
    }
    Ok(())
}

/// Decode zlib-compressed scanlines.  The image is left untouched
/// unless the whole stream decodes.
fn decode_compressed_image<R: Read>(r: &mut R, image: &mut Image)
        -> AseResult<()> {
    let row_size = image.row_size();
    let buf = inflate_rows(r, image.height(), row_size)?;
    for (y, row) in buf.chunks(row_size).enumerate() {
        image.decode_row(y, row);
    }
    Ok(())
}

/// Encode an ASE_CHUNK_CEL chunk.
///
/// Cels are always written compressed.
pub fn encode_ase_cel<W: Write>(
        sprite: &Sprite, layer_index: usize, cel: &Cel, level: Compression,
        w: &mut W)
        -> AseResult<()> {
    if layer_index > ::std::u16::MAX as usize
            || cel.x < ::std::i16::MIN as i32 || cel.x > ::std::i16::MAX as i32
            || cel.y < ::std::i16::MIN as i32 || cel.y > ::std::i16::MAX as i32 {
        return Err(AseError::ExceededLimit);
    }

    w.write_u16::<LE>(layer_index as u16)?;
    w.write_i16::<LE>(cel.x as i16)?;
    w.write_i16::<LE>(cel.y as i16)?;
    w.write_u8(cel.opacity)?;
    w.write_u16::<LE>(ASE_CEL_COMPRESSED)?;
    write_padding(w, 7)?;

    match cel.image.and_then(|id| sprite.stock().get(id)) {
        Some(image) => {
            if image.format() != sprite.format() {
                return Err(AseError::BadInput);
            }
            if image.width() > ::std::u16::MAX as usize
                    || image.height() > ::std::u16::MAX as usize {
                return Err(AseError::ExceededLimit);
            }

            w.write_u16::<LE>(image.width() as u16)?;
            w.write_u16::<LE>(image.height() as u16)?;
            if image.width() > 0 && image.height() > 0 {
                deflate_image(image, level, w)?;
            }
        },
        None => {
            w.write_u16::<LE>(0)?;
            w.write_u16::<LE>(0)?;
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor,Read,Take};
    use flate2::Compression;
    use ::{Cel,ErrorKind,FileOp,Layer,LayerId,PixelFormat,Pixels,Rgba,Sprite};
    use super::*;

    fn chunk(body: &[u8]) -> Take<Cursor<&[u8]>> {
        Cursor::new(body).take(body.len() as u64)
    }

    fn sprite_with_layers(format: PixelFormat) -> (Sprite, LayerId, LayerId) {
        let mut sprite = Sprite::new(format, 8, 8, 256);
        let root = sprite.root();
        let group = sprite.add_layer(root, Layer::new_group("g")).expect("group");
        let image = sprite.add_layer(group, Layer::new_image("i")).expect("image");
        (sprite, group, image)
    }

    #[test]
    fn test_decode_ase_cel_raw_rgba() {
        let src = [
            0x01, 0x00,             // layer 1
            0xFE, 0xFF, 0x03, 0x00, // x -2, y 3
            0x80,                   // opacity
            0x00, 0x00,             // raw
            0, 0, 0, 0, 0, 0, 0,
            0x02, 0x00, 0x01, 0x00, // 2x1
            0x01, 0x02, 0x03, 0x04, 0x11, 0x12, 0x13, 0x14 ];

        let (mut sprite, _, layer) = sprite_with_layers(PixelFormat::Rgba);
        let mut fop = FileOp::new();
        decode_ase_cel(&mut chunk(&src), &mut sprite, 0, &mut fop).expect("cel");

        let cel = sprite.layer(layer).cel(0).expect("cel").clone();
        assert_eq!((cel.x, cel.y, cel.opacity), (-2, 3, 0x80));

        let image = sprite.cel_image(layer, 0).expect("image");
        assert_eq!(image.pixels(), &Pixels::Rgba(vec![
            Rgba::new(0x01, 0x02, 0x03, 0x04), Rgba::new(0x11, 0x12, 0x13, 0x14) ]));
    }

    #[test]
    fn test_decode_ase_cel_dangling() {
        let src = [
            0x07, 0x00, 0, 0, 0, 0, 0xFF, 0x00, 0x00,
            0, 0, 0, 0, 0, 0, 0,
            0x00, 0x00, 0x00, 0x00 ];

        let (mut sprite, _, _) = sprite_with_layers(PixelFormat::Indexed);
        let mut fop = FileOp::new();
        match decode_ase_cel(&mut chunk(&src), &mut sprite, 0, &mut fop) {
            Err(AseError::DanglingLayerReference { frame: 0, layer_index: 7 }) => (),
            res => panic!("unexpected {:?}", res),
        }
    }

    #[test]
    fn test_decode_ase_cel_in_group() {
        let src = [
            0x00, 0x00, 0, 0, 0, 0, 0xFF, 0x00, 0x00,
            0, 0, 0, 0, 0, 0, 0,
            0x00, 0x00, 0x00, 0x00 ];

        let (mut sprite, group, _) = sprite_with_layers(PixelFormat::Indexed);
        let mut fop = FileOp::new();
        match decode_ase_cel(&mut chunk(&src), &mut sprite, 0, &mut fop) {
            Err(AseError::UnsupportedCelTarget { .. }) => (),
            res => panic!("unexpected {:?}", res),
        }
        assert!(sprite.layer(group).cels().is_empty());
    }

    #[test]
    fn test_decode_ase_cel_link_is_a_copy() {
        let raw = [
            0x01, 0x00, 0, 0, 0, 0, 0xFF, 0x00, 0x00,
            0, 0, 0, 0, 0, 0, 0,
            0x02, 0x00, 0x01, 0x00,
            0x05, 0x06 ];
        let link = [
            0x01, 0x00, 0, 0, 0, 0, 0xFF, 0x01, 0x00,
            0, 0, 0, 0, 0, 0, 0,
            0x00, 0x00 ];   // frame 0

        let (mut sprite, _, layer) = sprite_with_layers(PixelFormat::Indexed);
        sprite.set_total_frames(2);
        let mut fop = FileOp::new();
        decode_ase_cel(&mut chunk(&raw), &mut sprite, 0, &mut fop).expect("raw");
        decode_ase_cel(&mut chunk(&link), &mut sprite, 1, &mut fop).expect("link");

        let id0 = sprite.layer(layer).cel(0).and_then(|c| c.image).expect("image 0");
        let id1 = sprite.layer(layer).cel(1).and_then(|c| c.image).expect("image 1");
        assert!(id0 != id1);

        if let Some(image) = sprite.stock_mut().get_mut(id1) {
            *image.pixels_mut() = Pixels::Indexed(vec![9, 9]);
        }

        assert_eq!(sprite.stock().get(id0).expect("image 0").pixels(), &Pixels::Indexed(vec![5, 6]));
        assert_eq!(sprite.stock().get(id1).expect("image 1").pixels(), &Pixels::Indexed(vec![9, 9]));
    }

    #[test]
    fn test_decode_ase_cel_link_missing() {
        let link = [
            0x01, 0x00, 0, 0, 0, 0, 0xFF, 0x01, 0x00,
            0, 0, 0, 0, 0, 0, 0,
            0x03, 0x00 ];

        let (mut sprite, _, layer) = sprite_with_layers(PixelFormat::Indexed);
        let mut fop = FileOp::new();
        match decode_ase_cel(&mut chunk(&link), &mut sprite, 1, &mut fop) {
            Err(AseError::MissingLinkedCel { frame: 1, link_frame: 3 }) => (),
            res => panic!("unexpected {:?}", res),
        }
        assert!(sprite.layer(layer).cels().is_empty());
    }

    #[test]
    fn test_encode_decode_ase_cel_gray() {
        let (mut sprite, _, _) = sprite_with_layers(PixelFormat::GrayAlpha);
        let pixels = Pixels::GrayAlpha((0..12).map(|i| ::GrayAlpha::new(i * 10, 255 - i)).collect());
        let image = sprite.stock_mut().add(Image::from_pixels(4, 3, pixels.clone()).expect("image"));

        let mut cel = Cel::new(0, Some(image));
        cel.x = -5;
        cel.y = 300;
        cel.opacity = 200;

        let mut enc = Cursor::new(Vec::new());
        encode_ase_cel(&sprite, 1, &cel, Compression::default(), &mut enc).expect("encode");
        assert_eq!(&enc.get_ref()[7..9], &[0x02, 0x00]);

        let (mut other, _, other_layer) = sprite_with_layers(PixelFormat::GrayAlpha);
        let mut fop = FileOp::new();
        let bytes = enc.into_inner();
        decode_ase_cel(&mut chunk(&bytes), &mut other, 0, &mut fop).expect("decode");

        let decoded = other.layer(other_layer).cel(0).expect("cel").clone();
        assert_eq!((decoded.x, decoded.y, decoded.opacity), (-5, 300, 200));
        assert_eq!(other.cel_image(other_layer, 0).expect("image").pixels(), &pixels);
        assert!(fop.warnings().is_empty());
    }

    #[test]
    fn test_decode_ase_cel_bad_stream_gives_blank_image() {
        let src = [
            0x01, 0x00, 0, 0, 0, 0, 0xFF, 0x02, 0x00,
            0, 0, 0, 0, 0, 0, 0,
            0x02, 0x00, 0x02, 0x00,
            0xFF, 0xFF, 0xFF, 0xFF ];

        let (mut sprite, _, layer) = sprite_with_layers(PixelFormat::Indexed);
        let mut fop = FileOp::new();
        decode_ase_cel(&mut chunk(&src), &mut sprite, 0, &mut fop).expect("cel");

        let image = sprite.cel_image(layer, 0).expect("image");
        assert_eq!(image.pixels(), &Pixels::Indexed(vec![0; 4]));
        assert_eq!(fop.warnings().len(), 1);
        assert_eq!(fop.warnings()[0].kind, ErrorKind::CompressionStreamError);
    }

    #[test]
    fn test_decode_ase_cel_raw_larger_than_chunk() {
        let src = [
            0x01, 0x00, 0, 0, 0, 0, 0xFF, 0x00, 0x00,
            0, 0, 0, 0, 0, 0, 0,
            0xFF, 0xFF, 0xFF, 0xFF, // 65535x65535
            0x01, 0x02, 0x03, 0x04 ];

        let (mut sprite, _, layer) = sprite_with_layers(PixelFormat::Rgba);
        let mut fop = FileOp::new();
        match decode_ase_cel(&mut chunk(&src), &mut sprite, 0, &mut fop) {
            Err(AseError::Truncated) => (),
            res => panic!("unexpected {:?}", res),
        }
        assert!(sprite.layer(layer).cels().is_empty());
        assert!(sprite.stock().is_empty());
    }

    #[test]
    fn test_decode_ase_cel_compressed_larger_than_chunk() {
        let src = [
            0x01, 0x00, 0, 0, 0, 0, 0xFF, 0x02, 0x00,
            0, 0, 0, 0, 0, 0, 0,
            0xFF, 0xFF, 0xFF, 0xFF, // 65535x65535
            0x78, 0x9C, 0x03, 0x00, 0x00, 0x00, 0x00, 0x01 ];

        let (mut sprite, _, layer) = sprite_with_layers(PixelFormat::Rgba);
        let mut fop = FileOp::new();
        match decode_ase_cel(&mut chunk(&src), &mut sprite, 0, &mut fop) {
            Err(AseError::Corrupted) => (),
            res => panic!("unexpected {:?}", res),
        }
        assert!(sprite.layer(layer).cels().is_empty());
        assert!(sprite.stock().is_empty());
        assert!(fop.warnings().is_empty());
    }
}
