//! Codec for chunk type 11 = ASE_CHUNK_COLOR.

use std::io::Read;

use ::{AseResult,Palette};
use super::decode_color_packets;

/// Magic for an ASE_CHUNK_COLOR chunk - 64-Level Color.
///
/// This chunk is identical to ASE_CHUNK_COLOR2 except that the values
/// for the red, green and blue components are in the range of 0-63
/// instead of 0-255.  It is only found in old files and is never
/// written.
pub const ASE_CHUNK_COLOR: u16 = 11;

/// Scale a 6-bit component to 8 bits.
const RGB_SCALE_6: [u8; 64] = [
      0,   4,   8,  12,  16,  20,  24,  28,  32,  36,  40,  45,  49,  53,  57,  61,
     65,  69,  73,  77,  81,  85,  89,  93,  97, 101, 105, 109, 113, 117, 121, 125,
    130, 134, 138, 142, 146, 150, 154, 158, 162, 166, 170, 174, 178, 182, 186, 190,
    194, 198, 202, 206, 210, 215, 219, 223, 227, 231, 235, 239, 243, 247, 251, 255 ];

/// Decode an ASE_CHUNK_COLOR chunk.
pub fn decode_ase_color<R: Read>(r: &mut R, pal: &mut Palette)
        -> AseResult<()> {
    decode_color_packets(r, pal, |c| RGB_SCALE_6[(c & 0x3F) as usize])
}
