//! Codec for chunk type 0x2017 = ASE_CHUNK_PATH.

use std::io::Read;

use ::AseResult;

/// Magic for an ASE_CHUNK_PATH chunk - Path.
///
/// Path chunks are recognised but carry nothing the sprite keeps.
/// Their body is skipped along with the rest of the chunk.
pub const ASE_CHUNK_PATH: u16 = 0x2017;

/// Decode an ASE_CHUNK_PATH chunk.
pub fn decode_ase_path<R: Read>(_r: &mut R)
        -> AseResult<()> {
    debug!("path chunk ignored");
    Ok(())
}
