//! Codec for chunk type 0x2004 = ASE_CHUNK_LAYER.

use std::io::{Read,Write};
use byteorder::LittleEndian as LE;
use byteorder::{ReadBytesExt,WriteBytesExt};

use ::{AseError,AseResult,Layer,LayerId,Sprite};
use super::{read_padding,read_string,write_padding,write_string};

/// Magic for an ASE_CHUNK_LAYER chunk - Layer.
///
/// All layer chunks are stored in the first frame, in pre-order.  The
/// tree is rebuilt from the child level of each layer:
///
///   Offset | Length |    Name     | Description
///   ------:| ------:|:-----------:| -------------------------------
///        0 |      2 |    flags    | Visible, editable, lock-move, background.
///        2 |      2 |    type     | 0 = image layer, 1 = group.
///        4 |      2 | child level | Number of groups between the layer and the root.
///        6 |      2 |   width     | Ignored.
///        8 |      2 |   height    | Ignored.
///       10 |      2 | blend mode  | Image layers only.
///       12 |      4 |  reserved   | Set to zeroes.
///       16 |    2+n |    name     | Layer name.
pub const ASE_CHUNK_LAYER: u16 = 0x2004;

/// Layer type of an image layer.
pub const ASE_LAYER_IMAGE: u16 = 0;

/// Layer type of a group.
pub const ASE_LAYER_GROUP: u16 = 1;

/// Rebuilds the layer tree from a flat sequence of (layer, level)
/// records.
///
/// Keeps the chain of groups leading from the root to the previous
/// layer, indexed by level, so that a drop of any number of levels
/// finds its parent directly.
pub struct LayerTreeBuilder {
    // ancestors[0] is the root; ancestors[n] is the group at level n-1.
    ancestors: Vec<LayerId>,
    previous: LayerId,
}

/*--------------------------------------------------------------*/

impl LayerTreeBuilder {
    /// Start building under the sprite's root.
    pub fn new(sprite: &Sprite) -> Self {
        LayerTreeBuilder {
            ancestors: vec![sprite.root()],
            previous: sprite.root(),
        }
    }

    /// Level of the previous layer, -1 for the root.
    pub fn level(&self) -> isize {
        if self.previous == self.ancestors[0] {
            -1
        } else {
            self.ancestors.len() as isize - 1
        }
    }

    /// Attach a layer found at `level`.
    pub fn add(&mut self, sprite: &mut Sprite, layer: Layer, level: usize)
            -> AseResult<LayerId> {
        let current = self.level();

        if level as isize > current {
            if self.previous != self.ancestors[0] {
                if sprite.layer(self.previous).is_group() {
                    self.ancestors.push(self.previous);
                } else {
                    warn!("layer \"{}\" nested under an image layer, kept as a sibling",
                          layer.name());
                }
            }
        } else {
            self.ancestors.truncate(level + 1);
        }

        let parent = self.ancestors[self.ancestors.len() - 1];
        let id = sprite.add_layer(parent, layer)?;
        self.previous = id;
        Ok(id)
    }
}

/// Decode an ASE_CHUNK_LAYER chunk, attaching the layer to the tree.
pub fn decode_ase_layer<R: Read>(
        r: &mut R, sprite: &mut Sprite, tree: &mut LayerTreeBuilder)
        -> AseResult<LayerId> {
    let flags = r.read_u16::<LE>()?;
    let layer_type = r.read_u16::<LE>()?;
    let child_level = r.read_u16::<LE>()? as usize;
    let _default_w = r.read_u16::<LE>()?;
    let _default_h = r.read_u16::<LE>()?;
    let blend_mode = r.read_u16::<LE>()?;
    read_padding(r, 4)?;
    let name = read_string(r)?;

    let mut layer = match layer_type {
        ASE_LAYER_IMAGE => Layer::new_image(&name),
        ASE_LAYER_GROUP => Layer::new_group(&name),
        _ => return Err(AseError::UnsupportedLayerType(layer_type)),
    };

    layer.set_flags(flags);
    layer.set_blend_mode(blend_mode);

    debug!("layer \"{}\" at level {}", name, child_level);
    tree.add(sprite, layer, child_level)
}

/// Encode an ASE_CHUNK_LAYER chunk.
pub fn encode_ase_layer<W: Write>(sprite: &Sprite, id: LayerId, w: &mut W)
        -> AseResult<()> {
    let layer = sprite.layer(id);
    let layer_type = if layer.is_image() { ASE_LAYER_IMAGE } else { ASE_LAYER_GROUP };
    let child_level = sprite.layer_level(id);
    if child_level > ::std::u16::MAX as usize {
        return Err(AseError::ExceededLimit);
    }

    w.write_u16::<LE>(layer.flags())?;
    w.write_u16::<LE>(layer_type)?;
    w.write_u16::<LE>(child_level as u16)?;
    w.write_u16::<LE>(0)?; // default width
    w.write_u16::<LE>(0)?; // default height
    w.write_u16::<LE>(layer.blend_mode())?;
    write_padding(w, 4)?;
    write_string(w, layer.name())?;

    Ok(())
}
