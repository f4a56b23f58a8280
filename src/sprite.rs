//! Sprite implementation.
//!
//! The sprite owns everything the codec reads or writes: canvas
//! metadata, frame durations, palettes, the layer tree, the image
//! stock and the selection masks.  Layers and images live in arenas
//! and are addressed by opaque handles, so parents, children and cels
//! never hold pointers to one another.

use ::{AseError,AseResult};
use ::raster::{Image,PixelFormat,Rgba};

/// Default frame duration, in milliseconds.
pub const DEFAULT_FRAME_DURATION: u16 = 100;

/// Layer flag: the layer is visible.
pub const LAYER_IS_READABLE: u16 = 0x0001;

/// Layer flag: the layer can be edited.
pub const LAYER_IS_WRITABLE: u16 = 0x0002;

/// Layer flag: the layer cannot be moved.
pub const LAYER_IS_LOCKMOVE: u16 = 0x0004;

/// Layer flag: the layer is the background.
pub const LAYER_IS_BACKGROUND: u16 = 0x0008;

/// Handle of a layer within its sprite.
#[derive(Clone,Copy,Debug,Eq,Hash,PartialEq)]
pub struct LayerId(usize);

/// Handle of an image within the sprite's stock.
#[derive(Clone,Copy,Debug,Eq,Hash,PartialEq)]
pub struct ImageId(usize);

/// Placement of one image on one (layer, frame) pair.
#[derive(Clone,Debug,Eq,PartialEq)]
pub struct Cel {
    pub frame: u16,
    pub x: i32,
    pub y: i32,
    pub opacity: u8,
    pub image: Option<ImageId>,
}

/// What a layer holds.
#[derive(Clone,Debug)]
pub enum LayerKind {
    /// Cels sorted by frame.
    Image {
        blend_mode: u16,
        cels: Vec<Cel>,
    },

    /// Child layers, bottom to top.
    Group {
        children: Vec<LayerId>,
    },
}

/// A node of the layer tree.
#[derive(Clone,Debug)]
pub struct Layer {
    name: String,
    flags: u16,
    parent: Option<LayerId>,
    kind: LayerKind,
}

/// Palette that becomes active at a frame.
#[derive(Clone,Debug,Eq,PartialEq)]
pub struct Palette {
    frame: u16,
    entries: Vec<Rgba>,
}

/// A named 1-bit selection mask.
#[derive(Clone,Debug,Eq,PartialEq)]
pub struct Mask {
    pub name: String,
    pub x: i16,
    pub y: i16,
    w: usize,
    h: usize,
    bitmap: Vec<bool>,
}

/// Pool of images, addressed by `ImageId`.
#[derive(Clone,Debug,Default)]
pub struct Stock {
    images: Vec<Option<Image>>,
}

/// A layered, multi-frame sprite.
pub struct Sprite {
    w: u16,
    h: u16,
    format: PixelFormat,
    transparent_index: u8,
    durations: Vec<u16>,
    palettes: Vec<Palette>,
    layers: Vec<Layer>,
    // Pre-order of all layers but the root, and each layer's position in it.
    order: Vec<LayerId>,
    positions: Vec<Option<usize>>,
    stock: Stock,
    masks: Vec<Mask>,
}

/*--------------------------------------------------------------*/

impl Cel {
    /// Create a fully opaque cel at the origin.
    pub fn new(frame: u16, image: Option<ImageId>) -> Self {
        Cel {
            frame: frame,
            x: 0,
            y: 0,
            opacity: 255,
            image: image,
        }
    }
}

impl Layer {
    /// Create an image layer, visible and editable.
    pub fn new_image(name: &str) -> Self {
        Layer {
            name: name.to_string(),
            flags: LAYER_IS_READABLE | LAYER_IS_WRITABLE,
            parent: None,
            kind: LayerKind::Image {
                blend_mode: 0,
                cels: Vec::new(),
            },
        }
    }

    /// Create a group layer, visible and editable.
    pub fn new_group(name: &str) -> Self {
        Layer {
            name: name.to_string(),
            flags: LAYER_IS_READABLE | LAYER_IS_WRITABLE,
            parent: None,
            kind: LayerKind::Group {
                children: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn flags(&self) -> u16 {
        self.flags
    }

    pub fn set_flags(&mut self, flags: u16) {
        self.flags = flags;
    }

    pub fn parent(&self) -> Option<LayerId> {
        self.parent
    }

    pub fn kind(&self) -> &LayerKind {
        &self.kind
    }

    pub fn is_image(&self) -> bool {
        match self.kind {
            LayerKind::Image { .. } => true,
            LayerKind::Group { .. } => false,
        }
    }

    pub fn is_group(&self) -> bool {
        !self.is_image()
    }

    /// Blend mode of an image layer; 0 for groups.
    pub fn blend_mode(&self) -> u16 {
        match self.kind {
            LayerKind::Image { blend_mode, .. } => blend_mode,
            LayerKind::Group { .. } => 0,
        }
    }

    /// Set the blend mode.  Groups ignore it.
    pub fn set_blend_mode(&mut self, mode: u16) {
        if let LayerKind::Image { ref mut blend_mode, .. } = self.kind {
            *blend_mode = mode;
        }
    }

    /// Cels of an image layer, sorted by frame.
    pub fn cels(&self) -> &[Cel] {
        match self.kind {
            LayerKind::Image { ref cels, .. } => cels,
            LayerKind::Group { .. } => &[],
        }
    }

    /// The cel placed at `frame`, if any.
    pub fn cel(&self, frame: u16) -> Option<&Cel> {
        let cels = self.cels();
        cels.binary_search_by(|c| c.frame.cmp(&frame))
            .ok()
            .map(|i| &cels[i])
    }

    /// Child layers of a group, bottom to top.
    pub fn children(&self) -> &[LayerId] {
        match self.kind {
            LayerKind::Image { .. } => &[],
            LayerKind::Group { ref children } => children,
        }
    }
}

impl Palette {
    /// Allocate a palette of `ncolors` opaque black entries.
    pub fn new(frame: u16, ncolors: usize) -> Self {
        Palette {
            frame: frame,
            entries: vec![Rgba::new(0, 0, 0, 255); ncolors],
        }
    }

    /// Frame at which this palette becomes active.
    pub fn frame(&self) -> u16 {
        self.frame
    }

    pub fn set_frame(&mut self, frame: u16) {
        self.frame = frame;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Rgba] {
        &self.entries
    }

    pub fn entry(&self, i: usize) -> Option<Rgba> {
        self.entries.get(i).cloned()
    }

    /// Set entry `i`, growing the palette if needed.
    pub fn set_entry(&mut self, i: usize, c: Rgba) {
        if i >= self.entries.len() {
            self.resize(i + 1);
        }
        self.entries[i] = c;
    }

    /// Resize the palette, new entries being opaque black.
    pub fn resize(&mut self, ncolors: usize) {
        self.entries.resize(ncolors, Rgba::new(0, 0, 0, 255));
    }

    /// Count the entries that differ between the two palettes,
    /// including entries present in only one of them.
    pub fn count_diff(&self, other: &Palette) -> usize {
        let common = self.entries.iter()
            .zip(other.entries.iter())
            .filter(|&(a, b)| a != b)
            .count();

        let extra = if self.len() > other.len() {
            self.len() - other.len()
        } else {
            other.len() - self.len()
        };

        common + extra
    }
}

impl Mask {
    /// Allocate an empty mask covering the given bounds.
    pub fn new(name: &str, x: i16, y: i16, w: usize, h: usize) -> Self {
        Mask {
            name: name.to_string(),
            x: x,
            y: y,
            w: w,
            h: h,
            bitmap: vec![false; w * h],
        }
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    /// Returns true if the pixel is inside the mask.
    /// Pixels outside the bounds never are.
    pub fn get(&self, u: usize, v: usize) -> bool {
        u < self.w && v < self.h && self.bitmap[self.w * v + u]
    }

    /// Set a pixel.  Pixels outside the bounds are ignored.
    pub fn set(&mut self, u: usize, v: usize, inside: bool) {
        if u < self.w && v < self.h {
            self.bitmap[self.w * v + u] = inside;
        }
    }
}

impl Stock {
    pub fn new() -> Self {
        Stock { images: Vec::new() }
    }

    /// Add an image to the stock.
    pub fn add(&mut self, image: Image) -> ImageId {
        self.images.push(Some(image));
        ImageId(self.images.len() - 1)
    }

    pub fn get(&self, id: ImageId) -> Option<&Image> {
        self.images.get(id.0).and_then(|i| i.as_ref())
    }

    pub fn get_mut(&mut self, id: ImageId) -> Option<&mut Image> {
        self.images.get_mut(id.0).and_then(|i| i.as_mut())
    }

    /// Remove an image.  Its handle is never reused.
    pub fn remove(&mut self, id: ImageId) -> Option<Image> {
        self.images.get_mut(id.0).and_then(|i| i.take())
    }

    /// Add a full copy of an existing image.
    pub fn duplicate(&mut self, id: ImageId) -> Option<ImageId> {
        let copy = match self.get(id) {
            Some(image) => image.clone(),
            None => return None,
        };
        Some(self.add(copy))
    }

    /// Number of live images.
    pub fn len(&self) -> usize {
        self.images.iter().filter(|i| i.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Sprite {
    /// Allocate a new sprite with a single frame, an empty layer tree
    /// and a palette of `ncolors` entries.
    ///
    /// # Examples
    ///
    /// ```
    /// let sprite = ase::Sprite::new(ase::PixelFormat::Indexed, 32, 32, 256);
    /// assert_eq!(sprite.total_frames(), 1);
    /// assert_eq!(sprite.palette(0).len(), 256);
    /// ```
    pub fn new(format: PixelFormat, w: u16, h: u16, ncolors: usize)
            -> Self {
        Sprite {
            w: w,
            h: h,
            format: format,
            transparent_index: 0,
            durations: vec![DEFAULT_FRAME_DURATION],
            palettes: vec![Palette::new(0, ncolors)],
            layers: vec![Layer::new_group("")],
            order: Vec::new(),
            positions: vec![None],
            stock: Stock::new(),
            masks: Vec::new(),
        }
    }

    pub fn width(&self) -> u16 {
        self.w
    }

    pub fn height(&self) -> u16 {
        self.h
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn transparent_index(&self) -> u8 {
        self.transparent_index
    }

    pub fn set_transparent_index(&mut self, index: u8) {
        self.transparent_index = index;
    }

    /*----------------------------------------------------------*/

    pub fn total_frames(&self) -> u16 {
        self.durations.len() as u16
    }

    /// Set the number of frames.  New frames get the default duration.
    pub fn set_total_frames(&mut self, frames: u16) {
        self.durations.resize(frames as usize, DEFAULT_FRAME_DURATION);
    }

    /// Duration of a frame in milliseconds, or 0 if out of range.
    pub fn frame_duration(&self, frame: u16) -> u16 {
        self.durations.get(frame as usize).cloned().unwrap_or(0)
    }

    pub fn set_frame_duration(&mut self, frame: u16, msecs: u16) {
        if let Some(d) = self.durations.get_mut(frame as usize) {
            *d = msecs;
        }
    }

    pub fn set_duration_for_all_frames(&mut self, msecs: u16) {
        for d in self.durations.iter_mut() {
            *d = msecs;
        }
    }

    /*----------------------------------------------------------*/

    /// The palette active at `frame`.
    pub fn palette(&self, frame: u16) -> &Palette {
        // palettes[0] is always at frame 0.
        let i = match self.palettes.binary_search_by(|p| p.frame.cmp(&frame)) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        &self.palettes[i]
    }

    /// All palettes, sorted by frame.
    pub fn palettes(&self) -> &[Palette] {
        &self.palettes
    }

    /// Install a palette at its frame, replacing any palette that
    /// starts at the same frame.
    pub fn set_palette(&mut self, pal: Palette) {
        match self.palettes.binary_search_by(|p| p.frame.cmp(&pal.frame)) {
            Ok(i) => self.palettes[i] = pal,
            Err(i) => self.palettes.insert(i, pal),
        }
    }

    /*----------------------------------------------------------*/

    /// The invisible group at the top of the layer tree.
    pub fn root(&self) -> LayerId {
        LayerId(0)
    }

    pub fn layer(&self, id: LayerId) -> &Layer {
        &self.layers[id.0]
    }

    pub fn layer_mut(&mut self, id: LayerId) -> &mut Layer {
        &mut self.layers[id.0]
    }

    /// Append a layer on top of the children of `parent`.
    pub fn add_layer(&mut self, parent: LayerId, mut layer: Layer)
            -> AseResult<LayerId> {
        if parent.0 >= self.layers.len() || !self.layers[parent.0].is_group() {
            return Err(AseError::BadInput);
        }

        let at_end = self.is_last_branch(parent);
        let id = LayerId(self.layers.len());
        layer.parent = Some(parent);
        self.layers.push(layer);

        if let LayerKind::Group { ref mut children } = self.layers[parent.0].kind {
            children.push(id);
        }

        if at_end {
            self.positions.push(Some(self.order.len()));
            self.order.push(id);
        } else {
            self.positions.push(None);
            self.reindex_layers();
        }

        Ok(id)
    }

    /// True if every layer from `id` up to the root is the topmost
    /// child of its parent, so a new child of `id` comes last in
    /// pre-order.
    fn is_last_branch(&self, mut id: LayerId) -> bool {
        while let Some(p) = self.layer(id).parent {
            if self.layer(p).children().last() != Some(&id) {
                return false;
            }
            id = p;
        }
        true
    }

    fn reindex_layers(&mut self) {
        let mut order = Vec::with_capacity(self.layers.len());
        let mut stack: Vec<LayerId> = self.layer(self.root()).children()
            .iter().rev().cloned().collect();

        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.layer(id).children().iter().rev());
        }

        self.positions = vec![None; self.layers.len()];
        for (i, id) in order.iter().enumerate() {
            self.positions[id.0] = Some(i);
        }
        self.order = order;
    }

    /// Number of parent links between the layer and the root, minus
    /// one.  Direct children of the root are at level 0.
    pub fn layer_level(&self, id: LayerId) -> usize {
        let mut level = 0;
        let mut parent = self.layer(id).parent;
        while let Some(p) = parent {
            parent = self.layer(p).parent;
            if parent.is_some() {
                level = level + 1;
            }
        }
        level
    }

    /// All layers except the root, in pre-order.  This is the order in
    /// which layers are numbered and stored.
    pub fn layers_preorder(&self) -> &[LayerId] {
        &self.order
    }

    /// Pre-order index of a layer.
    pub fn layer_to_index(&self, id: LayerId) -> Option<usize> {
        self.positions.get(id.0).and_then(|&i| i)
    }

    /// Layer at a pre-order index.
    pub fn index_to_layer(&self, index: usize) -> Option<LayerId> {
        self.order.get(index).cloned()
    }

    /*----------------------------------------------------------*/

    /// Place a cel in an image layer, replacing any cel at the same
    /// frame.
    pub fn add_cel(&mut self, layer: LayerId, cel: Cel)
            -> AseResult<()> {
        match self.layers.get_mut(layer.0).map(|l| &mut l.kind) {
            Some(&mut LayerKind::Image { ref mut cels, .. }) => {
                match cels.binary_search_by(|c| c.frame.cmp(&cel.frame)) {
                    Ok(i) => cels[i] = cel,
                    Err(i) => cels.insert(i, cel),
                }
                Ok(())
            },
            _ => Err(AseError::BadInput),
        }
    }

    pub fn stock(&self) -> &Stock {
        &self.stock
    }

    pub fn stock_mut(&mut self) -> &mut Stock {
        &mut self.stock
    }

    /// Image placed by the layer's cel at `frame`.
    pub fn cel_image(&self, layer: LayerId, frame: u16) -> Option<&Image> {
        self.layer(layer).cel(frame)
            .and_then(|c| c.image)
            .and_then(|id| self.stock.get(id))
    }

    /*----------------------------------------------------------*/

    pub fn masks(&self) -> &[Mask] {
        &self.masks
    }

    pub fn add_mask(&mut self, mask: Mask) {
        self.masks.push(mask);
    }
}
