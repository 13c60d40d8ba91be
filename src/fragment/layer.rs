use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identifies one content layer of a fragment (biomes, slime chunks, grid...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub u32);

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// How a layer's content evolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerClass {
    /// Rendered once per fragment, redrawn only on explicit repaint
    Image,
    /// Time-varying, refreshed every frame before it is drawn
    Live,
}

/// The three render passes, drawn in this order every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerPass {
    Image,
    Live,
    Objects,
}

impl LayerPass {
    pub const ORDER: [LayerPass; 3] = [LayerPass::Image, LayerPass::Live, LayerPass::Objects];

    /// The layer class drawn by this pass, `None` for the object pass
    pub fn layer_class(&self) -> Option<LayerClass> {
        match self {
            Self::Image => Some(LayerClass::Image),
            Self::Live => Some(LayerClass::Live),
            Self::Objects => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    pub id: LayerId,
    pub class: LayerClass,
    pub name: String,
}

impl LayerDescriptor {
    pub fn new(id: u32, class: LayerClass, name: impl Into<String>) -> Self {
        Self {
            id: LayerId(id),
            class,
            name: name.into(),
        }
    }
}

/// Pre-rendered raster content of one layer, ARGB pixels in row-major order.
///
/// Cloning is cheap, the pixel buffer is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerImage {
    width: u32,
    height: u32,
    pixels: Arc<[u32]>,
}

impl LayerImage {
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(MapError::InvalidImage(format!(
                "{}x{} image needs {} pixels, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels: pixels.into(),
        })
    }

    /// Image filled with a single colour
    pub fn solid(width: u32, height: u32, argb: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![argb; width as usize * height as usize].into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}
