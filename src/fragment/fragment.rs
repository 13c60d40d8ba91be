use crate::core::{
    constants::{BIOME_SCALE, BIOME_SIZE, FRAGMENT_SIZE},
    geo::FragmentCoord,
    transform::AffineTransform,
};
use crate::fragment::{
    layer::{LayerClass, LayerId, LayerImage, LayerPass},
    object::MapObject,
};
use crate::rendering::{pipeline::MapView, surface::DrawSurface};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Biome identifier as produced by the world generator
pub type BiomeId = u16;

/// One fixed-size cell of the world, as handed out by a
/// [`FragmentProvider`](crate::tiles::provider::FragmentProvider).
///
/// The grid owns fragments while they are resident and only links them; the
/// fragment itself never sees its neighbours.
pub trait Fragment: Send + 'static {
    /// World origin of the fragment
    fn coord(&self) -> FragmentCoord;

    /// Draws everything belonging to `pass`. `transform` maps fragment-local
    /// world units (`0..FRAGMENT_SIZE`) to the screen.
    fn draw(
        &self,
        pass: LayerPass,
        surface: &mut dyn DrawSurface,
        transform: &AffineTransform,
        view: &MapView<'_>,
    );

    /// Points of interest located in this fragment. The returned slice is a
    /// snapshot and can be iterated any number of times.
    fn objects(&self) -> Arc<[MapObject]>;

    /// Biome sample at a fragment-local position
    fn biome_at(&self, _x_in_fragment: i64, _y_in_fragment: i64) -> Option<BiomeId> {
        None
    }

    /// Whether the content has been produced at least once
    fn is_loaded(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
struct LayerContent {
    id: LayerId,
    class: LayerClass,
    image: LayerImage,
}

/// Mutable content of a [`BasicFragment`], filled by loaders
#[derive(Debug, Clone)]
pub struct FragmentContent {
    layers: Vec<LayerContent>,
    objects: Arc<[MapObject]>,
    biomes: Option<Arc<[BiomeId]>>,
    loaded: bool,
}

impl Default for FragmentContent {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            objects: Arc::from(Vec::new()),
            biomes: None,
            loaded: false,
        }
    }
}

impl FragmentContent {
    /// Inserts or replaces a layer, keeping layers ordered by id
    pub fn set_layer(&mut self, id: LayerId, class: LayerClass, image: LayerImage) {
        let content = LayerContent { id, class, image };
        match self.layers.binary_search_by_key(&id, |layer| layer.id) {
            Ok(index) => self.layers[index] = content,
            Err(index) => self.layers.insert(index, content),
        }
    }

    pub fn layer(&self, id: LayerId) -> Option<&LayerImage> {
        self.layers
            .binary_search_by_key(&id, |layer| layer.id)
            .ok()
            .map(|index| &self.layers[index].image)
    }

    pub fn layer_ids(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.layers.iter().map(|layer| layer.id)
    }

    pub fn set_objects(&mut self, objects: Vec<MapObject>) {
        self.objects = objects.into();
    }

    pub fn set_biomes(&mut self, biomes: Option<Vec<BiomeId>>) {
        self.biomes = biomes.map(Arc::from);
    }

    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

/// Content shared between a fragment and the loaders filling it
pub type SharedContent = Arc<RwLock<FragmentContent>>;

/// Fragment whose content sits behind a shared lock so background loaders
/// can populate it while the grid owns the fragment.
#[derive(Debug, Clone)]
pub struct BasicFragment {
    coord: FragmentCoord,
    content: SharedContent,
}

impl BasicFragment {
    pub fn new(coord: FragmentCoord) -> Self {
        Self {
            coord,
            content: Arc::new(RwLock::new(FragmentContent::default())),
        }
    }

    pub fn content_handle(&self) -> SharedContent {
        self.content.clone()
    }

    pub fn read(&self) -> RwLockReadGuard<'_, FragmentContent> {
        self.content.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, FragmentContent> {
        self.content.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn layer_image(&self, id: LayerId) -> Option<LayerImage> {
        self.read().layer(id).cloned()
    }
}

impl Fragment for BasicFragment {
    fn coord(&self) -> FragmentCoord {
        self.coord
    }

    fn draw(
        &self,
        pass: LayerPass,
        surface: &mut dyn DrawSurface,
        transform: &AffineTransform,
        view: &MapView<'_>,
    ) {
        let content = self.read();
        match pass.layer_class() {
            Some(class) => {
                for layer in content.layers.iter().filter(|layer| layer.class == class) {
                    let image = &layer.image;
                    if image.width() == 0 || image.height() == 0 {
                        continue;
                    }
                    // stretch the layer's raster over the whole fragment
                    let mut layer_transform = *transform;
                    layer_transform.scale(
                        FRAGMENT_SIZE as f64 / image.width() as f64,
                        FRAGMENT_SIZE as f64 / image.height() as f64,
                    );
                    surface.draw_image(image, &layer_transform);
                }
            }
            None => {
                for object in content.objects.iter().filter(|object| object.visible) {
                    let marker = transform
                        .translated(object.x_in_fragment as f64, object.y_in_fragment as f64);
                    surface.draw_marker(object, &marker, view.is_selected(object));
                }
            }
        }
    }

    fn objects(&self) -> Arc<[MapObject]> {
        self.read().objects.clone()
    }

    fn biome_at(&self, x_in_fragment: i64, y_in_fragment: i64) -> Option<BiomeId> {
        if !(0..FRAGMENT_SIZE).contains(&x_in_fragment)
            || !(0..FRAGMENT_SIZE).contains(&y_in_fragment)
        {
            return None;
        }
        let index = (y_in_fragment / BIOME_SCALE) as usize * BIOME_SIZE
            + (x_in_fragment / BIOME_SCALE) as usize;
        self.read()
            .biomes
            .as_ref()
            .and_then(|biomes| biomes.get(index).copied())
    }

    fn is_loaded(&self) -> bool {
        self.read().loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::Point;
    use crate::rendering::context::{DrawCommand, RenderContext};

    fn fragment_with_content() -> BasicFragment {
        let fragment = BasicFragment::new(FragmentCoord::new(512, 0));
        {
            let mut content = fragment.write();
            content.set_layer(LayerId(2), LayerClass::Live, LayerImage::solid(4, 4, 2));
            content.set_layer(LayerId(1), LayerClass::Image, LayerImage::solid(128, 128, 1));
            content.set_objects(vec![
                MapObject::new(7, "village", 10, 20),
                MapObject::new(8, "temple", 30, 40).hidden(),
            ]);
            let mut biomes = vec![0; BIOME_SIZE * BIOME_SIZE];
            biomes[3 * BIOME_SIZE + 5] = 42;
            content.set_biomes(Some(biomes));
            content.mark_loaded();
        }
        fragment
    }

    #[test]
    fn test_layers_stay_sorted_and_replaceable() {
        let fragment = fragment_with_content();
        fragment
            .write()
            .set_layer(LayerId(1), LayerClass::Image, LayerImage::solid(1, 1, 9));

        let content = fragment.read();
        assert_eq!(content.layer_ids().collect::<Vec<_>>(), vec![LayerId(1), LayerId(2)]);
        assert_eq!(content.layer(LayerId(1)).unwrap().pixel(0, 0), Some(9));
    }

    #[test]
    fn test_draw_image_pass_stretches_layer() {
        let fragment = fragment_with_content();
        let mut context = RenderContext::new(1024.0, 1024.0);
        let view = MapView::detached(0.0, 1.0);

        fragment.draw(
            LayerPass::Image,
            &mut context,
            &AffineTransform::translation(100.0, 0.0),
            &view,
        );

        let commands = context.commands();
        assert_eq!(commands.len(), 1);
        match &commands[0] {
            DrawCommand::Image { bounds, .. } => {
                assert_eq!(bounds.min, Point::new(100.0, 0.0));
                assert_eq!(bounds.max, Point::new(612.0, 512.0));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_draw_objects_skips_hidden_markers() {
        let fragment = fragment_with_content();
        let mut context = RenderContext::new(1024.0, 1024.0);
        let selected = MapObject::new(7, "village", 10, 20);
        let view = MapView::detached(0.0, 2.0).with_selected(Some(&selected));

        let mut transform = AffineTransform::identity();
        transform.scale(2.0, 2.0);
        fragment.draw(LayerPass::Objects, &mut context, &transform, &view);

        let commands = context.commands();
        assert_eq!(commands.len(), 1);
        match &commands[0] {
            DrawCommand::Marker { id, position, selected, .. } => {
                assert_eq!(*id, crate::fragment::object::ObjectId(7));
                assert_eq!(*position, Point::new(20.0, 40.0));
                assert!(*selected);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_biome_lookup_uses_biome_resolution() {
        let fragment = fragment_with_content();
        assert_eq!(fragment.biome_at(5 * BIOME_SCALE + 3, 3 * BIOME_SCALE), Some(42));
        assert_eq!(fragment.biome_at(0, 0), Some(0));
        assert_eq!(fragment.biome_at(FRAGMENT_SIZE, 0), None);
        assert!(fragment.is_loaded());
        assert!(!BasicFragment::new(FragmentCoord::new(0, 0)).is_loaded());
    }
}
