use crate::core::{
    constants::FRAGMENT_SIZE,
    geo::{FragmentCoord, Point},
    transform::AffineTransform,
};
use crate::fragment::{fragment::Fragment, layer::LayerPass, object::MapObject};
use crate::grid::FragmentGrid;
use crate::rendering::surface::{DrawSurface, Interpolation};
use crate::tiles::provider::FragmentProvider;

/// Read-only snapshot of the map handed to fragments while they draw
#[derive(Debug, Clone, Copy)]
pub struct MapView<'a> {
    pub time: f32,
    pub scale: f64,
    /// Screen offset of the first fragment
    pub origin: Point,
    pub viewer_size: (f64, f64),
    /// Coordinate of the first fragment, `None` outside a map frame
    pub anchor: Option<FragmentCoord>,
    pub selected: Option<&'a MapObject>,
}

impl<'a> MapView<'a> {
    /// View that is not tied to any grid, for drawing fragments directly
    pub fn detached(time: f32, scale: f64) -> Self {
        Self {
            time,
            scale,
            origin: Point::default(),
            viewer_size: (0.0, 0.0),
            anchor: None,
            selected: None,
        }
    }

    pub fn with_selected(mut self, selected: Option<&'a MapObject>) -> Self {
        self.selected = selected;
        self
    }

    pub fn is_selected(&self, object: &MapObject) -> bool {
        self.selected.map_or(false, |selected| selected.id == object.id)
    }

    /// Screen position of a world point, if the view is anchored
    pub fn world_to_screen(&self, world: Point) -> Option<Point> {
        let anchor = self.anchor?;
        Some(
            world
                .subtract(&anchor.as_point())
                .multiply(self.scale)
                .add(&self.origin),
        )
    }
}

/// Transform shared by every fragment of a frame: the surface's base
/// transform followed by the origin offset and zoom
pub fn grid_transform(base: &AffineTransform, origin: Point, scale: f64) -> AffineTransform {
    let mut transform = *base;
    transform.translate(origin.x, origin.y);
    transform.scale(scale, scale);
    transform
}

/// Places a fragment at its slot in the grid
pub fn slot_transform(grid_transform: &AffineTransform, row: usize, col: usize) -> AffineTransform {
    grid_transform.translated(
        (col as i64 * FRAGMENT_SIZE) as f64,
        (row as i64 * FRAGMENT_SIZE) as f64,
    )
}

/// Draws one frame of `grid` in three passes: image layers, live layers,
/// then object markers. The surface transform is restored before
/// returning. Returns the number of fragments visited per pass.
pub fn render_grid<P>(
    grid: &FragmentGrid<P::Fragment>,
    provider: &mut P,
    surface: &mut dyn DrawSurface,
    view: &MapView<'_>,
) -> usize
where
    P: FragmentProvider,
{
    let base = surface.transform();
    let frame_transform = grid_transform(&base, view.origin, view.scale);

    surface.set_interpolation(Interpolation::NearestNeighbor);
    let mut visited = 0;
    for pass in LayerPass::ORDER {
        if pass == LayerPass::Live {
            provider.refresh_live_layers(view.time);
        }
        visited = draw_pass(grid, pass, surface, &frame_transform, view);
    }
    surface.set_transform(base);

    log::trace!(
        "rendered {visited} fragments ({}x{}) at scale {:.3}",
        grid.rows(),
        grid.cols(),
        view.scale
    );
    visited
}

fn draw_pass<F: Fragment>(
    grid: &FragmentGrid<F>,
    pass: LayerPass,
    surface: &mut dyn DrawSurface,
    frame_transform: &AffineTransform,
    view: &MapView<'_>,
) -> usize {
    let mut visited = 0;
    for cell in grid.iter().positioned() {
        let transform = slot_transform(frame_transform, cell.row, cell.col);
        surface.set_transform(transform);
        cell.fragment.draw(pass, surface, &transform, view);
        visited += 1;
    }
    visited
}
