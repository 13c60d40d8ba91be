use crate::core::geo::FragmentCoord;
use crate::fragment::{fragment::Fragment, layer::LayerId};

/// Supplies fragments to the grid and takes them back when they scroll out.
///
/// Every call happens while the map lock is held, so implementations get
/// exclusive access and must not block on content production. A requested
/// fragment may come back empty and be filled later.
pub trait FragmentProvider: Send + 'static {
    type Fragment: Fragment;

    /// Hands out the fragment whose origin is `coord`
    fn request_fragment(&mut self, coord: FragmentCoord) -> Self::Fragment;

    /// Takes back a fragment that left the grid
    fn recycle_fragment(&mut self, fragment: Self::Fragment);

    /// Regenerates one layer of one resident fragment
    fn repaint_layer(&mut self, fragment: &Self::Fragment, layer: LayerId);

    /// Refreshes time-varying layers of every resident fragment before the
    /// live pass draws them
    fn refresh_live_layers(&mut self, _time: f32) {}

    /// Releases everything the provider still holds
    fn reset(&mut self);
}
