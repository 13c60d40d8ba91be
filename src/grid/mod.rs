pub mod iter;
pub mod linked;

pub use iter::{GridCell, GridIter, Positioned, PositionedCell};
pub use linked::{FragmentGrid, GridDimensions, GridEdge};
