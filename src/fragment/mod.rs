pub mod fragment;
pub mod layer;
pub mod object;

pub use fragment::{BasicFragment, BiomeId, Fragment, FragmentContent, SharedContent};
pub use layer::{LayerClass, LayerDescriptor, LayerId, LayerImage, LayerPass};
pub use object::{MapObject, ObjectId};
