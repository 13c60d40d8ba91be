pub mod pool;
pub mod provider;
pub mod source;

pub use pool::{PoolStats, PooledFragmentProvider};
pub use provider::FragmentProvider;
pub use source::FragmentSource;
