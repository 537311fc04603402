pub mod cache;
pub mod fetch;
pub mod generation;
pub mod ladder;
pub mod loader;
pub mod preload;
pub mod residency;
pub mod tier;
pub mod url;

pub use cache::*;
pub use fetch::*;
pub use generation::*;
pub use ladder::*;
pub use loader::*;
pub use preload::*;
pub use residency::*;
pub use tier::*;
pub use url::*;
