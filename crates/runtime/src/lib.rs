pub mod clock;
pub mod debounce;
pub mod event_bus;
pub mod metrics;
pub mod work_queue;

pub use clock::*;
pub use debounce::*;
pub use event_bus::*;
pub use metrics::*;
pub use work_queue::*;
