pub mod camera;
pub mod config;
pub mod history;
pub mod navigator;
pub mod scrubber;
pub mod session;
pub mod view_state;
pub mod visual_distance;

pub use camera::*;
pub use config::*;
pub use history::*;
pub use navigator::*;
pub use scrubber::*;
pub use session::*;
pub use view_state::*;
pub use visual_distance::*;
