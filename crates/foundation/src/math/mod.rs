pub mod angles;
pub mod precision;
pub mod search;
pub mod sphere;
pub mod vec;

pub use angles::*;
pub use precision::*;
pub use search::*;
pub use sphere::*;
pub use vec::*;
