mod avatar;
mod capabilities;
mod ids;

pub use avatar::*;
pub use capabilities::*;
pub use ids::*;
