pub mod events;
pub mod tracker;

pub use events::*;
pub use tracker::*;
