pub mod axis;
pub mod combination;
pub mod common;
pub mod group;
pub mod payload;
pub mod variant;

pub use axis::*;
pub use combination::*;
pub use common::*;
pub use group::*;
pub use payload::*;
pub use variant::*;
