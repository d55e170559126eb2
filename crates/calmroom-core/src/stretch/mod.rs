mod catalog;
mod player;

pub use catalog::{Stretch, StretchCatalog};
pub use player::{StretchPlayer, StretchSnapshot};
