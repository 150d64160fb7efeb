pub mod background;
pub mod loader;

pub use background::{BackgroundSource, load_background};
pub use loader::{DEFAULT_MASK_THRESHOLD, discover_object_pairs, load_object};
