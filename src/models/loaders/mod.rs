pub mod ids_loader;
pub mod tags_loader;

pub use ids_loader::{load_ids_file, parse_ids};
pub use tags_loader::{load_tags_file, parse_tags};
