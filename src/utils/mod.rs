pub mod concurrency;
pub mod json_array;
pub mod logging;
pub mod text;

pub use concurrency::map_with_concurrency;
pub use json_array::parse_json_array;
pub use text::{normalize_text, similarity};
