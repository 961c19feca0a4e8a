pub mod page_renderer;

pub use page_renderer::{is_valid_pdf, PageRenderer, PythonPageRenderer};
