pub mod pdf_flow;

pub use pdf_flow::{PdfFlow, RESCAN_FILE_NAME};
