pub mod generation;
pub mod loaders;
pub mod page;
pub mod question;

pub use generation::{Difficulty, ExamFormat, GenerationBatch, GenerationRequest, Language, ModelId};
pub use loaders::load_generation_request;
pub use page::{ExtractedPdf, OcrPage, RenderOutput};
pub use question::{Question, QuestionType};
