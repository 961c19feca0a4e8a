pub mod dedup;
pub mod generation_service;
pub mod ocr_service;
pub mod prompt_builder;
pub mod question_validator;
pub mod rate_limit;

pub use dedup::{deduplicate_questions, renumber_questions};
pub use generation_service::{GenerationService, QuestionGenerator};
pub use ocr_service::OcrService;
pub use prompt_builder::{build_ocr_instruction, build_test_prompt, PromptConfig};
pub use question_validator::validate_questions;
pub use rate_limit::retry_delay;
