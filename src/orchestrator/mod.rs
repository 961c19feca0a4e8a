//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::BatchTestGenerator (整套题，多批次)
//!     ↓
//! services::QuestionGenerator (单批次：提示词 → 模型 → 解析 → 校验)
//!     ↓
//! clients (OpenAI / Anthropic)
//! ```
//!
//! PDF 提取不经过本层，见 `workflow::PdfFlow`

pub mod batch_generator;

pub use batch_generator::BatchTestGenerator;
