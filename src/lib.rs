//! # Exam Forge
//!
//! 学习辅助核心：从 PDF 讲义提取文本，并用大模型分批生成试题
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 外部渲染进程，只暴露"渲染页面"的能力
//!
//! ### ② 客户端（Clients）
//! - `clients/` - OpenAI / Anthropic 出题接口，视觉 OCR 接口
//!
//! ### ③ 业务能力层（Services）
//! - `OcrService` - 稀疏页分批视觉识别，限流重试
//! - `GenerationService` - 单批次出题（提示词 → 模型 → 解析 → 校验）
//! - `prompt_builder` / `question_validator` / `dedup` / `rate_limit`
//!
//! ### ④ 流程层（Workflow）
//! - `PdfFlow` - 上传 / 重扫：检查 → 渲染 → 按需 OCR → 拼接
//!
//! ### ⑤ 编排层（Orchestration）
//! - `BatchTestGenerator` - 顺序分批、补齐、去重、重新编号

pub mod app;
pub mod clients;
pub mod config;
pub mod constants;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{ExtractedPdf, GenerationRequest, Question, QuestionType};
pub use orchestrator::BatchTestGenerator;
pub use workflow::PdfFlow;
