use crate::error::{AppError, AppResult, FileError};
use crate::models::generation::{Difficulty, ExamFormat, GenerationRequest, Language, ModelId};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// TOML 请求文件
///
/// 来源文本可以直接写在 `texts` 里，也可以用 `text_files` 指向文本文件
/// （相对路径以 TOML 文件所在目录为基准），两者按顺序拼接
#[derive(Debug, Deserialize)]
struct RequestFile {
    #[serde(default)]
    texts: Vec<String>,
    #[serde(default)]
    text_files: Vec<PathBuf>,
    difficulty: Difficulty,
    language: Language,
    model: ModelId,
    questions_count: usize,
    pdf_name: String,
    exam_format: Option<ExamFormat>,
    exam_context: Option<String>,
    instructions: Option<String>,
}

/// 从 TOML 文件加载出题请求
pub async fn load_generation_request(toml_file_path: &Path) -> AppResult<GenerationRequest> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(toml_file_path.display().to_string(), e))?;

    let file: RequestFile = toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
        path: toml_file_path.display().to_string(),
        source,
    })?;

    let base_dir = toml_file_path.parent().unwrap_or_else(|| Path::new("."));
    let mut texts = file.texts;
    for text_file in &file.text_files {
        let path = if text_file.is_absolute() {
            text_file.clone()
        } else {
            base_dir.join(text_file)
        };
        let text = fs::read_to_string(&path)
            .await
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        info!(
            "已加载来源文本: {} ({} 字符)",
            path.display(),
            text.chars().count()
        );
        texts.push(text);
    }

    Ok(GenerationRequest {
        texts,
        difficulty: file.difficulty,
        language: file.language,
        model: file.model,
        questions_count: file.questions_count,
        pdf_name: file.pdf_name,
        exam_format: file.exam_format,
        exam_context: file.exam_context,
        instructions: file.instructions,
    })
}
