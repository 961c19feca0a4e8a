use std::path::PathBuf;

use crate::constants::{
    MAX_RETRIES, OCR_CONCURRENCY, OCR_STAGGER_MS, PAGES_PER_BATCH, RENDER_MAX_OUTPUT_BYTES,
    RENDER_TIMEOUT_SECS,
};

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- 模型服务 ---
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openai_api_base_url: String,
    pub anthropic_api_base_url: String,
    /// `gpt-4o-mini` 对应的实际模型名，同时用于视觉 OCR
    pub openai_model_name: String,
    /// `claude` 对应的实际模型名
    pub anthropic_model_name: String,
    // --- 外部渲染进程 ---
    pub python_exe: PathBuf,
    pub render_script: PathBuf,
    pub render_timeout_secs: u64,
    pub render_max_output_bytes: usize,
    // --- OCR ---
    pub ocr_concurrency: usize,
    pub ocr_pages_per_batch: usize,
    pub ocr_max_retries: usize,
    pub ocr_stagger_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            openai_api_base_url: "https://api.openai.com/v1".to_string(),
            anthropic_api_base_url: "https://api.anthropic.com/v1".to_string(),
            openai_model_name: "gpt-4o-mini".to_string(),
            anthropic_model_name: "claude-sonnet-4-5-20250929".to_string(),
            python_exe: venv_python(&default_venv_dir()),
            render_script: PathBuf::from("scripts").join("render_pages.py"),
            render_timeout_secs: RENDER_TIMEOUT_SECS,
            render_max_output_bytes: RENDER_MAX_OUTPUT_BYTES,
            ocr_concurrency: OCR_CONCURRENCY,
            ocr_pages_per_batch: PAGES_PER_BATCH,
            ocr_max_retries: MAX_RETRIES,
            ocr_stagger_ms: OCR_STAGGER_MS,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),
            openai_api_base_url: std::env::var("OPENAI_API_BASE_URL").unwrap_or(default.openai_api_base_url),
            anthropic_api_base_url: std::env::var("ANTHROPIC_API_BASE_URL").unwrap_or(default.anthropic_api_base_url),
            openai_model_name: std::env::var("OPENAI_MODEL_NAME").unwrap_or(default.openai_model_name),
            anthropic_model_name: std::env::var("ANTHROPIC_MODEL_NAME").unwrap_or(default.anthropic_model_name),
            python_exe: non_empty_var("STARK_VENV_PATH").map(|v| venv_python(&PathBuf::from(v))).unwrap_or(default.python_exe),
            render_script: std::env::var("RENDER_SCRIPT").map(PathBuf::from).unwrap_or(default.render_script),
            render_timeout_secs: parsed_var("RENDER_TIMEOUT_SECS").unwrap_or(default.render_timeout_secs),
            render_max_output_bytes: parsed_var("RENDER_MAX_OUTPUT_BYTES").unwrap_or(default.render_max_output_bytes),
            ocr_concurrency: parsed_var("OCR_CONCURRENCY").unwrap_or(default.ocr_concurrency),
            ocr_pages_per_batch: parsed_var("OCR_PAGES_PER_BATCH").unwrap_or(default.ocr_pages_per_batch),
            ocr_max_retries: parsed_var("OCR_MAX_RETRIES").unwrap_or(default.ocr_max_retries),
            ocr_stagger_ms: parsed_var("OCR_STAGGER_MS").unwrap_or(default.ocr_stagger_ms),
            verbose_logging: parsed_var("VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn default_venv_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".stark-venv")
}

fn venv_python(venv: &std::path::Path) -> PathBuf {
    venv.join("bin").join("python3")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_contract_constants() {
        let config = Config::default();
        assert_eq!(config.render_timeout_secs, 120);
        assert_eq!(config.render_max_output_bytes, 200 * 1024 * 1024);
        assert_eq!(config.ocr_concurrency, 3);
        assert_eq!(config.ocr_pages_per_batch, 3);
        assert_eq!(config.ocr_max_retries, 4);
        assert!(config.python_exe.ends_with("bin/python3"));
        assert!(config.openai_api_key.is_none());
    }
}
