//! 命令行入口
//!
//! 解析子命令，组装各层并输出 JSON 结果

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::fs;
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, FileError};
use crate::models::{load_generation_request, ModelId};
use crate::orchestrator::BatchTestGenerator;
use crate::utils::logging;
use crate::workflow::PdfFlow;

#[derive(Parser, Debug)]
#[command(name = "exam_forge")]
#[command(about = "PDF 文本提取与分批出题")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// 覆盖日志级别 (trace/debug/info/warn/error)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 提取 PDF 每页文本（必要时 OCR）
    Extract {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// 重新扫描 PDF
    Rescan {
        #[arg(long)]
        input: PathBuf,
        /// 保存时使用的文件名，默认 rescan.pdf
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// 按 TOML 请求文件分批出题
    Generate {
        #[arg(long)]
        request: PathBuf,
        /// 覆盖请求中的模型 (gpt-4o-mini / claude)
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Extract { .. } => "extract",
            Command::Rescan { .. } => "rescan",
            Command::Generate { .. } => "generate",
        }
    }
}

/// 应用主结构
pub struct App {
    config: Config,
}

impl App {
    /// 初始化日志和日志文件
    pub fn initialize(config: Config, args: &Args) -> Result<Self> {
        logging::init(args.log_level.as_deref(), config.verbose_logging);
        logging::init_log_file(&config.output_log_file, args.cmd.name())
            .with_context(|| format!("无法写入日志文件 {}", config.output_log_file))?;
        log_startup(&config, args.cmd.name());
        Ok(Self { config })
    }

    /// 执行子命令
    pub async fn run(&self, cmd: Command) -> Result<()> {
        match cmd {
            Command::Extract { input, out } => {
                let bytes = read_input(&input).await?;
                let pdf = PdfFlow::from_config(&self.config)
                    .extract(&bytes, &display_name(&input))
                    .await?;
                info!("✓ 提取完成: {} 页, {} 字符", pdf.page_count, pdf.text.chars().count());
                write_json(&pdf, out.as_deref()).await
            }
            Command::Rescan { input, name, out } => {
                let bytes = read_input(&input).await?;
                let pdf = PdfFlow::from_config(&self.config)
                    .rescan(&bytes, name.as_deref())
                    .await?;
                info!("✓ 重扫完成: {} 页", pdf.page_count);
                write_json(&pdf, out.as_deref()).await
            }
            Command::Generate { request, model, out } => {
                let mut req = load_generation_request(&request).await?;
                if let Some(key) = model.as_deref() {
                    req.model = ModelId::parse(key)?;
                }
                let questions = BatchTestGenerator::from_config(&self.config)
                    .generate_in_batches(&req, |done, total| {
                        info!("⏳ 进度: {}/{} 批", done, total);
                    })
                    .await?;
                write_json(&questions, out.as_deref()).await
            }
        }
    }
}

fn log_startup(config: &Config, command: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 exam_forge 启动: {}", command);
    info!("🐍 渲染脚本: {} {}", config.python_exe.display(), config.render_script.display());
    info!(
        "🔑 OpenAI: {}, Anthropic: {}",
        if config.openai_api_key.is_some() { "已配置" } else { "未配置" },
        if config.anthropic_api_key.is_some() { "已配置" } else { "未配置" }
    );
    info!("{}", "=".repeat(60));
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.pdf".to_string())
}

async fn read_input(path: &Path) -> Result<Vec<u8>, AppError> {
    fs::read(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))
}

/// 写到文件，未指定时打印到 stdout
async fn write_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("序列化结果失败")?;
    match out {
        Some(path) => {
            fs::write(path, json).await.map_err(|source| {
                AppError::from(FileError::WriteFailed {
                    path: path.display().to_string(),
                    source,
                })
            })?;
            info!("💾 结果已写入 {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
