//! 页面渲染器 - 基础设施层
//!
//! 调用外部 Python 脚本逐页提取原生文本，并把文本稀疏的页面渲染成图片。
//! 只负责进程调用和输出解析，不认识 OCR 或出题流程。

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::Config;
use crate::constants::MIN_CHARS_PER_PAGE;
use crate::error::ExtractionError;
use crate::models::RenderOutput;

const PDF_MAGIC: &[u8] = b"%PDF";

/// 文件头是否为 `%PDF`
pub fn is_valid_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// 页面渲染能力
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// 渲染一份 PDF，返回每页原生文本和需要 OCR 的页面图片
    async fn render_pages(&self, pdf: &[u8], file_name: &str) -> Result<RenderOutput, ExtractionError>;
}

/// 基于 Python 脚本的渲染器
pub struct PythonPageRenderer {
    python_exe: PathBuf,
    render_script: PathBuf,
    timeout: Duration,
    max_output_bytes: usize,
}

impl PythonPageRenderer {
    pub fn new(config: &Config) -> Self {
        Self {
            python_exe: config.python_exe.clone(),
            render_script: config.render_script.clone(),
            timeout: Duration::from_secs(config.render_timeout_secs),
            max_output_bytes: config.render_max_output_bytes,
        }
    }

    /// 运行脚本，返回 (是否成功退出, stdout, stderr)
    async fn run_script(&self, pdf_path: &Path) -> Result<(bool, Vec<u8>, Vec<u8>), ExtractionError> {
        let mut child = Command::new(&self.python_exe)
            .arg(&self.render_script)
            .arg(pdf_path)
            .arg(MIN_CHARS_PER_PAGE.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExtractionError::Spawn {
                program: self.python_exe.display().to_string(),
                source,
            })?;

        // stderr 单独读取，避免管道写满阻塞子进程
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = stderr.read_to_end(&mut buf).await;
                buf
            })
        });

        let mut stdout_buf = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            stdout
                .take(self.max_output_bytes as u64 + 1)
                .read_to_end(&mut stdout_buf)
                .await
                .map_err(|e| ExtractionError::RendererFailed {
                    message: format!("读取渲染输出失败: {}", e),
                })?;
        }
        if stdout_buf.len() > self.max_output_bytes {
            return Err(ExtractionError::OutputTooLarge {
                limit: self.max_output_bytes,
            });
        }

        let status = child.wait().await.map_err(|e| ExtractionError::RendererFailed {
            message: format!("等待渲染进程失败: {}", e),
        })?;

        let stderr_buf = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => Vec::new(),
        };

        Ok((status.success(), stdout_buf, stderr_buf))
    }
}

#[async_trait]
impl PageRenderer for PythonPageRenderer {
    async fn render_pages(&self, pdf: &[u8], file_name: &str) -> Result<RenderOutput, ExtractionError> {
        let base_name = Path::new(file_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.pdf".to_string());

        // 临时文件在离开作用域时删除，覆盖成功、失败和超时所有路径
        let mut temp_file = tempfile::Builder::new()
            .prefix("stark-")
            .suffix(&format!("-{}", base_name))
            .tempfile()
            .map_err(|source| ExtractionError::TempFile { source })?;
        temp_file
            .write_all(pdf)
            .and_then(|_| temp_file.flush())
            .map_err(|source| ExtractionError::TempFile { source })?;

        debug!("渲染临时文件: {}", temp_file.path().display());

        let (success, stdout, stderr) = tokio::time::timeout(self.timeout, self.run_script(temp_file.path()))
            .await
            .map_err(|_| ExtractionError::Timeout {
                seconds: self.timeout.as_secs(),
            })??;

        let output = decode_output(success, &stdout, &stderr)?;
        info!(
            "✓ 渲染完成: {} 页，其中 {} 页需要 OCR",
            output.page_count,
            output.ocr_pages.len()
        );
        Ok(output)
    }
}

/// 解析脚本输出
///
/// 脚本出错时会在 stdout 打印 `{"error": ...}` 并以非零状态退出；
/// stdout 无法解析时退回使用 stderr 作为错误信息
fn decode_output(success: bool, stdout: &[u8], stderr: &[u8]) -> Result<RenderOutput, ExtractionError> {
    match serde_json::from_slice::<RenderOutput>(stdout) {
        Ok(output) => {
            if let Some(message) = output.error {
                return Err(ExtractionError::RendererFailed { message });
            }
            if !success {
                return Err(ExtractionError::RendererFailed {
                    message: stderr_message(stderr),
                });
            }
            Ok(output)
        }
        Err(_) if !success => Err(ExtractionError::RendererFailed {
            message: stderr_message(stderr),
        }),
        Err(source) => Err(ExtractionError::InvalidOutput { source }),
    }
}

fn stderr_message(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr).trim().to_string();
    if text.is_empty() {
        "渲染进程异常退出".to_string()
    } else {
        text
    }
}
