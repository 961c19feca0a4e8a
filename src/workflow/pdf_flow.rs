//! PDF 文本提取流程 - 流程层
//!
//! 流程顺序：
//! 1. 检查文件头
//! 2. 外部进程渲染，得到每页原生文本和稀疏页图片
//! 3. 有稀疏页时走视觉 OCR，否则直接使用原生文本
//! 4. 拼接全文

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::error::{AppError, AppResult, ExtractionError};
use crate::infrastructure::{is_valid_pdf, PageRenderer, PythonPageRenderer};
use crate::models::ExtractedPdf;
use crate::services::OcrService;

/// 重扫时未提供文件名使用的默认名
pub const RESCAN_FILE_NAME: &str = "rescan.pdf";

/// PDF 提取流程
///
/// - 上传与重扫共用同一条流程
/// - 任何一步失败都让整次请求失败，不返回部分结果
pub struct PdfFlow {
    renderer: Arc<dyn PageRenderer>,
    /// 未配置视觉服务时为 `None`，此时遇到稀疏页直接报错
    ocr: Option<OcrService>,
}

impl PdfFlow {
    pub fn new(renderer: Arc<dyn PageRenderer>, ocr: Option<OcrService>) -> Self {
        Self { renderer, ocr }
    }

    /// 按配置创建：Python 渲染器 + OpenAI 视觉 OCR（有 key 时）
    pub fn from_config(config: &Config) -> Self {
        let ocr = OcrService::from_config(config).ok();
        Self::new(Arc::new(PythonPageRenderer::new(config)), ocr)
    }

    /// 提取上传的 PDF
    pub async fn extract(&self, bytes: &[u8], file_name: &str) -> AppResult<ExtractedPdf> {
        if !is_valid_pdf(bytes) {
            return Err(ExtractionError::InvalidPdf.into());
        }

        let output = self.renderer.render_pages(bytes, file_name).await?;
        let basic_texts = output.page_texts;

        let page_texts = if output.ocr_pages.is_empty() {
            info!("✓ 全部 {} 页原生文本充足，跳过 OCR", output.page_count);
            basic_texts
        } else {
            let ocr = self
                .ocr
                .as_ref()
                .ok_or_else(|| AppError::missing_api_key("OpenAI"))?;
            info!(
                "🔍 {}/{} 页需要 OCR，开始并行视觉识别",
                output.ocr_pages.len(),
                output.page_count
            );
            ocr.ocr_with_vision(&output.ocr_pages, &basic_texts).await
        };

        Ok(ExtractedPdf {
            text: page_texts.join("\n\n"),
            page_texts,
            page_count: output.page_count,
            file_name: file_name.to_string(),
            file_size: bytes.len(),
        })
    }

    /// 重新扫描已存在的 PDF
    pub async fn rescan(&self, bytes: &[u8], file_name: Option<&str>) -> AppResult<ExtractedPdf> {
        let name = file_name.filter(|n| !n.is_empty()).unwrap_or(RESCAN_FILE_NAME);
        self.extract(bytes, name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OcrPage, RenderOutput};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedRenderer {
        output: RenderOutput,
        names: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PageRenderer for FixedRenderer {
        async fn render_pages(&self, _pdf: &[u8], file_name: &str) -> Result<RenderOutput, ExtractionError> {
            self.names.lock().unwrap().push(file_name.to_string());
            Ok(self.output.clone())
        }
    }

    fn renderer(texts: &[&str], ocr_pages: Vec<OcrPage>) -> Arc<FixedRenderer> {
        Arc::new(FixedRenderer {
            output: RenderOutput {
                page_texts: texts.iter().map(|t| t.to_string()).collect(),
                ocr_pages,
                page_count: texts.len(),
                error: None,
            },
            names: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_dense_pdf_skips_ocr() {
        let flow = PdfFlow::new(renderer(&["page one text", "page two text"], vec![]), None);
        let pdf = flow.extract(b"%PDF-1.5 body", "dense.pdf").await.unwrap();
        assert_eq!(pdf.text, "page one text\n\npage two text");
        assert_eq!(pdf.page_count, 2);
        assert_eq!(pdf.file_size, 13);
    }

    #[tokio::test]
    async fn test_invalid_magic_is_rejected_before_rendering() {
        let fixed = renderer(&["x"], vec![]);
        let flow = PdfFlow::new(fixed.clone(), None);
        let err = flow.extract(b"GIF89a", "image.pdf").await.unwrap_err();
        assert!(matches!(err, AppError::Extraction(ExtractionError::InvalidPdf)));
        assert!(fixed.names.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sparse_pages_without_vision_key_fail() {
        let sparse = vec![OcrPage {
            index: 0,
            image: "data:image/jpeg;base64,AA==".to_string(),
        }];
        let flow = PdfFlow::new(renderer(&["short"], sparse), None);
        let err = flow.extract(b"%PDF-1.5", "scan.pdf").await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_rescan_default_name() {
        let fixed = renderer(&["page one text"], vec![]);
        let flow = PdfFlow::new(fixed.clone(), None);
        let pdf = flow.rescan(b"%PDF-1.5", None).await.unwrap();
        assert_eq!(pdf.file_name, RESCAN_FILE_NAME);
        flow.rescan(b"%PDF-1.5", Some("week3.pdf")).await.unwrap();
        assert_eq!(*fixed.names.lock().unwrap(), vec!["rescan.pdf", "week3.pdf"]);
    }
}
