use serde::{Deserialize, Serialize};

/// 需要 OCR 的稀疏页
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrPage {
    /// 页码（从 0 开始）
    pub index: usize,
    /// `data:image/jpeg;base64,...` 形式的页面图片
    pub image: String,
}

/// 外部渲染进程的输出
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOutput {
    /// 每页原生文本
    #[serde(default)]
    pub page_texts: Vec<String>,
    /// 原生文本不足、带图片的页面
    #[serde(default)]
    pub ocr_pages: Vec<OcrPage>,
    #[serde(default)]
    pub page_count: usize,
    /// 渲染脚本报告的错误
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 一份 PDF 的最终文本，交给外部存储
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedPdf {
    /// 所有页文本以空行拼接
    pub text: String,
    /// 与页数等长
    pub page_texts: Vec<String>,
    pub page_count: usize,
    pub file_name: String,
    pub file_size: usize,
}
