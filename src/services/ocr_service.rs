//! 视觉 OCR 服务 - 业务能力层
//!
//! 把稀疏页按批次交给视觉模型识别，再按页码合并回原生文本。
//! 单个批次失败只会让该批页面保留原生文本，整体调用永远不会失败。

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::clients::{OpenAiVisionClient, VisionClient};
use crate::config::Config;
use crate::error::AppResult;
use crate::models::OcrPage;
use crate::services::prompt_builder::build_ocr_instruction;
use crate::services::rate_limit::retry_delay;
use crate::utils::{map_with_concurrency, parse_json_array};

/// 视觉 OCR 服务
pub struct OcrService {
    client: Arc<dyn VisionClient>,
    pages_per_batch: usize,
    concurrency: usize,
    max_retries: usize,
    stagger: Duration,
}

impl OcrService {
    /// 使用给定的视觉客户端创建服务
    pub fn new(client: Arc<dyn VisionClient>, config: &Config) -> Self {
        Self {
            client,
            pages_per_batch: config.ocr_pages_per_batch.max(1),
            concurrency: config.ocr_concurrency.max(1),
            max_retries: config.ocr_max_retries,
            stagger: Duration::from_millis(config.ocr_stagger_ms),
        }
    }

    /// 使用 OpenAI 视觉客户端创建服务，未配置 key 时返回错误
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let client = OpenAiVisionClient::new(config)?;
        Ok(Self::new(Arc::new(client), config))
    }

    /// 识别稀疏页并合并结果
    ///
    /// 返回的数组与 `basic_texts` 等长；识别失败的页面保留原生文本
    pub async fn ocr_with_vision(&self, ocr_pages: &[OcrPage], basic_texts: &[String]) -> Vec<String> {
        let mut merged = basic_texts.to_vec();
        if ocr_pages.is_empty() {
            return merged;
        }

        let batches: Vec<&[OcrPage]> = ocr_pages.chunks(self.pages_per_batch).collect();
        let total_batches = batches.len();
        info!(
            "🔍 视觉 OCR: {} 页，分 {} 批，并发 {}",
            ocr_pages.len(),
            total_batches,
            self.concurrency
        );

        let results = map_with_concurrency(&batches, self.concurrency, self.stagger, |batch| async move {
            Ok::<_, Infallible>(self.process_batch(batch, basic_texts).await)
        })
        .await;
        let results = match results {
            Ok(results) => results,
            Err(never) => match never {},
        };

        let mut recognized = 0;
        for (batch, texts) in batches.iter().zip(results) {
            let Some(texts) = texts else { continue };
            // 返回条数少于页数时只替换前缀
            for (page, text) in batch.iter().zip(texts) {
                if let Some(slot) = merged.get_mut(page.index) {
                    *slot = text;
                    recognized += 1;
                }
            }
        }

        info!("✓ 视觉 OCR 完成，{}/{} 页使用识别结果", recognized, ocr_pages.len());
        merged
    }

    /// 处理一个批次，返回 `None` 表示该批保留原生文本
    async fn process_batch(&self, batch: &[OcrPage], basic_texts: &[String]) -> Option<Vec<String>> {
        let hints: Vec<(usize, &str)> = batch
            .iter()
            .map(|p| (p.index, basic_texts.get(p.index).map(String::as_str).unwrap_or("")))
            .collect();
        let instruction = build_ocr_instruction(&hints);
        let images: Vec<String> = batch.iter().map(|p| p.image.clone()).collect();

        let mut attempt = 0;
        loop {
            match self.client.extract_text(&instruction, &images).await {
                Ok(raw) => {
                    return match parse_json_array::<String>(&raw) {
                        Ok(texts) => Some(texts),
                        Err(e) => {
                            debug!("OCR 响应解析失败，保留原生文本: {}", e);
                            None
                        }
                    };
                }
                Err(e) if e.is_rate_limited() && attempt < self.max_retries => {
                    let delay = retry_delay(&e);
                    warn!(
                        "⚠️ OCR 批次被限流，等待 {}s (第 {}/{} 次重试)",
                        delay.as_secs(),
                        attempt + 1,
                        self.max_retries
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!("⚠️ OCR 批次在第 {} 次尝试后失败: {}", attempt + 1, e);
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ProviderError;
    use async_trait::async_trait;
    use reqwest::header::{HeaderMap, HeaderValue};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// 依次返回预设响应的假视觉客户端
    struct ScriptedVision {
        responses: Mutex<VecDeque<Result<String, ProviderError>>>,
        calls: Mutex<Vec<usize>>,
    }

    impl ScriptedVision {
        fn new(responses: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl VisionClient for ScriptedVision {
        async fn extract_text(&self, _instruction: &str, images: &[String]) -> Result<String, ProviderError> {
            self.calls.lock().unwrap().push(images.len());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::request("no scripted response")))
        }
    }

    /// 按图片内容原样返回的假客户端
    struct EchoVision;

    #[async_trait]
    impl VisionClient for EchoVision {
        async fn extract_text(&self, _instruction: &str, images: &[String]) -> Result<String, ProviderError> {
            let texts: Vec<String> = images.iter().map(|img| format!("ocr:{}", img)).collect();
            Ok(serde_json::to_string(&texts).unwrap())
        }
    }

    fn page(index: usize) -> OcrPage {
        OcrPage {
            index,
            image: format!("img{}", index),
        }
    }

    fn service(client: Arc<dyn VisionClient>) -> OcrService {
        OcrService::new(client, &Config::default())
    }

    fn rate_limited(retry_after_ms: &'static str) -> ProviderError {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after-ms", HeaderValue::from_static(retry_after_ms));
        ProviderError::http(429, headers, "rate limited")
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_sparse_pages_in_one_batch() {
        let client = ScriptedVision::new(vec![Ok("[\"full text A\", \"full text B\"]".to_string())]);
        let basic = vec!["short".to_string(), "also short".to_string()];
        let merged = service(client.clone())
            .ocr_with_vision(&[page(0), page(1)], &basic)
            .await;
        assert_eq!(merged, vec!["full text A", "full text B"]);
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_length_preserved_for_any_page_count() {
        for page_count in [0usize, 1, 2, 5, 9, 17] {
            let basic: Vec<String> = (0..page_count).map(|i| format!("native {}", i)).collect();
            // 每隔一页需要 OCR
            let pages: Vec<OcrPage> = (0..page_count).filter(|i| i % 2 == 0).map(page).collect();
            let merged = service(Arc::new(EchoVision)).ocr_with_vision(&pages, &basic).await;
            assert_eq!(merged.len(), page_count);
            for (i, text) in merged.iter().enumerate() {
                if i % 2 == 0 {
                    assert_eq!(text, &format!("ocr:img{}", i));
                } else {
                    assert_eq!(text, &basic[i]);
                }
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_response_applies_prefix_only() {
        let client = ScriptedVision::new(vec![Ok("Sure: [\"only first\",]".to_string())]);
        let basic = vec!["n0".to_string(), "n1".to_string(), "n2".to_string()];
        let merged = service(client)
            .ocr_with_vision(&[page(0), page(1), page(2)], &basic)
            .await;
        assert_eq!(merged, vec!["only first", "n1", "n2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unparseable_response_keeps_native_text() {
        let client = ScriptedVision::new(vec![Ok("I cannot read these pages.".to_string())]);
        let basic = vec!["n0".to_string(), "n1".to_string()];
        let merged = service(client.clone()).ocr_with_vision(&[page(1)], &basic).await;
        assert_eq!(merged, basic);
        // 解析失败不重试
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_retried_with_backoff() {
        let client = ScriptedVision::new(vec![
            Err(rate_limited("2000")),
            Err(rate_limited("2000")),
            Ok("[\"recovered\"]".to_string()),
        ]);
        let basic = vec!["native".to_string()];
        let start = Instant::now();
        let merged = service(client.clone()).ocr_with_vision(&[page(0)], &basic).await;
        assert_eq!(merged, vec!["recovered"]);
        assert_eq!(client.call_count(), 3);
        assert!(start.elapsed() >= Duration::from_millis(5_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_exhaustion_degrades() {
        let responses = (0..10).map(|_| Err(rate_limited("100"))).collect();
        let client = ScriptedVision::new(responses);
        let basic = vec!["native".to_string()];
        let merged = service(client.clone()).ocr_with_vision(&[page(0)], &basic).await;
        assert_eq!(merged, basic);
        // 首次 + 4 次重试
        assert_eq!(client.call_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_are_not_retried() {
        let client = ScriptedVision::new(vec![
            Err(ProviderError::http(500, HeaderMap::new(), "boom")),
            Ok("[\"second batch\"]".to_string()),
        ]);
        let basic: Vec<String> = (0..4).map(|i| format!("n{}", i)).collect();
        let pages = vec![page(0), page(1), page(2), page(3)];
        let merged = service(client.clone()).ocr_with_vision(&pages, &basic).await;
        // 第一批 (0..3) 失败保留原文，第二批 (3) 成功
        assert_eq!(merged, vec!["n0", "n1", "n2", "second batch"]);
        assert_eq!(client.call_count(), 2);
    }
}
