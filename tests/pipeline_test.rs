use async_trait::async_trait;
use exam_forge::clients::{ProviderError, VisionClient};
use exam_forge::error::{AppError, AppResult, ExtractionError, LlmError};
use exam_forge::infrastructure::PageRenderer;
use exam_forge::models::{
    Difficulty, GenerationBatch, GenerationRequest, Language, ModelId, OcrPage, Question, QuestionType,
    RenderOutput,
};
use exam_forge::services::{OcrService, QuestionGenerator};
use exam_forge::{BatchTestGenerator, Config, PdfFlow};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio_test::{assert_err, assert_ok};

// ========== 假实现 ==========

/// 记录每次调用的批次，按脚本依次返回结果
struct ScriptedGenerator {
    replies: Mutex<VecDeque<AppResult<Vec<Question>>>>,
    batches: Mutex<Vec<GenerationBatch>>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<AppResult<Vec<Question>>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            batches: Mutex::new(Vec::new()),
        })
    }

    fn batches(&self) -> Vec<GenerationBatch> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuestionGenerator for ScriptedGenerator {
    async fn generate(&self, _request: &GenerationRequest, batch: &GenerationBatch) -> AppResult<Vec<Question>> {
        self.batches.lock().unwrap().push(batch.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::NoJsonArray.into()))
    }
}

struct FixedRenderer(RenderOutput);

#[async_trait]
impl PageRenderer for FixedRenderer {
    async fn render_pages(&self, _pdf: &[u8], _file_name: &str) -> Result<RenderOutput, ExtractionError> {
        Ok(self.0.clone())
    }
}

struct FixedVision(&'static str);

#[async_trait]
impl VisionClient for FixedVision {
    async fn extract_text(&self, _instruction: &str, _images: &[String]) -> Result<String, ProviderError> {
        Ok(self.0.to_string())
    }
}

// ========== 辅助函数 ==========

fn question(text: &str) -> Question {
    Question {
        id: "tmp".to_string(),
        kind: QuestionType::ShortAnswer,
        question: text.to_string(),
        options: None,
        correct_answer: "answer".to_string(),
        explanation: String::new(),
        context: None,
        source: Some("Lecture".to_string()),
    }
}

/// 生成 n 道互不相似的题目
fn distinct(prefix: &str, n: usize) -> Vec<Question> {
    (0..n)
        .map(|i| question(&format!("{prefix}{i} alpha{prefix}{i} beta{prefix}{i} gamma{prefix}{i}")))
        .collect()
}

fn request(count: usize) -> GenerationRequest {
    GenerationRequest {
        texts: vec!["The mitochondria is the powerhouse of the cell.".to_string()],
        difficulty: Difficulty::Medium,
        language: Language::En,
        model: ModelId::Gpt4oMini,
        questions_count: count,
        pdf_name: "Lecture".to_string(),
        exam_format: None,
        exam_context: None,
        instructions: None,
    }
}

fn ids(questions: &[Question]) -> Vec<String> {
    questions.iter().map(|q| q.id.clone()).collect()
}

// ========== 分批出题 ==========

#[tokio::test]
async fn test_single_batch_request() {
    let fake = ScriptedGenerator::new(vec![Ok(distinct("a", 10))]);
    let generator = BatchTestGenerator::new(fake.clone());
    let mut progress = Vec::new();

    let questions = assert_ok!(
        generator
            .generate_in_batches(&request(10), |done, total| progress.push((done, total)))
            .await
    );

    assert_eq!(fake.batches().len(), 1);
    assert_eq!(fake.batches()[0], GenerationBatch::single(10, Vec::new()));
    assert_eq!(progress, vec![(0, 1), (1, 1)]);
    let expected: Vec<String> = (1..=10).map(|i| format!("q{i}")).collect();
    assert_eq!(ids(&questions), expected);
}

#[tokio::test]
async fn test_fifty_questions_in_three_sequential_batches() {
    let first = distinct("a", 22);
    let second = distinct("b", 22);
    let fake = ScriptedGenerator::new(vec![Ok(first.clone()), Ok(second.clone()), Ok(distinct("c", 6))]);
    let generator = BatchTestGenerator::new(fake.clone());
    let mut progress = Vec::new();

    let questions = assert_ok!(
        generator
            .generate_in_batches(&request(50), |done, total| progress.push((done, total)))
            .await
    );

    let batches = fake.batches();
    assert_eq!(batches.len(), 3);
    assert_eq!(
        batches.iter().map(|b| b.questions_count).collect::<Vec<_>>(),
        vec![22, 22, 6]
    );
    assert!(batches.iter().all(|b| b.total_batches == 3));
    assert!(batches[0].previous_questions.is_empty());

    let first_texts: Vec<String> = first.iter().map(|q| q.question.clone()).collect();
    assert_eq!(batches[1].previous_questions, first_texts);
    let both: Vec<String> = first.iter().chain(&second).map(|q| q.question.clone()).collect();
    assert_eq!(batches[2].previous_questions, both);

    assert_eq!(progress, vec![(0, 3), (1, 3), (2, 3), (3, 3)]);
    assert_eq!(questions.len(), 50);
    assert_eq!(questions[49].id, "q50");
}

#[tokio::test]
async fn test_dedup_keeps_earlier_batch_question() {
    let mut first = distinct("a", 21);
    first.push(question("What is the capital of France?"));
    let mut second = vec![question("What is the capital of France")];
    second.extend(distinct("b", 1));
    let fake = ScriptedGenerator::new(vec![
        Ok(first),
        Ok(second),
        // 补齐
        Ok(distinct("c", 1)),
    ]);
    let generator = BatchTestGenerator::new(fake.clone());

    let questions = assert_ok!(generator.generate(&request(25)).await);

    let france: Vec<&Question> = questions
        .iter()
        .filter(|q| q.question.contains("capital of France"))
        .collect();
    assert_eq!(france.len(), 1);
    assert_eq!(france[0].question, "What is the capital of France?");
    assert_eq!(france[0].id, "q22");
    assert_eq!(questions.len(), 24);
    assert_eq!(ids(&questions).last().map(String::as_str), Some("q24"));
}

#[tokio::test]
async fn test_shortfall_retry_fills_gap() {
    let fake = ScriptedGenerator::new(vec![Ok(distinct("a", 20)), Ok(distinct("b", 10)), Ok(distinct("c", 2))]);
    let generator = BatchTestGenerator::new(fake.clone());

    let questions = assert_ok!(generator.generate(&request(32)).await);

    let batches = fake.batches();
    assert_eq!(batches.len(), 3);
    // 第一批少给 2 题，第二批请求剩余的 12 题
    assert_eq!(batches[1].questions_count, 12);
    let retry = &batches[2];
    assert_eq!(retry.questions_count, 2);
    assert_eq!(retry.total_batches, 1);
    assert_eq!(retry.previous_questions.len(), 30);
    assert_eq!(questions.len(), 32);
}

#[tokio::test]
async fn test_shortfall_failure_is_not_fatal() {
    let fake = ScriptedGenerator::new(vec![
        Ok(distinct("a", 22)),
        Ok(distinct("b", 5)),
        Err(LlmError::EmptyResponse {
            provider: "OpenAI".to_string(),
        }
        .into()),
    ]);
    let generator = BatchTestGenerator::new(fake.clone());

    let questions = assert_ok!(generator.generate(&request(30)).await);
    assert_eq!(questions.len(), 27);
    assert_eq!(fake.batches().len(), 3);
}

#[tokio::test]
async fn test_batch_failure_aborts_request() {
    let fake = ScriptedGenerator::new(vec![
        Ok(distinct("a", 22)),
        Err(LlmError::BadStatus {
            provider: "OpenAI".to_string(),
            status: 500,
            body: "server error".to_string(),
        }
        .into()),
    ]);
    let generator = BatchTestGenerator::new(fake.clone());

    let err = assert_err!(generator.generate(&request(40)).await);
    assert!(matches!(err, AppError::Llm(LlmError::BadStatus { status: 500, .. })));
    assert_eq!(fake.batches().len(), 2);
}

#[tokio::test]
async fn test_over_delivery_is_truncated() {
    let fake = ScriptedGenerator::new(vec![Ok(distinct("a", 8))]);
    let generator = BatchTestGenerator::new(fake);
    let questions = assert_ok!(generator.generate(&request(5)).await);
    assert_eq!(ids(&questions), vec!["q1", "q2", "q3", "q4", "q5"]);
}

#[tokio::test]
async fn test_invalid_request_makes_no_calls() {
    let fake = ScriptedGenerator::new(vec![]);
    let generator = BatchTestGenerator::new(fake.clone());
    let err = assert_err!(generator.generate(&request(81)).await);
    assert!(matches!(err, AppError::Validation(_)));
    assert!(fake.batches().is_empty());
}

// ========== PDF 提取 ==========

fn sparse_render() -> RenderOutput {
    RenderOutput {
        page_texts: vec!["short".to_string(), "also short".to_string()],
        ocr_pages: vec![
            OcrPage {
                index: 0,
                image: "data:image/jpeg;base64,AAAA".to_string(),
            },
            OcrPage {
                index: 1,
                image: "data:image/jpeg;base64,BBBB".to_string(),
            },
        ],
        page_count: 2,
        error: None,
    }
}

#[tokio::test(start_paused = true)]
async fn test_pdf_flow_with_vision_ocr() {
    let ocr = OcrService::new(
        Arc::new(FixedVision("```json\n[\"full text A\", \"full text B\"]\n```")),
        &Config::default(),
    );
    let flow = PdfFlow::new(Arc::new(FixedRenderer(sparse_render())), Some(ocr));

    let pdf = assert_ok!(flow.extract(b"%PDF-1.7 scanned", "scan.pdf").await);
    assert_eq!(pdf.page_texts, vec!["full text A", "full text B"]);
    assert_eq!(pdf.text, "full text A\n\nfull text B");
    assert_eq!(pdf.page_count, 2);
    assert_eq!(pdf.file_name, "scan.pdf");
}

#[tokio::test(start_paused = true)]
async fn test_pdf_flow_ocr_garbage_keeps_native_text() {
    let ocr = OcrService::new(Arc::new(FixedVision("sorry, unreadable")), &Config::default());
    let flow = PdfFlow::new(Arc::new(FixedRenderer(sparse_render())), Some(ocr));

    let pdf = assert_ok!(flow.rescan(b"%PDF-1.7", None).await);
    assert_eq!(pdf.page_texts, vec!["short", "also short"]);
    assert_eq!(pdf.file_name, "rescan.pdf");
}

#[tokio::test]
async fn test_pdf_flow_rejects_non_pdf() {
    let flow = PdfFlow::new(Arc::new(FixedRenderer(sparse_render())), None);
    let err = assert_err!(flow.extract(b"PK\x03\x04zip", "notes.pdf").await);
    assert!(matches!(err, AppError::Extraction(ExtractionError::InvalidPdf)));
}
