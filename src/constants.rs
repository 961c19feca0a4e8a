//! 对外约定的数值常量

/// 每批生成的题目数量
pub const QUESTIONS_PER_BATCH: usize = 22;
/// 单次请求允许的最大题目数量
pub const MAX_QUESTIONS: usize = 80;

/// 原生文本少于该字符数的页面需要 OCR
pub const MIN_CHARS_PER_PAGE: usize = 100;
/// 每次视觉调用处理的页数
pub const PAGES_PER_BATCH: usize = 3;
/// OCR 并发 worker 数量
pub const OCR_CONCURRENCY: usize = 3;
/// 429 之后的额外重试次数
pub const MAX_RETRIES: usize = 4;
/// worker 启动错开间隔（毫秒）
pub const OCR_STAGGER_MS: u64 = 1_000;
/// OCR 提示中每页原生文本预览长度
pub const OCR_HINT_PREVIEW_CHARS: usize = 200;

// prompt 字符预算
pub const TEXT_BUDGET: usize = 40_000;
pub const EXAM_CONTEXT_BUDGET: usize = 8_000;
pub const INSTRUCTIONS_BUDGET: usize = 4_000;

/// 去重阈值（Jaccard 相似度严格大于该值视为重复）
pub const SIMILARITY_THRESHOLD: f64 = 0.7;

/// 外部渲染进程超时（秒）
pub const RENDER_TIMEOUT_SECS: u64 = 120;
/// 外部渲染进程 stdout 上限
pub const RENDER_MAX_OUTPUT_BYTES: usize = 200 * 1024 * 1024;
