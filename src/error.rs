use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// PDF 提取错误
    #[error("PDF 提取错误: {0}")]
    Extraction(#[from] ExtractionError),
    /// LLM 服务错误
    #[error("LLM 错误: {0}")]
    Llm(#[from] LlmError),
    /// 数据校验错误
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
}

/// PDF 提取错误
///
/// 任何一种都会使整次上传 / 重扫失败，不保存部分结果
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// 文件头不是 %PDF
    #[error("无效的 PDF 文件格式")]
    InvalidPdf,
    /// 临时文件创建或写入失败
    #[error("临时文件操作失败: {source}")]
    TempFile {
        #[source]
        source: std::io::Error,
    },
    /// 启动渲染进程失败
    #[error("无法启动渲染进程 {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// 渲染进程超时
    #[error("渲染进程超时 ({seconds} 秒)")]
    Timeout { seconds: u64 },
    /// 渲染输出超过上限
    #[error("渲染输出超过 {limit} 字节上限")]
    OutputTooLarge { limit: usize },
    /// 渲染脚本报告错误
    #[error("渲染失败: {message}")]
    RendererFailed { message: String },
    /// 渲染输出无法解析
    #[error("渲染输出不是合法 JSON: {source}")]
    InvalidOutput {
        #[source]
        source: serde_json::Error,
    },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// 网络请求失败
    #[error("LLM API 调用失败 ({provider}): {message}")]
    RequestFailed { provider: String, message: String },
    /// 非 2xx 响应
    #[error("LLM API 返回错误状态 ({provider}): {status} {body}")]
    BadStatus {
        provider: String,
        status: u16,
        body: String,
    },
    /// 返回内容为空
    #[error("LLM 返回内容为空 ({provider})")]
    EmptyResponse { provider: String },
    /// 响应中找不到 JSON 数组
    #[error("无法从 LLM 响应中解析 JSON 数组")]
    NoJsonArray,
    /// JSON 数组格式错误
    #[error("LLM 响应中的 JSON 格式错误: {source}")]
    MalformedJson {
        #[source]
        source: serde_json::Error,
    },
}

/// 校验错误
#[derive(Debug, Error)]
pub enum ValidationError {
    /// 题目列表为空
    #[error("题目列表为空")]
    EmptyQuestionList,
    /// 第 index 题不是 JSON 对象
    #[error("第 {index} 题不是 JSON 对象")]
    NotAnObject { index: usize },
    /// 缺少必填字段
    #[error("第 {index} 题缺少字段 {field}")]
    MissingField { index: usize, field: &'static str },
    /// 必填字段为空
    #[error("第 {index} 题字段 {field} 为空")]
    EmptyField { index: usize, field: &'static str },
    /// 字段类型不正确
    #[error("第 {index} 题字段 {field} 类型错误")]
    WrongFieldType { index: usize, field: &'static str },
    /// 未知题型
    #[error("第 {index} 题题型未知: {value}")]
    UnknownType { index: usize, value: String },
    /// 选择 / 判断 / 填空题缺少选项
    #[error("第 {index} 题缺少选项")]
    MissingOptions { index: usize },
    /// 生成请求参数不合法
    #[error("生成请求不合法: {0}")]
    InvalidRequest(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 未配置 API key
    #[error("{provider} API key 未配置")]
    MissingApiKey { provider: String },
    /// 未知模型
    #[error("未知模型: {model}")]
    UnknownModel { model: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建 LLM 请求失败错误
    pub fn llm_request_failed(provider: impl Into<String>, message: impl ToString) -> Self {
        AppError::Llm(LlmError::RequestFailed {
            provider: provider.into(),
            message: message.to_string(),
        })
    }

    /// 创建 API key 缺失错误
    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        AppError::Config(ConfigError::MissingApiKey {
            provider: provider.into(),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建请求校验错误
    pub fn invalid_request(message: impl Into<String>) -> Self {
        AppError::Validation(ValidationError::InvalidRequest(message.into()))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
