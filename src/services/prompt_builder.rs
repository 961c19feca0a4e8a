//! 提示词构建 - 业务能力层
//!
//! 纯函数，相同输入得到逐字节相同的输出

use crate::constants::{
    EXAM_CONTEXT_BUDGET, INSTRUCTIONS_BUDGET, OCR_HINT_PREVIEW_CHARS, TEXT_BUDGET,
};
use crate::models::{Difficulty, ExamFormat, GenerationBatch, GenerationRequest, Language};
use crate::utils::text::take_chars;

fn difficulty_instruction(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "Target Bloom's Taxonomy levels 1-2 (Remember & Understand).
Focus on definitions, key facts, recalling concepts and basic comprehension.
Questions should check that the student recognises and understands the material.",
        Difficulty::Medium => "Target Bloom's Taxonomy levels 3-4 (Apply & Analyze).
Focus on applying concepts to scenarios, analysing relationships and comparing ideas.
Questions should require thinking beyond simple recall.",
        Difficulty::Hard => "Target Bloom's Taxonomy levels 5-6 (Evaluate & Create).
Focus on judging arguments, synthesising information and defending decisions.
Questions should require critical thinking and creative problem solving.",
    }
}

fn language_instruction(language: Language) -> &'static str {
    match language {
        Language::En => "Write every question and answer in English.",
        Language::De => "Write every question and answer in German (Deutsch).",
    }
}

fn exam_format_rules(format: ExamFormat) -> &'static str {
    match format {
        ExamFormat::Mc4 => "1. EVERY question is multiple_choice with exactly 4 options (A, B, C, D).
2. Set correctAnswer to the letter of the correct option followed by its text, e.g. \"A) The correct answer\"",
        ExamFormat::Mc5 => "1. EVERY question is multiple_choice with exactly 5 options (A, B, C, D, E).
2. Set correctAnswer to the letter of the correct option followed by its text, e.g. \"A) The correct answer\"",
        ExamFormat::Mixed => "1. Mix question types: multiple_choice (60%), true_false (20%), short_answer (20%)
2. multiple_choice: exactly 4 options (A, B, C, D). Set correctAnswer to the letter of the correct option followed by its text, e.g. \"A) The correct answer\"
3. true_false: options must be [\"True\", \"False\"] and correctAnswer must be \"True\" or \"False\"
4. short_answer: no options. Set correctAnswer to a concise expected answer",
        ExamFormat::MixedFill => "1. Mix question types: multiple_choice (50%), true_false (15%), short_answer (15%), fill_in_blank (20%)
2. multiple_choice: exactly 4 options (A, B, C, D). Set correctAnswer to the letter of the correct option followed by its text, e.g. \"A) The correct answer\"
3. true_false: options must be [\"True\", \"False\"] and correctAnswer must be \"True\" or \"False\"
4. short_answer: no options. Set correctAnswer to a concise expected answer
5. fill_in_blank: add a \"context\" field with a paragraph or scenario, then ask a question that refers to it. Provide 4 options exactly like multiple_choice.",
    }
}

/// 构建一次出题调用的全部输入
#[derive(Debug, Clone, Copy)]
pub struct PromptConfig<'a> {
    pub texts: &'a [String],
    pub difficulty: Difficulty,
    pub language: Language,
    pub questions_count: usize,
    /// 以 `", "` 分隔的来源名称
    pub pdf_name: &'a str,
    pub exam_format: ExamFormat,
    pub exam_context: Option<&'a str>,
    pub instructions: Option<&'a str>,
    pub batch_index: usize,
    pub total_batches: usize,
    pub previous_questions: &'a [String],
}

impl<'a> PromptConfig<'a> {
    /// 由请求和批次组合出提示词配置
    pub fn for_batch(request: &'a GenerationRequest, batch: &'a GenerationBatch) -> Self {
        Self {
            texts: &request.texts,
            difficulty: request.difficulty,
            language: request.language,
            questions_count: batch.questions_count,
            pdf_name: &request.pdf_name,
            exam_format: request.exam_format(),
            exam_context: request.exam_context.as_deref(),
            instructions: request.instructions.as_deref(),
            batch_index: batch.batch_index,
            total_batches: batch.total_batches,
            previous_questions: &batch.previous_questions,
        }
    }
}

/// 合并多个来源的文本，每个来源平分 `TEXT_BUDGET`
///
/// 返回 (合并后的内容, 来源名称列表)
fn combine_texts(texts: &[String], pdf_name: &str) -> (String, Vec<String>) {
    if texts.is_empty() {
        return (String::new(), Vec::new());
    }
    let per_source = TEXT_BUDGET / texts.len();
    let names: Vec<String> = pdf_name.split(", ").map(|n| n.trim().to_string()).collect();

    let combined = texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let label = match names.get(i).filter(|n| !n.is_empty()) {
                Some(name) => name.clone(),
                None => format!("Source {}", i + 1),
            };
            format!("--- Source: \"{}\" ---\n{}", label, take_chars(text, per_source))
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    (combined, names)
}

fn batch_section(config: &PromptConfig<'_>) -> String {
    if config.total_batches <= 1 {
        return String::new();
    }
    format!(
        "\nThis is batch {} of {}. Write questions that do not overlap with earlier batches and focus on different sections of the material.\n",
        config.batch_index + 1,
        config.total_batches
    )
}

fn previous_questions_section(previous: &[String]) -> String {
    if previous.is_empty() {
        return String::new();
    }
    let list = previous
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}. {}", i + 1, q))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "\nALREADY GENERATED QUESTIONS (do NOT repeat or rephrase any of these; write completely different questions on different topics):\n{}\n",
        list
    )
}

fn exam_context_section(exam_context: Option<&str>) -> String {
    match exam_context.filter(|c| !c.is_empty()) {
        Some(context) => format!(
            "\nEXAM STYLE GUIDANCE (match the style and format of these real exam questions; this is NOT source material for questions):\n{}\n",
            take_chars(context, EXAM_CONTEXT_BUDGET)
        ),
        None => String::new(),
    }
}

fn instructions_section(instructions: Option<&str>) -> String {
    match instructions.filter(|i| !i.is_empty()) {
        Some(instructions) => format!(
            "\nCUSTOM INSTRUCTIONS (follow these carefully; they override the default rules where they conflict):\n{}\n",
            take_chars(instructions, INSTRUCTIONS_BUDGET)
        ),
        None => String::new(),
    }
}

/// 构建出题提示词
pub fn build_test_prompt(config: &PromptConfig<'_>) -> String {
    let (combined, source_names) = combine_texts(config.texts, config.pdf_name);
    let source_names_json = serde_json::to_string(&source_names).unwrap_or_default();
    let example_source = source_names
        .first()
        .filter(|n| !n.is_empty())
        .cloned()
        .unwrap_or_else(|| "Source 1".to_string());

    let difficulty = difficulty_instruction(config.difficulty);
    let language = language_instruction(config.language);
    let format_rules = exam_format_rules(config.exam_format);

    format!(
        r#"You are an expert exam question writer. Using the lecture content below, write exactly {count} exam questions.

{difficulty}
{language}

Source material: "{pdf_name}"

CONTENT:
{combined}
{batch}{previous}{exam_context}{instructions}
QUESTION FORMAT RULES:
{format_rules}

GENERAL RULES:
1. Every question needs a clear explanation of why the correct answer is correct
2. Every question must be based directly on the provided content
3. Give each question a unique id such as "q1", "q2" and so on
4. Every question MUST have a "source" field naming the source it was taken from. Use one of these exact names: {source_names}
5. CRITICAL: every question must test a DIFFERENT fact, concept or idea. Never ask two questions about the same topic, even rephrased, and never ask about a topic already covered in ALREADY GENERATED QUESTIONS.

Respond with ONLY a valid JSON array of question objects. No prose, no markdown, no code fences.
Each object has: id, type, question, options (array; omit for short_answer), correctAnswer, explanation, source, context (fill_in_blank only)

Example:
[
  {{
    "id": "q1",
    "type": "multiple_choice",
    "question": "What is...?",
    "options": ["A) First option", "B) Second option", "C) Third option", "D) Fourth option"],
    "correctAnswer": "A) First option",
    "explanation": "This is correct because...",
    "source": "{example_source}"
  }}
]"#,
        count = config.questions_count,
        difficulty = difficulty,
        language = language,
        pdf_name = config.pdf_name,
        combined = combined,
        batch = batch_section(config),
        previous = previous_questions_section(config.previous_questions),
        exam_context = exam_context_section(config.exam_context),
        instructions = instructions_section(config.instructions),
        format_rules = format_rules,
        source_names = source_names_json,
        example_source = example_source,
    )
}

/// 构建 OCR 批次的文字说明
///
/// `hints` 为 (页码, 原生文本)，原生文本只保留前 200 个字符作为提示
pub fn build_ocr_instruction(hints: &[(usize, &str)]) -> String {
    let previews = hints
        .iter()
        .map(|(index, text)| {
            format!(
                "Page {} existing text: {}...",
                index + 1,
                take_chars(text, OCR_HINT_PREVIEW_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Extract ALL text from these {} PDF page image(s), including text inside diagrams, charts, tables, images, formulas and annotations. \
Return ONLY a JSON array with one string per page, in the same order as the images. Each string must hold the complete text of that page. \
A basic text layer was already extracted; make sure you capture everything it missed, especially in figures and diagrams:\n\n{}",
        hints.len(),
        previews
    )
}
