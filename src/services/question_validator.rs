//! 题目校验
//!
//! 模型返回的数组必须逐项通过校验，任意一项不合格则整批作废

use serde_json::{Map, Value};

use crate::error::{AppResult, ValidationError};
use crate::models::{Question, QuestionType};

type FieldResult<T> = Result<T, ValidationError>;

/// 校验模型返回的题目数组
pub fn validate_questions(items: Vec<Value>) -> AppResult<Vec<Question>> {
    if items.is_empty() {
        return Err(ValidationError::EmptyQuestionList.into());
    }

    let questions = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| validate_question(index, item))
        .collect::<FieldResult<Vec<_>>>()?;

    Ok(questions)
}

fn validate_question(index: usize, item: Value) -> FieldResult<Question> {
    let Value::Object(obj) = item else {
        return Err(ValidationError::NotAnObject { index });
    };

    let id = required_string(&obj, index, "id")?;

    let type_str = required_string(&obj, index, "type")?;
    let kind = QuestionType::parse(&type_str).ok_or(ValidationError::UnknownType {
        index,
        value: type_str,
    })?;

    let question = non_empty_string(&obj, index, "question")?;
    let correct_answer = non_empty_string(&obj, index, "correctAnswer")?;

    let options = optional_string_array(&obj, index, "options")?;
    if kind.requires_options() && options.as_ref().map_or(true, |o| o.is_empty()) {
        return Err(ValidationError::MissingOptions { index });
    }

    Ok(Question {
        id,
        kind,
        question,
        options,
        correct_answer,
        explanation: optional_string(&obj, index, "explanation")?.unwrap_or_default(),
        context: optional_string(&obj, index, "context")?,
        source: optional_string(&obj, index, "source")?,
    })
}

fn required_string(obj: &Map<String, Value>, index: usize, field: &'static str) -> FieldResult<String> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField { index, field }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::WrongFieldType { index, field }),
    }
}

fn non_empty_string(obj: &Map<String, Value>, index: usize, field: &'static str) -> FieldResult<String> {
    let value = required_string(obj, index, field)?;
    if value.is_empty() {
        return Err(ValidationError::EmptyField { index, field });
    }
    Ok(value)
}

fn optional_string(
    obj: &Map<String, Value>,
    index: usize,
    field: &'static str,
) -> FieldResult<Option<String>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ValidationError::WrongFieldType { index, field }),
    }
}

fn optional_string_array(
    obj: &Map<String, Value>,
    index: usize,
    field: &'static str,
) -> FieldResult<Option<Vec<String>>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => Ok(s.clone()),
                _ => Err(ValidationError::WrongFieldType { index, field }),
            })
            .collect::<FieldResult<Vec<_>>>()
            .map(Some),
        Some(_) => Err(ValidationError::WrongFieldType { index, field }),
    }
}
