//! List query parameters: `$filter`, `$orderby`, `$top`, `$skip`, `$select`
//! and `$expand`.
//!
//! Each listable resource declares which fields it accepts; anything else is
//! rejected. `$filter` supports `field eq 'value'` clauses joined by `and`.

use std::collections::HashMap;

use clubdesk_common::AppError;
use clubdesk_db::entities::{
    answer::AnswerStatus,
    question::{QuestionStatus, Visibility},
    user::Role,
};
use clubdesk_db::filters::{
    AnswerFilter, AnswerSortField, DEFAULT_PAGE_SIZE, Page, QuestionFilter, QuestionSortField,
    Sort, UserFilter, UserSortField,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Why a list query was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unknown query parameter `{0}`")]
    UnknownParameter(String),

    #[error("`{param}` must be a non-negative integer, got `{value}`")]
    NotANumber { param: &'static str, value: String },

    #[error("malformed $filter: {0}")]
    MalformedFilter(String),

    #[error("cannot filter on `{0}`")]
    UnknownFilterField(String),

    #[error("unsupported $filter operator `{0}`, only `eq` is allowed")]
    UnsupportedOperator(String),

    #[error("invalid value `{value}` for `{field}`")]
    InvalidValue { field: String, value: String },

    #[error("cannot order by `{0}`")]
    UnknownOrderField(String),

    #[error("sort direction must be `asc` or `desc`, got `{0}`")]
    InvalidDirection(String),

    #[error("cannot select `{0}`")]
    UnknownSelectField(String),

    #[error("cannot expand `{0}`")]
    UnknownExpand(String),
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// A resource that can be listed with query parameters.
pub trait QueryResource {
    type Filter: Default;
    type SortField: Copy;

    /// Response fields `$select` may name.
    const SELECTABLE: &'static [&'static str];
    /// Relations `$expand` may name.
    const EXPANDABLE: &'static [&'static str];

    /// Apply one `field eq 'value'` clause.
    fn apply_filter(filter: &mut Self::Filter, field: &str, value: &str)
    -> Result<(), QueryError>;

    fn sort_field(name: &str) -> Option<Self::SortField>;
}

/// A parsed list query.
pub struct ListQuery<R: QueryResource> {
    pub filter: R::Filter,
    pub sort: Option<Sort<R::SortField>>,
    pub page: Page,
    /// `None` keeps every field.
    pub select: Option<Vec<String>>,
    pub expand: Vec<String>,
}

impl<R: QueryResource> ListQuery<R> {
    /// Whether `$expand` asked for this relation.
    #[must_use]
    pub fn expands(&self, relation: &str) -> bool {
        self.expand.iter().any(|e| e == relation)
    }
}

impl<R: QueryResource> Default for ListQuery<R> {
    fn default() -> Self {
        Self {
            filter: R::Filter::default(),
            sort: None,
            page: Page::default(),
            select: None,
            expand: Vec::new(),
        }
    }
}

/// Parse raw query-string pairs for resource `R`.
pub fn parse<R: QueryResource>(params: &HashMap<String, String>) -> Result<ListQuery<R>, QueryError> {
    let mut query = ListQuery::<R>::default();
    let mut limit = DEFAULT_PAGE_SIZE;
    let mut offset = 0;

    for (key, value) in params {
        match key.as_str() {
            "$filter" => {
                for (field, value) in parse_filter(value)? {
                    R::apply_filter(&mut query.filter, &field, &value)?;
                }
            }
            "$orderby" => query.sort = Some(parse_orderby::<R>(value)?),
            "$top" => limit = parse_number("$top", value)?,
            "$skip" => offset = parse_number("$skip", value)?,
            "$select" => {
                query.select = Some(parse_list(value, R::SELECTABLE, |f| {
                    QueryError::UnknownSelectField(f.to_string())
                })?);
            }
            "$expand" => {
                query.expand = parse_list(value, R::EXPANDABLE, |f| {
                    QueryError::UnknownExpand(f.to_string())
                })?;
            }
            other => return Err(QueryError::UnknownParameter(other.to_string())),
        }
    }

    query.page = Page::new(limit, offset);
    Ok(query)
}

fn parse_number(param: &'static str, value: &str) -> Result<u64, QueryError> {
    value.trim().parse().map_err(|_| QueryError::NotANumber {
        param,
        value: value.to_string(),
    })
}

fn parse_list(
    value: &str,
    allowed: &[&str],
    reject: impl Fn(&str) -> QueryError,
) -> Result<Vec<String>, QueryError> {
    let mut fields = Vec::new();
    for field in value.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        if !allowed.contains(&field) {
            return Err(reject(field));
        }
        if !fields.iter().any(|f| f == field) {
            fields.push(field.to_string());
        }
    }
    Ok(fields)
}

fn parse_orderby<R: QueryResource>(value: &str) -> Result<Sort<R::SortField>, QueryError> {
    let mut parts = value.split_whitespace();
    let name = parts
        .next()
        .ok_or_else(|| QueryError::UnknownOrderField(String::new()))?;
    let field = R::sort_field(name).ok_or_else(|| QueryError::UnknownOrderField(name.to_string()))?;

    let sort = match parts.next() {
        None => Sort::asc(field),
        Some(dir) if dir.eq_ignore_ascii_case("asc") => Sort::asc(field),
        Some(dir) if dir.eq_ignore_ascii_case("desc") => Sort::desc(field),
        Some(dir) => return Err(QueryError::InvalidDirection(dir.to_string())),
    };
    if let Some(extra) = parts.next() {
        return Err(QueryError::InvalidDirection(extra.to_string()));
    }

    Ok(sort)
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Word(String),
    Str(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>, QueryError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '\'' {
            chars.next();
            let mut s = String::new();
            loop {
                match chars.next() {
                    // '' is an escaped quote
                    Some('\'') if chars.peek() == Some(&'\'') => {
                        chars.next();
                        s.push('\'');
                    }
                    Some('\'') => break,
                    Some(ch) => s.push(ch),
                    None => {
                        return Err(QueryError::MalformedFilter(
                            "unterminated string".to_string(),
                        ));
                    }
                }
            }
            tokens.push(Token::Str(s));
        } else if c.is_ascii_alphanumeric() || c == '_' {
            let mut w = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_ascii_alphanumeric() || ch == '_' {
                    w.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Word(w));
        } else {
            return Err(QueryError::MalformedFilter(format!("unexpected `{c}`")));
        }
    }

    Ok(tokens)
}

/// Split a `$filter` expression into `(field, value)` pairs.
fn parse_filter(input: &str) -> Result<Vec<(String, String)>, QueryError> {
    let mut tokens = tokenize(input)?.into_iter();
    let mut clauses = Vec::new();

    loop {
        let field = match tokens.next() {
            Some(Token::Word(w)) => w,
            _ => return Err(QueryError::MalformedFilter("expected a field name".to_string())),
        };
        match tokens.next() {
            Some(Token::Word(op)) if op.eq_ignore_ascii_case("eq") => {}
            Some(Token::Word(op)) => return Err(QueryError::UnsupportedOperator(op)),
            _ => {
                return Err(QueryError::MalformedFilter(format!(
                    "expected an operator after `{field}`"
                )));
            }
        }
        let value = match tokens.next() {
            Some(Token::Str(s)) => s,
            _ => {
                return Err(QueryError::MalformedFilter(format!(
                    "expected a quoted value for `{field}`"
                )));
            }
        };
        clauses.push((field, value));

        match tokens.next() {
            None => break,
            Some(Token::Word(w)) if w.eq_ignore_ascii_case("and") => {}
            Some(_) => {
                return Err(QueryError::MalformedFilter(
                    "clauses must be joined with `and`".to_string(),
                ));
            }
        }
    }

    Ok(clauses)
}

/// Parse a value through the type's serde names (`open`, `admin`...).
fn parse_enum<T: DeserializeOwned>(field: &str, value: &str) -> Result<T, QueryError> {
    serde_json::from_value(Value::String(value.to_string())).map_err(|_| QueryError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn parse_id(field: &str, value: &str) -> Result<String, QueryError> {
    let valid = !value.is_empty()
        && value.len() <= 32
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(value.to_string())
    } else {
        Err(QueryError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

/// `GET /questions`.
pub struct Questions;

impl QueryResource for Questions {
    type Filter = QuestionFilter;
    type SortField = QuestionSortField;

    const SELECTABLE: &'static [&'static str] = &[
        "id",
        "userId",
        "title",
        "content",
        "visibility",
        "status",
        "attachment",
        "modifiedBy",
        "createdAt",
        "updatedAt",
        "categories",
        "answers",
    ];
    const EXPANDABLE: &'static [&'static str] = &["categories", "answers"];

    fn apply_filter(filter: &mut QuestionFilter, field: &str, value: &str) -> Result<(), QueryError> {
        match field {
            "status" => filter.status = Some(parse_enum::<QuestionStatus>(field, value)?),
            "visibility" => filter.visibility = Some(parse_enum::<Visibility>(field, value)?),
            "userId" => filter.user_id = Some(parse_id(field, value)?),
            "category" => {
                let name = value.trim();
                if name.is_empty() {
                    return Err(QueryError::InvalidValue {
                        field: field.to_string(),
                        value: value.to_string(),
                    });
                }
                filter.category = Some(name.to_string());
            }
            other => return Err(QueryError::UnknownFilterField(other.to_string())),
        }
        Ok(())
    }

    fn sort_field(name: &str) -> Option<QuestionSortField> {
        match name {
            "createdAt" => Some(QuestionSortField::CreatedAt),
            "updatedAt" => Some(QuestionSortField::UpdatedAt),
            "title" => Some(QuestionSortField::Title),
            _ => None,
        }
    }
}

/// `GET /answers`.
pub struct Answers;

impl QueryResource for Answers {
    type Filter = AnswerFilter;
    type SortField = AnswerSortField;

    const SELECTABLE: &'static [&'static str] = &[
        "id",
        "questionId",
        "userId",
        "content",
        "status",
        "attachment",
        "modifiedBy",
        "createdAt",
        "updatedAt",
        "votes",
        "voted",
    ];
    const EXPANDABLE: &'static [&'static str] = &[];

    fn apply_filter(filter: &mut AnswerFilter, field: &str, value: &str) -> Result<(), QueryError> {
        match field {
            "status" => filter.status = Some(parse_enum::<AnswerStatus>(field, value)?),
            "questionId" => filter.question_id = Some(parse_id(field, value)?),
            "userId" => filter.user_id = Some(parse_id(field, value)?),
            other => return Err(QueryError::UnknownFilterField(other.to_string())),
        }
        Ok(())
    }

    fn sort_field(name: &str) -> Option<AnswerSortField> {
        match name {
            "createdAt" => Some(AnswerSortField::CreatedAt),
            _ => None,
        }
    }
}

/// `GET /users`.
pub struct Users;

impl QueryResource for Users {
    type Filter = UserFilter;
    type SortField = UserSortField;

    const SELECTABLE: &'static [&'static str] =
        &["id", "name", "club", "role", "microsite", "photo", "createdAt"];
    const EXPANDABLE: &'static [&'static str] = &[];

    fn apply_filter(filter: &mut UserFilter, field: &str, value: &str) -> Result<(), QueryError> {
        match field {
            "club" => filter.club = Some(value.to_string()),
            "role" => filter.role = Some(parse_enum::<Role>(field, value)?),
            other => return Err(QueryError::UnknownFilterField(other.to_string())),
        }
        Ok(())
    }

    fn sort_field(name: &str) -> Option<UserSortField> {
        match name {
            "name" => Some(UserSortField::Name),
            _ => None,
        }
    }
}

/// Keep only the selected keys of a JSON object, or of every object in an
/// array. Other values pass through untouched.
#[must_use]
pub fn project(value: Value, select: &[String]) -> Value {
    match value {
        Value::Object(mut map) => {
            map.retain(|key, _| select.iter().any(|s| s == key));
            Value::Object(map)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(|v| project(v, select)).collect()),
        other => other,
    }
}
