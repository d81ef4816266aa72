//! Typed query filters accepted by the repository list operations.

use crate::entities::{answer::AnswerStatus, question::QuestionStatus, question::Visibility, user::Role};

/// Default page size for list queries.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Largest page a list query may request.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Limit/offset window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

impl Page {
    /// Build a page, clamping the limit to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(limit: u64, offset: u64) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_SIZE),
            offset,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

/// Sort direction plus field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<F> {
    pub field: F,
    pub descending: bool,
}

impl<F> Sort<F> {
    #[must_use]
    pub const fn asc(field: F) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    #[must_use]
    pub const fn desc(field: F) -> Self {
        Self {
            field,
            descending: true,
        }
    }
}

/// Which questions the caller may see.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QuestionScope {
    /// Anonymous callers.
    #[default]
    PublicOnly,
    /// Public questions plus the private ones authored by this user.
    PublicOrAuthoredBy(String),
    /// Admins.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionSortField {
    CreatedAt,
    UpdatedAt,
    Title,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionFilter {
    pub status: Option<QuestionStatus>,
    pub visibility: Option<Visibility>,
    pub user_id: Option<String>,
    /// Category name, matched case-insensitively.
    pub category: Option<String>,
    pub scope: QuestionScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSortField {
    CreatedAt,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnswerFilter {
    pub status: Option<AnswerStatus>,
    pub question_id: Option<String>,
    pub user_id: Option<String>,
    pub scope: QuestionScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortField {
    Name,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserFilter {
    pub club: Option<String>,
    pub role: Option<Role>,
}
