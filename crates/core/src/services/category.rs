//! Category service.

use clubdesk_common::{AppError, AppResult};
use clubdesk_db::entities::category;
use clubdesk_db::filters::Page;
use clubdesk_db::repositories::CategoryRepository;

/// Longest accepted category name.
const MAX_CATEGORY_NAME: usize = 64;

/// Service for question categories.
#[derive(Clone)]
pub struct CategoryService {
    category_repo: CategoryRepository,
}

impl CategoryService {
    /// Create a new category service.
    #[must_use]
    pub const fn new(category_repo: CategoryRepository) -> Self {
        Self { category_repo }
    }

    /// List categories.
    pub async fn list(&self, page: Page) -> AppResult<Vec<category::Model>> {
        self.category_repo.list(page).await
    }

    /// Resolve names to categories, creating unknown ones.
    ///
    /// Names are trimmed and compared case-insensitively; the first spelling
    /// seen in a request wins for new categories.
    pub async fn resolve(&self, names: &[String]) -> AppResult<Vec<category::Model>> {
        let names = normalize_names(names)?;

        let mut categories = Vec::with_capacity(names.len());
        for name in names {
            categories.push(self.category_repo.get_or_create(&name).await?);
        }
        Ok(categories)
    }
}

/// Trim, drop empties and deduplicate case-insensitively, keeping order.
fn normalize_names(names: &[String]) -> AppResult<Vec<String>> {
    let mut seen = Vec::<String>::new();
    let mut result = Vec::new();

    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        if name.chars().count() > MAX_CATEGORY_NAME {
            return Err(AppError::Validation(format!(
                "Category name must be at most {MAX_CATEGORY_NAME} characters"
            )));
        }
        let lower = name.to_lowercase();
        if !seen.contains(&lower) {
            seen.push(lower);
            result.push(name.to_string());
        }
    }

    Ok(result)
}
