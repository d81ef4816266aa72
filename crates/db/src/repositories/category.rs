//! Category repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{Category, QuestionCategory, category, question_category};
use crate::filters::Page;
use clubdesk_common::{AppError, AppResult, IdGenerator};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, sea_query::OnConflict,
};

/// Category repository for database operations.
#[derive(Clone)]
pub struct CategoryRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl CategoryRepository {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Find a category by name, ignoring case.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<category::Model>> {
        Category::find()
            .filter(category::Column::NameLower.eq(name.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the category with this name, creating it on first use.
    ///
    /// Two requests introducing the same name race on the `name_lower`
    /// unique index; the loser's insert is skipped and both read back the
    /// winner's row.
    pub async fn get_or_create(&self, name: &str) -> AppResult<category::Model> {
        if let Some(existing) = self.find_by_name(name).await? {
            return Ok(existing);
        }

        let model = category::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name.to_string()),
            name_lower: Set(name.to_lowercase()),
            created_at: Set(chrono::Utc::now().into()),
        };
        let inserted = Category::insert(model)
            .on_conflict(
                OnConflict::column(category::Column::NameLower)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let category = self
            .find_by_name(name)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Category {name} vanished after insert")))?;

        if inserted > 0 {
            tracing::debug!(category_id = %category.id, name = %category.name, "Created category");
        }
        Ok(category)
    }

    /// List categories alphabetically.
    pub async fn list(&self, page: Page) -> AppResult<Vec<category::Model>> {
        Category::find()
            .order_by_asc(category::Column::NameLower)
            .offset(page.offset)
            .limit(page.limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Categories of one question.
    pub async fn find_by_question(&self, question_id: &str) -> AppResult<Vec<category::Model>> {
        Ok(self
            .find_by_questions(&[question_id.to_string()])
            .await?
            .remove(question_id)
            .unwrap_or_default())
    }

    /// Categories keyed by question ID.
    pub async fn find_by_questions(
        &self,
        question_ids: &[String],
    ) -> AppResult<HashMap<String, Vec<category::Model>>> {
        if question_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let links = QuestionCategory::find()
            .filter(question_category::Column::QuestionId.is_in(question_ids.to_vec()))
            .find_also_related(Category)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut by_question: HashMap<String, Vec<category::Model>> = HashMap::new();
        for (link, category) in links {
            if let Some(category) = category {
                by_question
                    .entry(link.question_id)
                    .or_default()
                    .push(category);
            }
        }
        Ok(by_question)
    }

    /// Replace the category links of a question.
    pub async fn set_question_categories(
        &self,
        question_id: &str,
        category_ids: &[String],
    ) -> AppResult<()> {
        QuestionCategory::delete_many()
            .filter(question_category::Column::QuestionId.eq(question_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if category_ids.is_empty() {
            return Ok(());
        }

        let links = category_ids
            .iter()
            .map(|category_id| question_category::ActiveModel {
                question_id: Set(question_id.to_string()),
                category_id: Set(category_id.clone()),
            });
        QuestionCategory::insert_many(links)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
