//! Database entities.

#![allow(missing_docs)]

pub mod answer;
pub mod answer_vote;
pub mod category;
pub mod notification_preference;
pub mod question;
pub mod question_category;
pub mod user;

pub use answer::Entity as Answer;
pub use answer_vote::Entity as AnswerVote;
pub use category::Entity as Category;
pub use notification_preference::Entity as NotificationPreference;
pub use question::Entity as Question;
pub use question_category::Entity as QuestionCategory;
pub use user::Entity as User;
