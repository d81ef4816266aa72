//! Localized notification templates.

use serde::{Deserialize, Serialize};

/// Supported email locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
}

impl Locale {
    /// Resolve a language tag such as `fr-CA`; unknown tags fall back to English.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        let primary = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "fr" => Self::Fr,
            _ => Self::En,
        }
    }
}

/// Every kind of notification email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    /// A question was posted in the recipient's club.
    NewClubQuestion,
    /// Confirmation to the author of a new question.
    NewQuestionConfirmation,
    /// A question the recipient answered was edited by its author.
    RelatedQuestionModified,
    /// Someone else edited the recipient's question.
    QuestionModifiedByAdmin,
    /// An official answer was edited.
    OfficialAnswerUpdated,
    /// Someone else edited the recipient's answer.
    AnswerModifiedByAdmin,
    /// New answer on a question the recipient answered.
    NewAnswerInRelatedQuestion,
    /// New answer on the recipient's question.
    AnswerPublishedOnMyQuestion,
    /// An answer became official on a question the recipient answered.
    OfficialAnswerInRelatedQuestion,
    /// An answer on the recipient's question became official.
    MyQuestionAnswerMarkedOfficial,
}

/// Values substituted into a template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    pub recipient_name: &'a str,
    pub question_id: &'a str,
    pub question_title: &'a str,
}

/// A rendered subject and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub subject: String,
    pub body: String,
}

/// Renders templates for one locale and site.
#[derive(Debug, Clone)]
pub struct Localizer {
    locale: Locale,
    site_name: String,
    site_url: String,
}

impl Localizer {
    #[must_use]
    pub fn new(locale: Locale, site_name: impl Into<String>, site_url: impl Into<String>) -> Self {
        Self {
            locale,
            site_name: site_name.into(),
            site_url: site_url.into().trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub const fn locale(&self) -> Locale {
        self.locale
    }

    /// Link to a question on the site.
    #[must_use]
    pub fn question_url(&self, question_id: &str) -> String {
        format!("{}/questions/{}", self.site_url, question_id)
    }

    /// Render a template.
    #[must_use]
    pub fn render(&self, template: Template, ctx: &TemplateContext<'_>) -> Rendered {
        let (subject, line) = match self.locale {
            Locale::En => english(template),
            Locale::Fr => french(template),
        };
        let (greeting, footer) = match self.locale {
            Locale::En => ("Hello", "You can change which emails you receive in your notification preferences."),
            Locale::Fr => ("Bonjour", "Vous pouvez choisir les courriels que vous recevez dans vos préférences de notification."),
        };

        Rendered {
            subject: format!("[{}] {}", self.site_name, subject),
            body: format!(
                "{greeting} {name},\n\n{line}\n\n\"{title}\"\n{url}\n\n--\n{site}\n{footer}\n",
                name = ctx.recipient_name,
                title = ctx.question_title,
                url = self.question_url(ctx.question_id),
                site = self.site_name,
            ),
        }
    }
}

const fn english(template: Template) -> (&'static str, &'static str) {
    match template {
        Template::NewClubQuestion => (
            "New question in your club",
            "A new question was posted in your club.",
        ),
        Template::NewQuestionConfirmation => (
            "Your question was posted",
            "Your question was posted. You will be notified when it gets answers.",
        ),
        Template::RelatedQuestionModified => (
            "A question you answered was edited",
            "The author edited a question you answered.",
        ),
        Template::QuestionModifiedByAdmin => (
            "Your question was edited",
            "An administrator edited your question.",
        ),
        Template::OfficialAnswerUpdated => (
            "An official answer was updated",
            "The official answer to this question was updated.",
        ),
        Template::AnswerModifiedByAdmin => (
            "Your answer was edited",
            "An administrator edited your answer.",
        ),
        Template::NewAnswerInRelatedQuestion => (
            "New answer on a question you follow",
            "A new answer was posted on a question you answered.",
        ),
        Template::AnswerPublishedOnMyQuestion => (
            "New answer to your question",
            "Someone answered your question.",
        ),
        Template::OfficialAnswerInRelatedQuestion => (
            "An answer was marked official",
            "An answer was marked official on a question you answered.",
        ),
        Template::MyQuestionAnswerMarkedOfficial => (
            "Your question has an official answer",
            "An answer to your question was marked official.",
        ),
    }
}

const fn french(template: Template) -> (&'static str, &'static str) {
    match template {
        Template::NewClubQuestion => (
            "Nouvelle question dans votre club",
            "Une nouvelle question a été publiée dans votre club.",
        ),
        Template::NewQuestionConfirmation => (
            "Votre question a été publiée",
            "Votre question a été publiée. Vous serez averti lorsqu'elle recevra des réponses.",
        ),
        Template::RelatedQuestionModified => (
            "Une question à laquelle vous avez répondu a été modifiée",
            "L'auteur a modifié une question à laquelle vous avez répondu.",
        ),
        Template::QuestionModifiedByAdmin => (
            "Votre question a été modifiée",
            "Un administrateur a modifié votre question.",
        ),
        Template::OfficialAnswerUpdated => (
            "Une réponse officielle a été mise à jour",
            "La réponse officielle à cette question a été mise à jour.",
        ),
        Template::AnswerModifiedByAdmin => (
            "Votre réponse a été modifiée",
            "Un administrateur a modifié votre réponse.",
        ),
        Template::NewAnswerInRelatedQuestion => (
            "Nouvelle réponse à une question que vous suivez",
            "Une nouvelle réponse a été publiée sur une question à laquelle vous avez répondu.",
        ),
        Template::AnswerPublishedOnMyQuestion => (
            "Nouvelle réponse à votre question",
            "Quelqu'un a répondu à votre question.",
        ),
        Template::OfficialAnswerInRelatedQuestion => (
            "Une réponse est devenue officielle",
            "Une réponse est devenue officielle sur une question à laquelle vous avez répondu.",
        ),
        Template::MyQuestionAnswerMarkedOfficial => (
            "Votre question a une réponse officielle",
            "Une réponse à votre question est devenue officielle.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> TemplateContext<'static> {
        TemplateContext {
            recipient_name: "Ada",
            question_id: "q1",
            question_title: "Wifi down",
        }
    }

    #[test]
    fn test_locale_from_tag() {
        assert_eq!(Locale::from_tag("fr"), Locale::Fr);
        assert_eq!(Locale::from_tag("FR-ca"), Locale::Fr);
        assert_eq!(Locale::from_tag("en_US"), Locale::En);
        assert_eq!(Locale::from_tag("de"), Locale::En);
        assert_eq!(Locale::from_tag(""), Locale::En);
    }

    #[test]
    fn test_render_english() {
        let localizer = Localizer::new(Locale::En, "Clubdesk", "https://help.example.org/");
        let rendered = localizer.render(Template::AnswerPublishedOnMyQuestion, &ctx());

        assert_eq!(rendered.subject, "[Clubdesk] New answer to your question");
        assert!(rendered.body.starts_with("Hello Ada,"));
        assert!(rendered.body.contains("\"Wifi down\""));
        assert!(rendered.body.contains("https://help.example.org/questions/q1"));
    }

    #[test]
    fn test_render_french() {
        let localizer = Localizer::new(Locale::Fr, "Clubdesk", "https://help.example.org");
        let rendered = localizer.render(Template::NewClubQuestion, &ctx());

        assert_eq!(rendered.subject, "[Clubdesk] Nouvelle question dans votre club");
        assert!(rendered.body.starts_with("Bonjour Ada,"));
    }

    #[test]
    fn test_confirmation_differs_from_club_notice() {
        let localizer = Localizer::new(Locale::En, "Clubdesk", "https://help.example.org");
        let club = localizer.render(Template::NewClubQuestion, &ctx());
        let confirmation = localizer.render(Template::NewQuestionConfirmation, &ctx());

        assert_ne!(club.subject, confirmation.subject);
    }
}
