//! Message templates, one per event kind.
//!
//! Every function here is pure: handles are already resolved and titles
//! already sanitized, so the output depends only on the arguments.

use std::fmt;

use super::username::Mention;

/// A pull request rendered as a Markdown link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestLink {
    pub title: String,
    pub url: String,
}

impl PullRequestLink {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self { title: title.into(), url: url.into() }
    }
}

impl fmt::Display for PullRequestLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]({})", self.title, self.url)
    }
}

pub fn opened(author: &Mention, pr: &PullRequestLink) -> String {
    format!("*🚀 Новый PR от* {}\n\n{}", author.link(), pr)
}

pub fn review_requested(reviewer: &Mention, author: &Mention, pr: &PullRequestLink) -> String {
    format!("*👀 {}, тебя приглашают на ревью*\n\n{} (by {})", reviewer.tag(), pr, author.link())
}

pub fn review_rerequested(reviewer: &Mention, author: &Mention, pr: &PullRequestLink) -> String {
    format!("*👀 {}, тебя приглашают на ре-ревью*\n\n{} (by {})", reviewer.tag(), pr, author.link())
}

pub fn approved(author: &Mention, reviewer: &Mention, pr: &PullRequestLink) -> String {
    format!("✅ *{}, твои изменения одобрил(а)* {}\n\n{}", author.tag(), reviewer.link(), pr)
}

pub fn changes_requested(author: &Mention, reviewer: &Mention, pr: &PullRequestLink) -> String {
    format!("❌ *{}, тебя просит внести изменения* {}\n\n{}", author.tag(), reviewer.link(), pr)
}

pub fn commented(author: &Mention, reviewer: &Mention, pr: &PullRequestLink) -> String {
    format!("*✍️ {}, тебе оставил(а) комментарий* {}\n\n{}", author.tag(), reviewer.link(), pr)
}

pub fn ci_test_failed(author: &Mention, pr: &PullRequestLink) -> String {
    format!("*🤒 {}, возникли ошибки во время прогона тестов на CI*\n\n{}", author.tag(), pr)
}

pub fn lint_failed(author: &Mention, pr: &PullRequestLink) -> String {
    format!("*🤖 {}, линтер обнаружил проблемы в твоем коде*\n\n{}", author.tag(), pr)
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    fn pr() -> PullRequestLink {
        PullRequestLink::new("DRAFT: Fix bug", "https://github.com/acme/app/pull/7")
    }

    fn alice() -> Mention {
        Mention::new("alice_tg")
    }

    fn bob() -> Mention {
        Mention::new("bob_tg")
    }

    #[test]
    fn test_pull_request_link() {
        assert_eq!(pr().to_string(), "[DRAFT: Fix bug](https://github.com/acme/app/pull/7)");
    }

    #[test]
    fn test_opened() {
        assert_eq!(
            opened(&alice(), &pr()),
            "*🚀 Новый PR от* [@alice_tg](tg://resolve?domain=alice_tg)\n\n[DRAFT: Fix bug](https://github.com/acme/app/pull/7)"
        );
    }

    #[test]
    fn test_review_requests() {
        assert_eq!(
            review_requested(&bob(), &alice(), &pr()),
            "*👀 @bob_tg, тебя приглашают на ревью*\n\n[DRAFT: Fix bug](https://github.com/acme/app/pull/7) (by [@alice_tg](tg://resolve?domain=alice_tg))"
        );
        assert_eq!(
            review_rerequested(&bob(), &alice(), &pr()),
            "*👀 @bob_tg, тебя приглашают на ре-ревью*\n\n[DRAFT: Fix bug](https://github.com/acme/app/pull/7) (by [@alice_tg](tg://resolve?domain=alice_tg))"
        );
    }

    #[test]
    fn test_review_outcomes() {
        assert_eq!(
            approved(&alice(), &bob(), &pr()),
            "✅ *@alice_tg, твои изменения одобрил(а)* [@bob_tg](tg://resolve?domain=bob_tg)\n\n[DRAFT: Fix bug](https://github.com/acme/app/pull/7)"
        );
        assert_eq!(
            changes_requested(&alice(), &bob(), &pr()),
            "❌ *@alice_tg, тебя просит внести изменения* [@bob_tg](tg://resolve?domain=bob_tg)\n\n[DRAFT: Fix bug](https://github.com/acme/app/pull/7)"
        );
        assert_eq!(
            commented(&alice(), &bob(), &pr()),
            "*✍️ @alice_tg, тебе оставил(а) комментарий* [@bob_tg](tg://resolve?domain=bob_tg)\n\n[DRAFT: Fix bug](https://github.com/acme/app/pull/7)"
        );
    }

    #[test]
    fn test_ci_failures() {
        assert_eq!(
            ci_test_failed(&alice(), &pr()),
            "*🤒 @alice_tg, возникли ошибки во время прогона тестов на CI*\n\n[DRAFT: Fix bug](https://github.com/acme/app/pull/7)"
        );
        assert_eq!(
            lint_failed(&alice(), &pr()),
            "*🤖 @alice_tg, линтер обнаружил проблемы в твоем коде*\n\n[DRAFT: Fix bug](https://github.com/acme/app/pull/7)"
        );
    }

    #[test]
    fn test_templates_are_deterministic() {
        assert_eq!(approved(&alice(), &bob(), &pr()), approved(&alice(), &bob(), &pr()));
        assert_eq!(opened(&alice(), &pr()), opened(&Mention::new("alice_tg"), &PullRequestLink::new("DRAFT: Fix bug", "https://github.com/acme/app/pull/7")));
    }
}
