//! Event to chat message translation.
//!
//! This module turns decoded webhook events into Markdown messages:
//! - Resolving source handles to chat handles (`username`)
//! - Cleaning pull-request titles (`title`)
//! - Filling the per-event templates (`compose`)

pub mod compose;
pub mod title;
pub mod username;

use tracing::{debug, instrument};

use crate::base::types::{PullRequest, WebhookEvent};

use compose::PullRequestLink;
use title::TitleSanitizer;
use username::UsernameResolver;

/// Render the chat message for `event`, or `None` when the event is suppressed.
#[instrument(skip_all, fields(kind = %event.kind()))]
pub async fn render(event: &WebhookEvent, names: &UsernameResolver, titles: &TitleSanitizer) -> Option<String> {
    if event.is_suppressed() {
        debug!("Event is suppressed, nothing to render.");
        return None;
    }

    let pr = event.pull_request();
    let link = pull_request_link(pr, titles);
    let author = names.mention(&pr.author).await;

    let message = match event {
        WebhookEvent::Opened(_) => compose::opened(&author, &link),
        WebhookEvent::ReviewRequested(request) => compose::review_requested(&names.mention(&request.reviewer).await, &author, &link),
        WebhookEvent::ReviewRerequested(request) => compose::review_rerequested(&names.mention(&request.reviewer).await, &author, &link),
        WebhookEvent::Approved(review) => {
            debug!("Pull request has {} approval(s).", review.approve_count.0);
            compose::approved(&author, &names.mention(&review.reviewer).await, &link)
        }
        WebhookEvent::ChangesRequested(review) => compose::changes_requested(&author, &names.mention(&review.reviewer).await, &link),
        WebhookEvent::Commented(review) => compose::commented(&author, &names.mention(&review.reviewer).await, &link),
        WebhookEvent::CiTestFailed(_) => compose::ci_test_failed(&author, &link),
        WebhookEvent::LintFailed(_) => compose::lint_failed(&author, &link),
    };

    Some(message)
}

fn pull_request_link(pr: &PullRequest, titles: &TitleSanitizer) -> PullRequestLink {
    PullRequestLink::new(titles.sanitize(&pr.title), pr.url.clone())
}

// Tests.

#[cfg(test)]
mod tests {
    use base64::{Engine, engine::general_purpose::STANDARD};

    use super::*;
    use crate::base::{
        config::TitleEncoding,
        types::{EventKind, Username},
    };

    fn names() -> UsernameResolver {
        UsernameResolver::with_mapping([("alice".to_string(), "alice_tg".to_string())].into_iter().collect())
    }

    fn body(reviewer: &str, title: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "reviewer": reviewer,
            "pull_request": { "title": title, "html_url": "https://github.com/acme/app/pull/7", "author": "alice" },
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_render_resolves_and_sanitizes() {
        let event = EventKind::Approved.decode(&body("bob", &STANDARD.encode("[epic] Rollout"))).unwrap();

        let message = render(&event, &names(), &TitleSanitizer::new(TitleEncoding::Base64)).await;

        assert_eq!(
            message.as_deref(),
            Some("✅ *@alice_tg, твои изменения одобрил(а)* [@bob](tg://resolve?domain=bob)\n\n[EPIC: Rollout](https://github.com/acme/app/pull/7)")
        );
    }

    #[tokio::test]
    async fn test_render_suppresses_self_comments() {
        let event = EventKind::Commented.decode(&body("alice", "Fix")).unwrap();

        assert_eq!(render(&event, &names(), &TitleSanitizer::new(TitleEncoding::Plain)).await, None);
    }

    #[tokio::test]
    async fn test_render_comments_from_others() {
        let event = EventKind::Commented.decode(&body("bob", "Fix")).unwrap();

        let message = render(&event, &names(), &TitleSanitizer::new(TitleEncoding::Plain)).await.unwrap();

        assert!(message.starts_with("*✍️ @alice_tg, тебе оставил(а) комментарий*"));
    }

    #[tokio::test]
    async fn test_render_keeps_link_when_title_fails_to_decode() {
        let event = WebhookEvent::Opened(PullRequest {
            title: "%%%".to_string(),
            url: "https://github.com/acme/app/pull/7".to_string(),
            author: Username::from("alice"),
        });

        let message = render(&event, &names(), &TitleSanitizer::new(TitleEncoding::Base64)).await.unwrap();

        assert_eq!(message, "*🚀 Новый PR от* [@alice_tg](tg://resolve?domain=alice_tg)\n\n[](https://github.com/acme/app/pull/7)");
    }
}
