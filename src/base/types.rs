//! Result aliases and the webhook entity model.

use std::{fmt, num::ParseIntError, str::FromStr};

use serde::Deserialize;
use serde_with::{DefaultOnError, DisplayFromStr, PickFirst, serde_as};

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

// Usernames.

/// A handle in the source control system (e.g., a GitHub login).
///
/// Never empty: the empty string is rejected when the payload is decoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Username(String);

impl Username {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Err("username must not be empty".to_string());
        }

        Ok(Self(value))
    }
}

impl From<&str> for Username {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Entities.

/// A pull request as reported by CI.
///
/// The title may arrive encoded; see [`crate::notification::title`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    pub title: String,
    #[serde(rename = "html_url")]
    pub url: String,
    pub author: Username,
}

/// A review request (or re-request) on a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RequestReviewer {
    /// Older workflows send this under the misspelled `reqester` key.
    #[serde(default, alias = "reqester")]
    pub requester: Option<Username>,
    pub reviewer: Username,
    pub pull_request: PullRequest,
}

/// A submitted review (approval, change request or comment).
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Review {
    pub reviewer: Username,
    pub pull_request: PullRequest,
    #[serde_as(as = "DefaultOnError<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub approve_count: ApproveCount,
}

/// Number of approvals a pull request has collected.
///
/// Accepts a number or a numeric string; anything else counts as one approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ApproveCount(pub u32);

impl Default for ApproveCount {
    fn default() -> Self {
        Self(1)
    }
}

impl FromStr for ApproveCount {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

// Events.

/// The kinds of pull-request events the service accepts, one per endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Opened,
    ReviewRequested,
    ReviewRerequested,
    Approved,
    ChangesRequested,
    Commented,
    CiTestFailed,
    LintFailed,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::Opened,
        EventKind::ReviewRequested,
        EventKind::ReviewRerequested,
        EventKind::Approved,
        EventKind::ChangesRequested,
        EventKind::Commented,
        EventKind::CiTestFailed,
        EventKind::LintFailed,
    ];

    /// The HTTP path that receives this kind of event.
    pub fn path(self) -> &'static str {
        match self {
            EventKind::Opened => "/opened",
            EventKind::ReviewRequested => "/request-review",
            EventKind::ReviewRerequested => "/re-request-review",
            EventKind::Approved => "/approve",
            EventKind::ChangesRequested => "/request-changes",
            EventKind::Commented => "/comment",
            EventKind::CiTestFailed => "/rspec-fail",
            EventKind::LintFailed => "/rubocop-fail",
        }
    }

    /// Decode a JSON body into the event this kind expects.
    pub fn decode(self, body: &[u8]) -> Res<WebhookEvent> {
        let event = match self {
            EventKind::Opened => WebhookEvent::Opened(serde_json::from_slice(body)?),
            EventKind::ReviewRequested => WebhookEvent::ReviewRequested(serde_json::from_slice(body)?),
            EventKind::ReviewRerequested => WebhookEvent::ReviewRerequested(serde_json::from_slice(body)?),
            EventKind::Approved => WebhookEvent::Approved(serde_json::from_slice(body)?),
            EventKind::ChangesRequested => WebhookEvent::ChangesRequested(serde_json::from_slice(body)?),
            EventKind::Commented => WebhookEvent::Commented(serde_json::from_slice(body)?),
            EventKind::CiTestFailed => WebhookEvent::CiTestFailed(serde_json::from_slice(body)?),
            EventKind::LintFailed => WebhookEvent::LintFailed(serde_json::from_slice(body)?),
        };

        Ok(event)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path().trim_start_matches('/'))
    }
}

/// A decoded webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    Opened(PullRequest),
    ReviewRequested(RequestReviewer),
    ReviewRerequested(RequestReviewer),
    Approved(Review),
    ChangesRequested(Review),
    Commented(Review),
    CiTestFailed(PullRequest),
    LintFailed(PullRequest),
}

impl WebhookEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WebhookEvent::Opened(_) => EventKind::Opened,
            WebhookEvent::ReviewRequested(_) => EventKind::ReviewRequested,
            WebhookEvent::ReviewRerequested(_) => EventKind::ReviewRerequested,
            WebhookEvent::Approved(_) => EventKind::Approved,
            WebhookEvent::ChangesRequested(_) => EventKind::ChangesRequested,
            WebhookEvent::Commented(_) => EventKind::Commented,
            WebhookEvent::CiTestFailed(_) => EventKind::CiTestFailed,
            WebhookEvent::LintFailed(_) => EventKind::LintFailed,
        }
    }

    pub fn pull_request(&self) -> &PullRequest {
        match self {
            WebhookEvent::Opened(pr) | WebhookEvent::CiTestFailed(pr) | WebhookEvent::LintFailed(pr) => pr,
            WebhookEvent::ReviewRequested(request) | WebhookEvent::ReviewRerequested(request) => &request.pull_request,
            WebhookEvent::Approved(review) | WebhookEvent::ChangesRequested(review) | WebhookEvent::Commented(review) => &review.pull_request,
        }
    }

    /// Whether no notification should be sent for this event.
    ///
    /// Authors commenting on their own pull request are not announced.
    pub fn is_suppressed(&self) -> bool {
        match self {
            WebhookEvent::Commented(review) => review.reviewer == review.pull_request.author,
            _ => false,
        }
    }
}

// Tests.
