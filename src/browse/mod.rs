//! Interactive Browser
//!
//! Line-oriented front end for a search session. It plays the view layer:
//! it turns input lines into intents, forwards them to the controller and
//! detail coordinator, and prints the read-only view model they publish.
//!
//! This is also the outermost error boundary. Remote failures are shown as a
//! notification; those that invalidate the session reset it to a clean,
//! empty search, while a network failure leaves it in place for a retry.

pub mod action;
pub mod view;

pub use action::{parse_action, BrowseAction, HELP};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use crate::api::SearchGateway;
use crate::session::{
    DetailCoordinator, DetailOutcome, SearchController, SearchOutcome, SessionError, SnapshotStore,
};

/// Whether the input loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Browser<G, S> {
    controller: SearchController<G, S>,
    details: DetailCoordinator<G>,
}

impl<G, S> Browser<G, S>
where
    G: SearchGateway + Clone,
    S: SnapshotStore,
{
    pub fn new(gateway: G, store: S) -> Self {
        Self {
            controller: SearchController::new(gateway.clone(), store),
            details: DetailCoordinator::new(gateway),
        }
    }

    pub fn controller(&self) -> &SearchController<G, S> {
        &self.controller
    }

    pub fn details(&self) -> &DetailCoordinator<G> {
        &self.details
    }

    /// Restore the last session and render it.
    pub async fn start(&self) -> String {
        if self.controller.hydrate().await {
            format!("Restored last search.\n{}", self.render())
        } else {
            self.render()
        }
    }

    /// Apply one intent and return the text to show.
    pub async fn handle(&self, action: BrowseAction) -> (Flow, String) {
        let result = match action {
            BrowseAction::Quit => return (Flow::Quit, String::new()),
            BrowseAction::Help => return (Flow::Continue, HELP.to_string()),
            BrowseAction::Status => Ok(None),
            BrowseAction::Search(term) => self.controller.run_search(&term, 1, None).await.map(notice),
            BrowseAction::Next => self.controller.next_page().await.map(|o| o.and_then(notice)),
            BrowseAction::Previous => self.controller.previous_page().await.map(|o| o.and_then(notice)),
            BrowseAction::Page(page) => self.controller.go_to_page(page).await.map(|o| o.and_then(notice)),
            BrowseAction::First => match self.controller.go_to_first_page().await {
                Ok(None) => Ok(Some("Nothing stored yet.".to_string())),
                other => other.map(|o| o.and_then(notice)),
            },
            BrowseAction::Show(id) => match self.details.open(&id).await {
                Ok(DetailOutcome::Shown) => {
                    return (Flow::Continue, view::render_detail(&self.details.state()))
                }
                Ok(DetailOutcome::Discarded) => Ok(None),
                Err(e) => Err(e),
            },
            BrowseAction::Close => {
                self.details.close();
                Ok(None)
            }
            BrowseAction::Reset => {
                self.reset().await;
                Ok(Some("Session cleared.".to_string()))
            }
        };

        let text = match result {
            Ok(Some(message)) => format!("{}\n{}", message, self.render()),
            Ok(None) => self.render(),
            Err(e) => self.report(e).await,
        };
        (Flow::Continue, text)
    }

    fn render(&self) -> String {
        let session = view::render_session(&self.controller.session());
        let detail = view::render_detail(&self.details.state());
        if detail.is_empty() {
            session
        } else {
            format!("{}\n\n{}", session, detail)
        }
    }

    async fn reset(&self) {
        self.details.close();
        self.controller.reset().await;
    }

    async fn report(&self, error: SessionError) -> String {
        match error.api() {
            Some(api) => {
                warn!(kind = %api.kind(), error = %api, "Remote call failed");
                let message = api.user_message();
                if api.invalidates_session() {
                    self.reset().await;
                    format!("{}\nThe session was reset, start a new search.", message)
                } else {
                    format!("{}\nThe session is unchanged, try again.", message)
                }
            }
            None => error.to_string(),
        }
    }

    /// Read commands from stdin until `quit` or end of input.
    pub async fn run(&self) -> anyhow::Result<()> {
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        stdout.write_all(format!("{}\n", self.start().await).as_bytes()).await?;

        loop {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            let text = match parse_action(&line) {
                Ok(action) => {
                    let (flow, text) = self.handle(action).await;
                    if flow == Flow::Quit {
                        break;
                    }
                    text
                }
                Err(message) => message,
            };
            stdout.write_all(format!("{}\n", text).as_bytes()).await?;
        }

        info!("Browser closed");
        Ok(())
    }
}

fn notice(outcome: SearchOutcome) -> Option<String> {
    match outcome {
        SearchOutcome::Applied { persisted: false } => {
            Some("(could not save this search; it will not survive a restart)".to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::session::testing::{detail, page_of, ScriptedGateway};
    use crate::session::{MemorySnapshotStore, SearchSession};
    use std::sync::Arc;

    fn browser() -> (Arc<ScriptedGateway>, Browser<Arc<ScriptedGateway>, MemorySnapshotStore>) {
        let gateway = Arc::new(ScriptedGateway::new());
        let browser = Browser::new(gateway.clone(), MemorySnapshotStore::new());
        (gateway, browser)
    }

    #[tokio::test]
    async fn test_search_and_page() {
        let (gateway, browser) = browser();
        gateway.push_page(page_of(5, 23, Some(("W1", "1"))));
        gateway.push_page(page_of(5, 23, None));

        let (_, text) = browser.handle(BrowseAction::Search("cancer".into())).await;
        assert!(text.contains("Page 1 of 5"));

        let (_, text) = browser.handle(BrowseAction::Next).await;
        assert!(text.contains("Page 2 of 5"));
        assert!(gateway.last_request().query.is_by_token());
    }

    #[tokio::test]
    async fn test_rate_limit_resets_session() {
        let (gateway, browser) = browser();
        gateway.push_page(page_of(5, 23, Some(("W1", "1"))));
        gateway.push_error(ApiError::RateLimited);

        browser.handle(BrowseAction::Search("cancer".into())).await;
        let (flow, text) = browser.handle(BrowseAction::Next).await;

        assert_eq!(flow, Flow::Continue);
        assert!(text.contains("Too many requests"));
        assert!(text.contains("reset"));
        assert_eq!(browser.controller().session(), SearchSession::default());
        assert_eq!(browser.controller().go_to_first_page().await, Ok(None));
    }

    #[tokio::test]
    async fn test_network_error_keeps_session() {
        let (gateway, browser) = browser();
        gateway.push_page(page_of(5, 23, Some(("W1", "1"))));
        gateway.push_error(ApiError::Network("connection refused".into()));

        browser.handle(BrowseAction::Search("cancer".into())).await;
        let (_, text) = browser.handle(BrowseAction::Next).await;

        assert!(text.contains("Network error"));
        let session = browser.controller().session();
        assert_eq!(session.term, "cancer");
        assert_eq!(session.page, 1);
        assert_eq!(session.results.len(), 5);
    }

    #[tokio::test]
    async fn test_show_and_close_detail() {
        let (gateway, browser) = browser();
        gateway.push_details(Ok(vec![detail("42")]));

        let (_, text) = browser.handle(BrowseAction::Show("42".into())).await;
        assert!(text.contains("PMID: 42"));

        let (_, text) = browser.handle(BrowseAction::Close).await;
        assert!(!text.contains("PMID: 42"));
    }

    #[tokio::test]
    async fn test_first_without_snapshot() {
        let (_, browser) = browser();
        let (_, text) = browser.handle(BrowseAction::First).await;
        assert!(text.starts_with("Nothing stored yet."));
    }

    #[tokio::test]
    async fn test_quit() {
        let (_, browser) = browser();
        assert_eq!(browser.handle(BrowseAction::Quit).await.0, Flow::Quit);
    }
}
