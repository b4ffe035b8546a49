//! Plain-text rendering of the session and detail view models.

use std::fmt::Write;

use crate::session::{DetailState, SearchSession};

pub fn render_session(session: &SearchSession) -> String {
    if !session.has_term() {
        return "No search yet. Type `search <term>`.".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "Search: \"{}\" ({} results)", session.term, session.total_count);

    if session.loading {
        out.push_str("Loading...");
        return out;
    }

    if session.results.is_empty() {
        out.push_str("No results.");
        return out;
    }

    let _ = writeln!(out, "Page {} of {}", session.page, session.total_pages().max(1));
    for article in &session.results {
        let _ = writeln!(
            out,
            "  [{}] {} ({})\n      {}",
            article.id, article.title, article.year, article.authors
        );
    }
    out.trim_end().to_string()
}

/// Empty when the detail view is closed.
pub fn render_detail(state: &DetailState) -> String {
    match state {
        DetailState::Closed => String::new(),
        DetailState::Loading { id } => format!("Loading article {}...", id),
        DetailState::Shown(article) => {
            let mut out = String::new();
            let _ = writeln!(out, "{}", article.title);
            let _ = writeln!(out, "  https://pubmed.ncbi.nlm.nih.gov/{}/", article.pmid);
            let _ = writeln!(out, "PMID: {}", article.pmid);
            let _ = writeln!(out, "Publication Year: {}", article.publication_year);
            let _ = writeln!(out, "Journal: {}", article.journal);
            let _ = writeln!(out, "Authors: {}", article.authors.join(", "));
            let _ = writeln!(out, "Abstract: {}", article.abstract_text);
            let _ = write!(out, "MeSH Terms: {}", article.mesh_terms.join(", "));
            out
        }
    }
}
