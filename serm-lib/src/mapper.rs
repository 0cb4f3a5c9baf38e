//! Flattening of provider responses into [`SearchResult`] records.
//!
//! Expected shape (xmltodict conventions):
//!
//! ```text
//! yandexsearch
//! └── response
//!     ├── error            (optional, provider-side failure)
//!     └── results
//!         └── grouping
//!             └── group    (map for one result, list for several)
//!                 └── doc
//!                     ├── url
//!                     ├── headline
//!                     └── passages
//!                         └── passage   (map, text, or list of them)
//! ```

use crate::error::{MonitorError, MonitorResult};
use crate::models::SearchResult;
use crate::provider::ProviderNode;

/// Map a parsed response into results numbered 1..N in provider order.
///
/// `keyword_clause` is the headline of last resort.
pub fn map_response(root: &ProviderNode, keyword_clause: &str) -> MonitorResult<Vec<SearchResult>> {
    let response = root
        .path(&["yandexsearch", "response"])
        .ok_or_else(|| malformed("missing yandexsearch.response"))?;

    if let Some(error) = response.get("error") {
        return Err(provider_error(error));
    }

    let grouping = response
        .path(&["results", "grouping"])
        .ok_or_else(|| malformed("missing results.grouping"))?;

    let groups: Vec<&ProviderNode> = match grouping {
        ProviderNode::Null => Vec::new(),
        ProviderNode::Map(_) => match grouping.get("group") {
            None | Some(ProviderNode::Null) => Vec::new(),
            Some(ProviderNode::List(items)) => items.iter().collect(),
            Some(group @ ProviderNode::Map(_)) => vec![group],
            Some(ProviderNode::Text(_)) => return Err(malformed("group is plain text")),
        },
        _ => return Err(malformed("grouping is not an object")),
    };

    groups
        .into_iter()
        .enumerate()
        .map(|(index, group)| map_group(index + 1, group, keyword_clause))
        .collect()
}

fn map_group(id: usize, group: &ProviderNode, keyword_clause: &str) -> MonitorResult<SearchResult> {
    if !matches!(group, ProviderNode::Map(_)) {
        return Err(malformed(format!("group {} is not an object", id)));
    }
    let doc = group.get("doc").unwrap_or(&ProviderNode::Null);
    let headline = headline_text(doc.get("headline"));

    Ok(SearchResult {
        id,
        url: doc
            .get("url")
            .and_then(ProviderNode::as_text)
            .map(str::to_string),
        snippet: normalize_whitespace(&snippet_text(doc, headline.as_deref())),
        headline: headline.unwrap_or_else(|| keyword_clause.to_string()),
    })
}

/// Passage texts, or the headline text when the document has no passages
fn snippet_text(doc: &ProviderNode, headline: Option<&str>) -> String {
    match doc.path(&["passages", "passage"]) {
        Some(ProviderNode::List(passages)) => passages
            .iter()
            .map(passage_text)
            .collect::<Vec<_>>()
            .join(" "),
        Some(passage) if !passage.is_null() => passage_text(passage),
        _ => headline.unwrap_or_default().to_string(),
    }
}

fn passage_text(passage: &ProviderNode) -> String {
    match passage {
        ProviderNode::Text(text) => text.clone(),
        ProviderNode::Map(_) => passage
            .get("#text")
            .map(ProviderNode::flatten_text)
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Best-effort display title; `None` when the headline is absent or unusable
fn headline_text(headline: Option<&ProviderNode>) -> Option<String> {
    let headline = headline?;
    let text = match headline {
        ProviderNode::Map(_) => {
            let value = headline
                .get("hlword")
                .filter(|node| !node.is_empty())
                .or_else(|| headline.get("#text"))?;
            match value {
                ProviderNode::List(items) => join_items(items),
                other => other.flatten_text(),
            }
        }
        ProviderNode::List(items) => join_items(items),
        ProviderNode::Text(text) => text.clone(),
        ProviderNode::Null => return None,
    };

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn join_items(items: &[ProviderNode]) -> String {
    items
        .iter()
        .map(ProviderNode::flatten_text)
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn provider_error(error: &ProviderNode) -> MonitorError {
    let code = error
        .get("@code")
        .and_then(ProviderNode::as_text)
        .unwrap_or("unknown");
    let message = normalize_whitespace(&error.flatten_text());
    MonitorError::ProviderTransport {
        status: None,
        message: format!("provider error {}: {}", code, message),
    }
}

fn malformed(detail: impl Into<String>) -> MonitorError {
    MonitorError::MalformedResponse(detail.into())
}
