//! Fixed-size pagination and hydra-style collection envelopes.

use serde::Serialize;
use serde_json::Value;

/// Items per page for every collection.
pub const ITEMS_PER_PAGE: i64 = 10;

/// Row offset of a 1-based page. Saturates for pages past the parser's bound.
pub fn offset(page: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(ITEMS_PER_PAGE)
}

/// Number of the last page; an empty collection still has page 1.
pub fn last_page(total_items: i64) -> i64 {
    ((total_items + ITEMS_PER_PAGE - 1) / ITEMS_PER_PAGE).max(1)
}

/// Links between the pages of a partial collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HydraView {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "hydra:first")]
    pub first: String,
    #[serde(rename = "hydra:last")]
    pub last: String,
    #[serde(rename = "hydra:previous", skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    #[serde(rename = "hydra:next", skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl HydraView {
    /// Builds the view, or `None` when everything fits on one page.
    pub fn build(
        path: &str,
        passthrough: &[(String, String)],
        page: i64,
        total_items: i64,
    ) -> Option<Self> {
        let last = last_page(total_items);
        if last <= 1 && page <= 1 {
            return None;
        }
        let link = |n: i64| page_link(path, passthrough, n);
        Some(Self {
            id: link(page),
            first: link(1),
            last: link(last),
            previous: (page > 1).then(|| link(page - 1)),
            next: (page < last).then(|| link(page + 1)),
        })
    }
}

/// A page of normalized members.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HydraCollection {
    #[serde(rename = "hydra:member")]
    pub member: Vec<Value>,
    #[serde(rename = "hydra:totalItems")]
    pub total_items: i64,
    #[serde(rename = "hydra:view", skip_serializing_if = "Option::is_none")]
    pub view: Option<HydraView>,
}

impl HydraCollection {
    pub fn new(
        member: Vec<Value>,
        total_items: i64,
        path: &str,
        passthrough: &[(String, String)],
        page: i64,
    ) -> Self {
        Self {
            member,
            total_items,
            view: HydraView::build(path, passthrough, page, total_items),
        }
    }
}

fn page_link(path: &str, passthrough: &[(String, String)], page: i64) -> String {
    let mut pairs: Vec<(&str, String)> = passthrough
        .iter()
        .map(|(k, v)| (k.as_str(), v.clone()))
        .collect();
    pairs.push(("page", page.to_string()));
    match serde_urlencoded::to_string(&pairs) {
        Ok(query) => format!("{}?{}", path, query),
        Err(e) => {
            tracing::warn!("Failed to encode page link: {}", e);
            format!("{}?page={}", path, page)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_offset() {
        assert_eq!(offset(1), 0);
        assert_eq!(offset(2), 10);
        assert_eq!(offset(5), 40);
        assert_eq!(offset(i64::MAX), i64::MAX);
    }

    #[test]
    fn test_last_page() {
        assert_eq!(last_page(0), 1);
        assert_eq!(last_page(1), 1);
        assert_eq!(last_page(10), 1);
        assert_eq!(last_page(11), 2);
        assert_eq!(last_page(42), 5);
    }

    #[test]
    fn test_single_page_has_no_view() {
        assert!(HydraView::build("/api/treasures", &[], 1, 7).is_none());
        assert!(HydraView::build("/api/treasures", &[], 1, 0).is_none());
    }

    #[test]
    fn test_view_links_keep_filters() {
        let passthrough = vec![("isPublished".to_string(), "true".to_string())];
        let view = HydraView::build("/api/treasures", &passthrough, 2, 42).unwrap();
        assert_eq!(view.id, "/api/treasures?isPublished=true&page=2");
        assert_eq!(view.first, "/api/treasures?isPublished=true&page=1");
        assert_eq!(view.last, "/api/treasures?isPublished=true&page=5");
        assert_eq!(
            view.previous.as_deref(),
            Some("/api/treasures?isPublished=true&page=1")
        );
        assert_eq!(
            view.next.as_deref(),
            Some("/api/treasures?isPublished=true&page=3")
        );
    }

    #[test]
    fn test_view_on_last_page_has_no_next() {
        let view = HydraView::build("/api/users/1/treasures", &[], 3, 25).unwrap();
        assert!(view.next.is_none());
        assert_eq!(view.previous.as_deref(), Some("/api/users/1/treasures?page=2"));
    }

    #[test]
    fn test_page_past_the_end_still_links_back() {
        let view = HydraView::build("/api/treasures", &[], 4, 3).unwrap();
        assert_eq!(view.last, "/api/treasures?page=1");
        assert_eq!(view.previous.as_deref(), Some("/api/treasures?page=3"));
        assert!(view.next.is_none());
    }

    #[test]
    fn test_collection_serialization() {
        let collection = HydraCollection::new(vec![json!({"name": "Crown"})], 1, "/api/treasures", &[], 1);
        let json = serde_json::to_value(&collection).unwrap();
        assert_eq!(
            json,
            json!({
                "hydra:member": [{"name": "Crown"}],
                "hydra:totalItems": 1
            })
        );
    }

    #[test]
    fn test_page_link_encodes_brackets() {
        let passthrough = vec![("properties[]".to_string(), "name".to_string())];
        let link = page_link("/api/treasures", &passthrough, 2);
        assert_eq!(link, "/api/treasures?properties%5B%5D=name&page=2");
    }
}
