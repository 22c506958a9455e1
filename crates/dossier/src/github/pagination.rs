//! Page-number pagination.
//!
//! GitHub list endpoints take `page` and `per_page`. A loop requests pages
//! 1, 2, … and stops at the first empty or short page, or once the cap is
//! reached. A 404 mid-way ends the loop and keeps what was collected.

use serde::de::DeserializeOwned;

use super::client::{GitHubClient, QueryParams};
use super::error::{GitHubError, Result};

/// Largest `per_page` GitHub accepts.
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub per_page: u32,
    pub max_items: usize,
}

impl PageLimits {
    pub const fn new(per_page: u32, max_items: usize) -> Self {
        Self {
            per_page,
            max_items,
        }
    }

    /// Follow pages until the listing runs out.
    pub const fn unbounded(per_page: u32) -> Self {
        Self::new(per_page, usize::MAX)
    }
}

impl GitHubClient {
    pub async fn paginate<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &QueryParams<'_>,
        limits: PageLimits,
    ) -> Result<Vec<T>> {
        self.paginate_filtered(path, params, limits, |_| true).await
    }

    /// Paginate, keeping only items for which `keep` holds.
    ///
    /// The cap counts kept items; the short-page check counts raw items.
    pub async fn paginate_filtered<T, F>(
        &self,
        path: &str,
        params: &QueryParams<'_>,
        limits: PageLimits,
        keep: F,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        let per_page = limits.per_page.clamp(1, MAX_PER_PAGE);
        let mut items = Vec::new();
        let mut page: u32 = 1;

        while items.len() < limits.max_items {
            let mut query = params.to_vec();
            query.push(("per_page", per_page.to_string()));
            query.push(("page", page.to_string()));

            let batch: Vec<T> = match self.get_json(path, &query).await {
                Ok(batch) => batch,
                Err(GitHubError::NotFound { .. }) => break,
                Err(e) => return Err(e),
            };

            let received = batch.len();
            tracing::trace!(path, page, received, "Fetched page");
            items.extend(batch.into_iter().filter(|item| keep(item)));

            if received < per_page as usize {
                break;
            }
            page += 1;
        }

        items.truncate(limits.max_items);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::client::test_support::*;
    use crate::http::MockTransport;
    use serde_json::json;

    fn numbers(range: std::ops::Range<u32>) -> serde_json::Value {
        json!(range.map(|n| json!({"n": n})).collect::<Vec<_>>())
    }

    #[derive(Debug, serde::Deserialize)]
    struct Item {
        n: u32,
    }

    #[tokio::test]
    async fn stops_on_short_page() {
        let transport = MockTransport::new();
        transport.push_json(format!("{API}/items?per_page=2&page=1"), 200, numbers(0..2));
        transport.push_json(format!("{API}/items?per_page=2&page=2"), 200, numbers(2..3));
        let client = mock_client(&transport);

        let items: Vec<Item> = client
            .paginate("items", &[], PageLimits::new(2, 100))
            .await
            .expect("pages");
        assert_eq!(items.iter().map(|i| i.n).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn stops_on_empty_page() {
        let transport = MockTransport::new();
        transport.push_json(format!("{API}/items?per_page=2&page=1"), 200, numbers(0..2));
        transport.push_json(format!("{API}/items?per_page=2&page=2"), 200, json!([]));
        let client = mock_client(&transport);

        let items: Vec<Item> = client
            .paginate("items", &[], PageLimits::unbounded(2))
            .await
            .expect("pages");
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn hard_cap_truncates_and_stops_requesting() {
        let transport = MockTransport::new();
        transport.push_json(format!("{API}/items?per_page=3&page=1"), 200, numbers(0..3));
        transport.push_json(format!("{API}/items?per_page=3&page=2"), 200, numbers(3..6));
        let client = mock_client(&transport);

        let items: Vec<Item> = client
            .paginate("items", &[], PageLimits::new(3, 4))
            .await
            .expect("pages");
        assert_eq!(items.len(), 4);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn not_found_keeps_collected_items() {
        let transport = MockTransport::new();
        transport.push_json(format!("{API}/items?per_page=1&page=1"), 200, numbers(0..1));
        transport.push_json(format!("{API}/items?per_page=1&page=2"), 404, json!({"message": "Not Found"}));
        let client = mock_client(&transport);

        let items: Vec<Item> = client
            .paginate("items", &[], PageLimits::new(1, 10))
            .await
            .expect("404 ends the loop");
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn filter_applies_before_cap_and_extra_params_come_first() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/items?state=all&per_page=4&page=1"),
            200,
            numbers(0..4),
        );
        transport.push_json(
            format!("{API}/items?state=all&per_page=4&page=2"),
            200,
            numbers(4..6),
        );
        let client = mock_client(&transport);

        let items: Vec<Item> = client
            .paginate_filtered(
                "items",
                &[("state", "all".to_string())],
                PageLimits::new(4, 10),
                |i: &Item| i.n % 2 == 0,
            )
            .await
            .expect("pages");
        assert_eq!(items.iter().map(|i| i.n).collect::<Vec<_>>(), vec![0, 2, 4]);
    }

    #[tokio::test]
    async fn other_errors_propagate() {
        let transport = MockTransport::new();
        transport.push_json(format!("{API}/items?per_page=1&page=1"), 401, json!({}));
        let client = mock_client(&transport);
        let err = client
            .paginate::<Item>("items", &[], PageLimits::new(1, 10))
            .await
            .expect_err("401");
        assert!(matches!(err, GitHubError::AuthRequired));
    }
}
