//! Attraction review endpoints

use serde::Serialize;
use serde_json::Value;

use super::client::ApiClient;
use super::error::ApiError;
use super::transport::ApiRequest;
use crate::models::PageQuery;

fn with_page(request: ApiRequest, page: &PageQuery) -> ApiRequest {
    request
        .param("pageNum", page.page_num)
        .param("pageSize", page.page_size)
        .param("sort", page.sort.as_deref())
}

pub async fn post_review(
    client: &ApiClient,
    attraction_id: u64,
    review: &impl Serialize,
) -> Result<Value, ApiError> {
    let path = format!("/trip/attraction/{}/review", attraction_id);
    client.send(ApiRequest::post(path).json(review)?).await
}

pub async fn update_review(
    client: &ApiClient,
    review_id: u64,
    review: &impl Serialize,
) -> Result<Value, ApiError> {
    let path = format!("/trip/attraction/review/{}", review_id);
    client.send(ApiRequest::put(path).json(review)?).await
}

pub async fn delete_review(client: &ApiClient, review_id: u64) -> Result<Value, ApiError> {
    let path = format!("/trip/attraction/review/{}", review_id);
    client.send(ApiRequest::delete(path)).await
}

/// Reviews of one attraction
pub async fn list_reviews(
    client: &ApiClient,
    attraction_id: u64,
    page: &PageQuery,
) -> Result<Value, ApiError> {
    let path = format!("/trip/attraction/{}/review", attraction_id);
    client.send(with_page(ApiRequest::get(path), page)).await
}

/// Reviews written by the signed-in user
pub async fn list_my_reviews(client: &ApiClient, page: &PageQuery) -> Result<Value, ApiError> {
    client
        .send(with_page(ApiRequest::get("/trip/attraction/review/my"), page))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{test_client, MockBackend};
    use crate::api::Method;
    use serde_json::json;
    use std::sync::Arc;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_list_reviews_sends_paging() {
        let backend = Arc::new(MockBackend::echo());
        let (client, _, _) = test_client(backend.clone(), None);

        let page = PageQuery::new(Some(2), Some(10), Some("latest".to_string()));
        list_reviews(&client, 125266, &page).await.unwrap();

        let call = backend.last_call();
        assert_eq!(call.method, Method::Get);
        assert_eq!(call.path, "/trip/attraction/125266/review");
        assert_eq!(
            call.params,
            params(&[("pageNum", "2"), ("pageSize", "10"), ("sort", "latest")])
        );
    }

    #[tokio::test]
    async fn test_my_reviews_omits_unset_paging() {
        let backend = Arc::new(MockBackend::echo());
        let (client, _, _) = test_client(backend.clone(), Some("tok1"));

        let page = PageQuery {
            page_num: Some(1),
            ..PageQuery::default()
        };
        list_my_reviews(&client, &page).await.unwrap();

        let call = backend.last_call();
        assert_eq!(call.path, "/trip/attraction/review/my");
        assert_eq!(call.params, params(&[("pageNum", "1")]));
    }

    #[tokio::test]
    async fn test_review_writes() {
        let backend = Arc::new(MockBackend::echo());
        let (client, _, _) = test_client(backend.clone(), Some("tok1"));
        let body = json!({"content": "Great view", "rating": 5});

        post_review(&client, 7, &body).await.unwrap();
        let call = backend.last_call();
        assert_eq!(call.method, Method::Post);
        assert_eq!(call.path, "/trip/attraction/7/review");
        assert_eq!(call.body, Some(body.clone()));

        update_review(&client, 31, &body).await.unwrap();
        let call = backend.last_call();
        assert_eq!(call.method, Method::Put);
        assert_eq!(call.path, "/trip/attraction/review/31");

        delete_review(&client, 31).await.unwrap();
        let call = backend.last_call();
        assert_eq!(call.method, Method::Delete);
        assert_eq!(call.path, "/trip/attraction/review/31");
        assert_eq!(call.body, None);
    }
}
