//! Community board endpoints: the free board and the notice board

use serde::Serialize;
use serde_json::Value;

use super::client::ApiClient;
use super::error::ApiError;
use super::transport::ApiRequest;
use crate::models::PageQuery;

// -- Free board --

pub async fn post_free_board(client: &ApiClient, post: &impl Serialize) -> Result<Value, ApiError> {
    client.send(ApiRequest::post("/freeboard").json(post)?).await
}

pub async fn update_free_board(
    client: &ApiClient,
    id: u64,
    post: &impl Serialize,
) -> Result<Value, ApiError> {
    client
        .send(ApiRequest::put(format!("/freeboard/{}", id)).json(post)?)
        .await
}

pub async fn delete_free_board(client: &ApiClient, id: u64) -> Result<Value, ApiError> {
    client.send(ApiRequest::delete(format!("/freeboard/{}", id))).await
}

pub async fn list_free_boards(client: &ApiClient, sort: Option<&str>) -> Result<Value, ApiError> {
    client
        .send(ApiRequest::get("/freeboard").param("sort", sort))
        .await
}

pub async fn get_free_board(client: &ApiClient, id: u64) -> Result<Value, ApiError> {
    client.send(ApiRequest::get(format!("/freeboard/{}", id))).await
}

/// Posts written by the signed-in user
pub async fn list_my_free_boards(
    client: &ApiClient,
    sort: Option<&str>,
) -> Result<Value, ApiError> {
    client
        .send(ApiRequest::get("/freeboard/my-post").param("sort", sort))
        .await
}

pub async fn list_free_board_comments(
    client: &ApiClient,
    id: u64,
    page: &PageQuery,
) -> Result<Value, ApiError> {
    let request = ApiRequest::get(format!("/freeboard/{}/comment", id))
        .param("pageNum", page.page_num)
        .param("pageSize", page.page_size)
        .param("sort", page.sort.as_deref());
    client.send(request).await
}

pub async fn post_free_board_comment(
    client: &ApiClient,
    id: u64,
    comment: &impl Serialize,
) -> Result<Value, ApiError> {
    client
        .send(ApiRequest::post(format!("/freeboard/{}/comment", id)).json(comment)?)
        .await
}

pub async fn update_free_board_comment(
    client: &ApiClient,
    comment_id: u64,
    comment: &impl Serialize,
) -> Result<Value, ApiError> {
    client
        .send(ApiRequest::put(format!("/freeboard/comment/{}", comment_id)).json(comment)?)
        .await
}

pub async fn delete_free_board_comment(
    client: &ApiClient,
    comment_id: u64,
) -> Result<Value, ApiError> {
    client
        .send(ApiRequest::delete(format!("/freeboard/comment/{}", comment_id)))
        .await
}

/// Whether the signed-in user likes the post, plus the like count
pub async fn get_free_board_like(client: &ApiClient, id: u64) -> Result<Value, ApiError> {
    client
        .send(ApiRequest::get(format!("/freeboard/{}/like", id)))
        .await
}

pub async fn like_free_board(client: &ApiClient, id: u64) -> Result<Value, ApiError> {
    client
        .send(ApiRequest::post(format!("/freeboard/{}/like", id)))
        .await
}

pub async fn unlike_free_board(client: &ApiClient, id: u64) -> Result<Value, ApiError> {
    client
        .send(ApiRequest::delete(format!("/freeboard/{}/like", id)))
        .await
}

// -- Notice board --

pub async fn list_notices(client: &ApiClient) -> Result<Value, ApiError> {
    client.send(ApiRequest::get("/notice")).await
}

pub async fn get_notice(client: &ApiClient, id: u64) -> Result<Value, ApiError> {
    client.send(ApiRequest::get(format!("/notice/{}", id))).await
}

pub async fn post_notice(client: &ApiClient, notice: &impl Serialize) -> Result<Value, ApiError> {
    client.send(ApiRequest::post("/notice").json(notice)?).await
}

pub async fn update_notice(
    client: &ApiClient,
    id: u64,
    notice: &impl Serialize,
) -> Result<Value, ApiError> {
    client
        .send(ApiRequest::put(format!("/notice/{}", id)).json(notice)?)
        .await
}

pub async fn delete_notice(client: &ApiClient, id: u64) -> Result<Value, ApiError> {
    client.send(ApiRequest::delete(format!("/notice/{}", id))).await
}

pub async fn list_notice_comments(
    client: &ApiClient,
    id: u64,
    page_no: Option<u32>,
) -> Result<Value, ApiError> {
    client
        .send(ApiRequest::get(format!("/notice/{}/comment", id)).param("pageNo", page_no))
        .await
}

pub async fn post_notice_comment(
    client: &ApiClient,
    id: u64,
    comment: &impl Serialize,
) -> Result<Value, ApiError> {
    client
        .send(ApiRequest::post(format!("/notice/{}/comment", id)).json(comment)?)
        .await
}

pub async fn update_notice_comment(
    client: &ApiClient,
    comment_id: u64,
    comment: &impl Serialize,
) -> Result<Value, ApiError> {
    client
        .send(ApiRequest::put(format!("/notice/comment/{}", comment_id)).json(comment)?)
        .await
}

pub async fn delete_notice_comment(client: &ApiClient, comment_id: u64) -> Result<Value, ApiError> {
    client
        .send(ApiRequest::delete(format!("/notice/comment/{}", comment_id)))
        .await
}

/// Notices written by the signed-in user
pub async fn list_my_notices(client: &ApiClient) -> Result<Value, ApiError> {
    client.send(ApiRequest::get("/notice/my-post")).await
}
