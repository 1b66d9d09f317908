//! # Mentor Handlers
//!
//! - `POST /api/mentors/search` - rank alumni for a free-text query
//! - `GET /api/mentors/recommendations` - alumni whose skills match the caller's interests

use crate::middleware::CurrentUser;
use crate::services::{LlmClient, MentorSearchService};
use axum::extract::{Json, State};
use lib_core::{DbPool, Result};
use shared::dto::{MentorRecommendationsResponse, MentorSearchRequest, MentorSearchResponse};
use std::sync::Arc;
use tracing::instrument;

#[instrument(skip(pool, llm, req), fields(user_id = user.id))]
pub async fn search_mentors(
    State(pool): State<DbPool>,
    State(llm): State<Arc<LlmClient>>,
    user: CurrentUser,
    Json(req): Json<MentorSearchRequest>,
) -> Result<Json<MentorSearchResponse>> {
    let service = MentorSearchService::new(pool, llm);
    service.search(user.id, &req).await.map(Json)
}

#[instrument(skip(pool, llm), fields(user_id = user.id))]
pub async fn recommend_mentors(
    State(pool): State<DbPool>,
    State(llm): State<Arc<LlmClient>>,
    user: CurrentUser,
) -> Result<Json<MentorRecommendationsResponse>> {
    let recommendations = MentorSearchService::new(pool, llm).recommend(user.id).await?;
    Ok(Json(MentorRecommendationsResponse { recommendations }))
}

#[cfg(test)]
mod tests {
    use crate::test_support::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use shared::dto::UserRole;

    #[tokio::test]
    async fn test_search_without_llm_uses_text_matching() {
        let app = TestApp::new().await;
        let (_, token) = app.user("ada@uni.edu", "Ada", UserRole::Student).await;
        let (grace, grace_token) = app.user("grace@corp.com", "Grace Hopper", UserRole::Alumni).await;
        app.user("alan@corp.com", "Alan Turing", UserRole::Alumni).await;
        app.send(Method::PUT, "/api/profiles/me", Some(&grace_token), Some(json!({"company": "US Navy"})))
            .await;

        let (status, body) = app
            .send(Method::POST, "/api/mentors/search", Some(&token), Some(json!({"query": "navy"})))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "text");
        assert_eq!(body["results"].as_array().unwrap().len(), 1);
        assert_eq!(body["results"][0]["id"], grace);
    }

    #[tokio::test]
    async fn test_recommendations_for_caller_interests() {
        let app = TestApp::new().await;
        let (_, token) = app.user("ada@uni.edu", "Ada", UserRole::Student).await;
        let (_, grace_token) = app.user("grace@corp.com", "Grace Hopper", UserRole::Alumni).await;
        app.send(Method::PUT, "/api/profiles/me", Some(&token), Some(json!({"interests": ["compilers"]})))
            .await;
        app.send(Method::PUT, "/api/profiles/me", Some(&grace_token), Some(json!({"skills": ["Compilers", "COBOL"]})))
            .await;

        let (status, body) = app.send(Method::GET, "/api/mentors/recommendations", Some(&token), None).await;

        assert_eq!(status, StatusCode::OK);
        let first = &body["recommendations"][0];
        assert_eq!(first["match_score"], 1);
        assert_eq!(first["matching_skills"], json!(["Compilers"]));
    }
}
