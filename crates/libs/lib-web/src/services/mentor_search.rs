//! # Mentor Search Service
//!
//! Two ways to find alumni mentors:
//!
//! - **Search**: the caller's profile, the query and every alumni profile go to the
//!   language model, which answers with a JSON array of user ids, best first. The
//!   first ten known ids are returned. When the model is not configured, fails, or
//!   answers with something unusable, the search falls back to case-insensitive
//!   substring matching over name, company, job title and skills.
//! - **Recommendations**: no model involved. Each alumnus scores one point per skill
//!   that overlaps one of the caller's interests (substring match in either
//!   direction); the five best are returned with the matching skills.

use crate::services::llm::LlmClient;
use lib_core::model::store::ProfileRepository;
use lib_core::{AppError, DbPool, Result};
use shared::dto::{
    MentorRecommendation, MentorSearchRequest, MentorSearchResponse, ProfileDto, SearchSource, UserRole,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const MAX_SEARCH_RESULTS: usize = 10;
pub const MAX_RECOMMENDATIONS: usize = 5;

const SYSTEM_PROMPT: &str = "You are the search and recommendation engine of IntelliConnect, \
a platform connecting students with alumni mentors. Rank the available alumni by relevance to \
the search query and to the student's interests, skills and goals. Consider career path \
alignment, skill matches and mentorship value.\n\
Return ONLY a JSON array of alumni IDs, most relevant first, at most 10. Example: [12, 4, 9]";

pub struct MentorSearchService {
    db: DbPool,
    llm: Arc<LlmClient>,
}

impl MentorSearchService {
    pub fn new(db: DbPool, llm: Arc<LlmClient>) -> Self {
        Self { db, llm }
    }

    #[instrument(skip(self, request), fields(query = %request.query))]
    pub async fn search(&self, user_id: i64, request: &MentorSearchRequest) -> Result<MentorSearchResponse> {
        let caller = self.caller_profile(user_id).await?;
        let alumni = self.alumni(user_id).await?;
        let candidates = filter_by_skill(alumni, request.skill.as_deref());

        if candidates.is_empty() {
            return Ok(MentorSearchResponse { results: Vec::new(), source: SearchSource::Text });
        }

        if self.llm.is_enabled() {
            let prompt = build_user_prompt(&caller, request, &candidates);
            match self.llm.complete(SYSTEM_PROMPT, &prompt).await {
                Ok(reply) => match parse_ranked_ids(&reply) {
                    Some(ids) => {
                        let results = pick_ranked(&candidates, &ids);
                        info!("[MENTORS] AI ranking returned {} results", results.len());
                        return Ok(MentorSearchResponse { results, source: SearchSource::Ai });
                    }
                    None => warn!("[MENTORS] Unusable AI reply, falling back to text search"),
                },
                Err(e) => warn!("[MENTORS] AI ranking failed, falling back to text search: {}", e),
            }
        }

        let results = text_match(&candidates, &request.query);
        info!("[MENTORS] Text search returned {} results", results.len());
        Ok(MentorSearchResponse { results, source: SearchSource::Text })
    }

    #[instrument(skip(self))]
    pub async fn recommend(&self, user_id: i64) -> Result<Vec<MentorRecommendation>> {
        let caller = self.caller_profile(user_id).await?;
        let alumni = self.alumni(user_id).await?;
        Ok(score_recommendations(&caller.interests, alumni))
    }

    async fn caller_profile(&self, user_id: i64) -> Result<ProfileDto> {
        ProfileRepository::find(&self.db, user_id)
            .await?
            .map(|profile| profile.to_dto())
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
    }

    async fn alumni(&self, user_id: i64) -> Result<Vec<ProfileDto>> {
        let profiles = ProfileRepository::list_by_role(&self.db, UserRole::Alumni, user_id).await?;
        Ok(profiles.iter().map(|profile| profile.to_dto()).collect())
    }
}

/// Keep alumni listing `skill` (case-insensitive). `None`, empty or `"all"` keeps everyone.
pub fn filter_by_skill(candidates: Vec<ProfileDto>, skill: Option<&str>) -> Vec<ProfileDto> {
    let skill = match skill.map(str::trim) {
        Some(s) if !s.is_empty() && !s.eq_ignore_ascii_case("all") => s.to_lowercase(),
        _ => return candidates,
    };

    candidates
        .into_iter()
        .filter(|profile| profile.skills.iter().any(|s| s.to_lowercase() == skill))
        .collect()
}

/// Fallback search. An empty query matches everyone.
pub fn text_match(candidates: &[ProfileDto], query: &str) -> Vec<ProfileDto> {
    let needle = query.trim().to_lowercase();
    let contains = |field: Option<&str>| field.is_some_and(|value| value.to_lowercase().contains(&needle));

    candidates
        .iter()
        .filter(|profile| {
            needle.is_empty()
                || contains(Some(&profile.full_name))
                || contains(profile.company.as_deref())
                || contains(profile.job_title.as_deref())
                || profile.skills.iter().any(|skill| contains(Some(skill)))
        })
        .take(MAX_SEARCH_RESULTS)
        .cloned()
        .collect()
}

/// Extract the id array from a model reply.
///
/// Accepts code fences or prose around the array, and ids given as numbers or strings.
pub fn parse_ranked_ids(reply: &str) -> Option<Vec<i64>> {
    let start = reply.find('[')?;
    let end = reply.rfind(']')?;
    if end < start {
        return None;
    }

    let values: Vec<serde_json::Value> = serde_json::from_str(&reply[start..=end]).ok()?;
    let ids = values
        .iter()
        .filter_map(|value| match value {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .collect();
    Some(ids)
}

/// Map ranked ids back to candidates, skipping unknown and repeated ids.
fn pick_ranked(candidates: &[ProfileDto], ids: &[i64]) -> Vec<ProfileDto> {
    let mut seen = std::collections::HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(**id))
        .filter_map(|id| candidates.iter().find(|profile| profile.id == *id))
        .take(MAX_SEARCH_RESULTS)
        .cloned()
        .collect()
}

pub fn score_recommendations(interests: &[String], alumni: Vec<ProfileDto>) -> Vec<MentorRecommendation> {
    let interests: Vec<String> = interests.iter().map(|i| i.to_lowercase()).collect();

    let mut scored: Vec<MentorRecommendation> = alumni
        .into_iter()
        .map(|profile| {
            let matching_skills: Vec<String> = profile
                .skills
                .iter()
                .filter(|skill| {
                    let skill = skill.to_lowercase();
                    interests
                        .iter()
                        .any(|interest| interest.contains(&skill) || skill.contains(interest.as_str()))
                })
                .cloned()
                .collect();

            MentorRecommendation { match_score: matching_skills.len(), matching_skills, profile }
        })
        .collect();

    scored.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    scored.truncate(MAX_RECOMMENDATIONS);
    scored
}

fn build_user_prompt(caller: &ProfileDto, request: &MentorSearchRequest, candidates: &[ProfileDto]) -> String {
    let query = if request.query.trim().is_empty() { "Show me relevant alumni" } else { request.query.trim() };
    let skill_filter = request
        .skill
        .as_deref()
        .filter(|s| !s.eq_ignore_ascii_case("all"))
        .map(|skill| format!("Skill Filter: {}\n", skill))
        .unwrap_or_default();

    let alumni: String = candidates
        .iter()
        .enumerate()
        .map(|(index, alumnus)| {
            format!(
                "{}. ID: {}\n   Name: {}\n   Institution: {}\n   Company: {}\n   Position: {}\n   \
                 Skills: {}\n   Interests: {}\n   Bio: {}\n",
                index + 1,
                alumnus.id,
                alumnus.full_name,
                alumnus.institution,
                alumnus.company.as_deref().unwrap_or("N/A"),
                alumnus.job_title.as_deref().unwrap_or("N/A"),
                list_or_none(&alumnus.skills),
                list_or_none(&alumnus.interests),
                alumnus.bio.as_deref().unwrap_or("No bio"),
            )
        })
        .collect();

    format!(
        "Student Profile:\n- Name: {}\n- Institution: {}\n- Bio: {}\n- Interests: {}\n- Skills: {}\n\n\
         Search Query: \"{}\"\n{}\n\
         Available Alumni ({} results):\n{}",
        caller.full_name,
        caller.institution,
        caller.bio.as_deref().unwrap_or("No bio"),
        list_or_none(&caller.interests),
        list_or_none(&caller.skills),
        query,
        skill_filter,
        candidates.len(),
        alumni,
    )
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use lib_core::config::LlmConfig;
    use lib_core::model::store::{ProfileForCreate, UserRepository};
    use lib_core::create_memory_pool;
    use shared::dto::ProfileUpdateRequest;

    fn alumnus(id: i64, name: &str, company: &str, skills: &[&str]) -> ProfileDto {
        ProfileDto {
            id,
            full_name: name.to_string(),
            institution: "State University".to_string(),
            role: UserRole::Alumni,
            bio: None,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            interests: Vec::new(),
            company: Some(company.to_string()),
            job_title: Some("Engineer".to_string()),
        }
    }

    #[test]
    fn test_parse_ranked_ids_variants() {
        assert_eq!(parse_ranked_ids("[3, 1, 2]"), Some(vec![3, 1, 2]));
        assert_eq!(parse_ranked_ids("```json\n[\"7\", \"4\"]\n```"), Some(vec![7, 4]));
        assert_eq!(parse_ranked_ids("Here you go: [5]. Good luck!"), Some(vec![5]));
        assert_eq!(parse_ranked_ids("no ids today"), None);
        assert_eq!(parse_ranked_ids("[1, 2"), None);
    }

    #[test]
    fn test_user_prompt_lists_caller_and_candidates() {
        let mut caller = alumnus(9, "Ada Lovelace", "Analytical Engines", &[]);
        caller.role = UserRole::Student;
        caller.interests = vec!["compilers".to_string()];
        let candidates = vec![alumnus(1, "Grace Hopper", "Navy", &["COBOL", "Compilers"])];
        let request = MentorSearchRequest {
            query: "  ".to_string(),
            skill: Some("COBOL".to_string()),
        };

        let prompt = build_user_prompt(&caller, &request, &candidates);

        assert!(prompt.starts_with("Student Profile:\n- Name: Ada Lovelace\n"));
        assert!(prompt.contains("- Interests: compilers\n- Skills: None\n\nSearch Query: \"Show me relevant alumni\"\n"));
        assert!(prompt.contains("Skill Filter: COBOL\n\nAvailable Alumni (1 results):\n1. ID: 1\n"));
        assert!(prompt.contains("   Skills: COBOL, Compilers\n   Interests: None\n   Bio: No bio\n"));

        let all = MentorSearchRequest { query: "rust".to_string(), skill: Some("all".to_string()) };
        assert!(!build_user_prompt(&caller, &all, &candidates).contains("Skill Filter"));
    }

    #[test]
    fn test_pick_ranked_skips_unknown_and_repeats() {
        let candidates = vec![alumnus(1, "Grace", "Navy", &[]), alumnus(2, "Alan", "NPL", &[])];
        let picked = pick_ranked(&candidates, &[2, 99, 2, 1]);
        let ids: Vec<i64> = picked.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_text_match_fields() {
        let candidates = vec![
            alumnus(1, "Grace Hopper", "Navy", &["COBOL"]),
            alumnus(2, "Alan Turing", "NPL", &["Cryptography"]),
        ];

        let by_skill: Vec<i64> = text_match(&candidates, "crypto").iter().map(|p| p.id).collect();
        assert_eq!(by_skill, vec![2]);

        let by_company: Vec<i64> = text_match(&candidates, "NAVY").iter().map(|p| p.id).collect();
        assert_eq!(by_company, vec![1]);

        assert_eq!(text_match(&candidates, "  ").len(), 2);
        assert!(text_match(&candidates, "haskell").is_empty());
    }

    #[test]
    fn test_filter_by_skill() {
        let candidates = vec![
            alumnus(1, "Grace", "Navy", &["COBOL"]),
            alumnus(2, "Alan", "NPL", &["Cryptography"]),
        ];

        assert_eq!(filter_by_skill(candidates.clone(), Some("all")).len(), 2);
        assert_eq!(filter_by_skill(candidates.clone(), None).len(), 2);

        let filtered = filter_by_skill(candidates, Some("cobol"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 1);
    }

    #[test]
    fn test_score_recommendations() {
        let interests = vec!["Machine Learning".to_string(), "rust".to_string()];
        let alumni = vec![
            alumnus(1, "A", "X", &["COBOL"]),
            alumnus(2, "B", "Y", &["Rust", "Learning", "Go"]),
            alumnus(3, "C", "Z", &["Rust programming"]),
        ];

        let recs = score_recommendations(&interests, alumni);
        assert_eq!(recs[0].profile.id, 2);
        assert_eq!(recs[0].match_score, 2);
        assert_eq!(recs[0].matching_skills, vec!["Rust".to_string(), "Learning".to_string()]);
        assert_eq!(recs[1].profile.id, 3);
        assert_eq!(recs[2].match_score, 0);
    }

    async fn seed(pool: &DbPool, email: &str, name: &str, role: UserRole, update: ProfileUpdateRequest) -> i64 {
        let user = UserRepository::create(pool, email, "hash").await.unwrap();
        let create = ProfileForCreate { full_name: name.to_string(), institution: "State".to_string(), role };
        ProfileRepository::create(pool, user.id, &create).await.unwrap();
        ProfileRepository::update(pool, user.id, &update).await.unwrap();
        user.id
    }

    async fn seeded_pool() -> (DbPool, i64, i64, i64) {
        let pool = create_memory_pool().await.unwrap();
        let student = seed(&pool, "s@uni.edu", "Sam", UserRole::Student, ProfileUpdateRequest {
            interests: Some(vec!["rust".to_string()]),
            ..Default::default()
        })
        .await;
        let grace = seed(&pool, "g@corp.com", "Grace", UserRole::Alumni, ProfileUpdateRequest {
            skills: Some(vec!["COBOL".to_string()]),
            company: Some("Navy".to_string()),
            ..Default::default()
        })
        .await;
        let ferris = seed(&pool, "f@corp.com", "Ferris", UserRole::Alumni, ProfileUpdateRequest {
            skills: Some(vec!["Rust".to_string()]),
            ..Default::default()
        })
        .await;
        (pool, student, grace, ferris)
    }

    #[tokio::test]
    async fn test_search_falls_back_without_llm() {
        let (pool, student, grace, _) = seeded_pool().await;
        let llm = Arc::new(LlmClient::new(LlmConfig::default()).unwrap());
        let service = MentorSearchService::new(pool, llm);

        let request = MentorSearchRequest { query: "navy".to_string(), skill: None };
        let response = service.search(student, &request).await.unwrap();

        assert_eq!(response.source, SearchSource::Text);
        let ids: Vec<i64> = response.results.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![grace]);
    }

    #[tokio::test]
    async fn test_search_uses_llm_ranking() {
        let (pool, student, grace, ferris) = seeded_pool().await;

        let reply = format!("[{}, {}]", ferris, grace);
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move || {
                let reply = reply.clone();
                async move { Json(serde_json::json!({"choices": [{"message": {"content": reply}}]})) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let llm = Arc::new(
            LlmClient::new(LlmConfig {
                api_url: Some(format!("http://{}/v1/chat/completions", addr)),
                api_key: Some("test-key".to_string()),
                model: "test-model".to_string(),
            })
            .unwrap(),
        );
        let service = MentorSearchService::new(pool, llm);

        let response = service.search(student, &MentorSearchRequest::default()).await.unwrap();
        assert_eq!(response.source, SearchSource::Ai);
        let ids: Vec<i64> = response.results.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![ferris, grace]);
    }

    #[tokio::test]
    async fn test_recommendations_rank_by_overlap() {
        let (pool, student, grace, ferris) = seeded_pool().await;
        let llm = Arc::new(LlmClient::new(LlmConfig::default()).unwrap());
        let service = MentorSearchService::new(pool, llm);

        let recs = service.recommend(student).await.unwrap();
        let ids: Vec<i64> = recs.iter().map(|r| r.profile.id).collect();
        assert_eq!(ids, vec![ferris, grace]);
        assert_eq!(recs[0].matching_skills, vec!["Rust".to_string()]);
    }
}
