//! # Mentor Search Data Transfer Objects

use serde::{Deserialize, Serialize};

use super::profiles::ProfileDto;

/// Body of `POST /api/mentors/search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MentorSearchRequest {
    #[serde(default)]
    pub query: String,
    /// Restrict to alumni listing this skill. `"all"` or absent means no filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
}

/// How a search result list was ranked.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchSource {
    /// Ranked by the language model.
    Ai,
    /// Plain case-insensitive text matching.
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorSearchResponse {
    pub results: Vec<ProfileDto>,
    pub source: SearchSource,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MentorRecommendation {
    pub profile: ProfileDto,
    pub match_score: usize,
    pub matching_skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorRecommendationsResponse {
    pub recommendations: Vec<MentorRecommendation>,
}
