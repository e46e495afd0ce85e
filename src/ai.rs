use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::AiConfig;

pub const GENRE_KEYWORDS: &[&str] = &[
    "horror",
    "action",
    "comedy",
    "drama",
    "thriller",
    "sci-fi",
    "animation",
];

const STOPWORDS: &[&str] = &[
    "this", "that", "with", "from", "what", "when", "where", "film", "movie",
];

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("AI provider rejected the request ({0})")]
    Rejected(u16),
    #[error("AI response had no content")]
    Empty,
}

/// Chat-completions client for an OpenAI-compatible endpoint.
pub struct AiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl AiClient {
    pub fn new(config: &AiConfig) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    pub async fn recommendations(&self, question: &str) -> Result<String, AiError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a movie recommendation assistant. Suggest movies with short reasons.",
                },
                { "role": "user", "content": question },
            ],
        });

        debug!(%question, "Requesting AI recommendations");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AiError::Rejected(status.as_u16()));
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(AiError::Empty)
    }
}

/// Pulls searchable keywords out of free-form AI prose: markdown stripped,
/// short words and filler dropped.
pub fn extract_keywords(response: &str) -> Vec<String> {
    response
        .split(|c: char| !c.is_alphanumeric() && c != '-' && c != '*')
        .map(|w| w.replace('*', ""))
        .map(|w| w.trim().to_string())
        .filter(|w| w.len() > 3)
        .filter(|w| !STOPWORDS.contains(&w.to_lowercase().as_str()))
        .collect()
}

/// Keywords that name a known genre, for the genre-match fallback.
pub fn matched_genres(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .filter(|k| {
            GENRE_KEYWORDS
                .iter()
                .any(|g| k.to_lowercase().contains(g))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_drop_short_words_and_fillers() {
        let keywords = extract_keywords("Watch this movie: The Shining, a horror film from 1980");
        assert!(keywords.contains(&"Shining".to_string()));
        assert!(keywords.contains(&"horror".to_string()));
        assert!(!keywords.contains(&"this".to_string()));
        assert!(!keywords.contains(&"movie".to_string()));
        assert!(!keywords.contains(&"The".to_string()));
    }

    #[test]
    fn markdown_emphasis_is_stripped() {
        let keywords = extract_keywords("I recommend **Inception** and *Interstellar*");
        assert!(keywords.contains(&"Inception".to_string()));
        assert!(keywords.contains(&"Interstellar".to_string()));
    }

    #[test]
    fn genre_matching_is_case_insensitive() {
        let keywords = vec!["Horror".to_string(), "Inception".to_string()];
        let genres = matched_genres(&keywords);
        assert_eq!(genres, vec!["Horror".to_string()]);
    }
}
