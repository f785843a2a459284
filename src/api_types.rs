use serde::{Deserialize, Serialize};

/* Custom Search JSON API */

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSearchResponse {
    #[serde(default)]
    pub items: Vec<ApiSearchItem>, // absent when nothing matched
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSearchItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub snippet: String,
}

/* OpenAI-compatible chat completions */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String, // "system" | "user" | "assistant"
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}
