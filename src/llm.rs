use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use tracing::{debug, info};

use crate::api_types::{ChatMessage, ChatRequest, ChatResponse};
use crate::config::LlmConfig;

pub async fn llm_call(client: &Client, cfg: &LlmConfig, system: &str, user: &str) -> Result<String> {
    let start = std::time::Instant::now();

    debug!("LLM call starting - prompt_length={} chars", user.len());

    let url = format!("{}/chat/completions", cfg.api_base.trim_end_matches('/'));
    let body = ChatRequest {
        model: &cfg.model,
        messages: vec![
            ChatMessage { role: "system".into(), content: system.to_string() },
            ChatMessage { role: "user".into(), content: user.to_string() },
        ],
        temperature: 0.0,
    };

    let mut req = client.post(&url).json(&body).timeout(cfg.timeout());
    if let Some(key) = cfg.api_key.as_deref() {
        req = req.bearer_auth(key);
    }

    let resp: ChatResponse = req
        .send()
        .await
        .with_context(|| format!("Request failed for {}", url))?
        .error_for_status()
        .with_context(|| format!("HTTP error for {}", url))?
        .json()
        .await
        .with_context(|| format!("Decoding JSON for {}", url))?;

    let answer = resp
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| anyhow!("LLM returned no choices"))?;

    info!(
        "LLM API call completed - duration={:.2}s, response_length={} chars",
        start.elapsed().as_secs_f32(),
        answer.len()
    );

    Ok(answer)
}

/// Models like to wrap JSON in ```json fences; strip them.
pub fn strip_code_fences(answer: &str) -> &str {
    let t = answer.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
