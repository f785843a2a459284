use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};
use url::Url;
use xxhash_rust::xxh3::xxh3_64;

use crate::api_types::*;
use crate::config::{EnrichmentConfig, SearchConfig};
use crate::models::*;

pub fn make_article_id(url: Option<&str>, title: &str) -> String {
    format!("{:016x}", xxh3_64(format!("{}|{}", url.unwrap_or(""), title).as_bytes()))
}

/// Maps raw search items to articles, keeping at most `limit`.
pub fn articles_from_response(resp: ApiSearchResponse, limit: usize) -> Vec<Article> {
    resp.items
        .into_iter()
        .take(limit)
        .map(|it| {
            let url = it.link.filter(|l| !l.trim().is_empty());
            Article {
                id: make_article_id(url.as_deref(), &it.title),
                title: it.title,
                url,
                snippet: it.snippet,
                body_text: String::new(),
            }
        })
        .collect()
}

/// One search request, single attempt, bounded by the configured timeout.
pub async fn search_articles(client: &Client, cfg: &SearchConfig, query: &str) -> Result<Vec<Article>> {
    let start = std::time::Instant::now();

    let (Some(key), Some(cx)) = (cfg.api_key.as_deref(), cfg.cx.as_deref()) else {
        bail!(
            "search credentials missing (set {} and {} or search.api_key/search.cx)",
            crate::config::ENV_SEARCH_API_KEY,
            crate::config::ENV_SEARCH_CX
        );
    };

    debug!("Search request - endpoint={}, query={:?}, num={}", cfg.endpoint, query, cfg.num_results);

    let num = cfg.num_results.to_string();
    let resp = client
        .get(&cfg.endpoint)
        .query(&[("key", key), ("cx", cx), ("q", query), ("num", num.as_str())])
        .timeout(cfg.timeout())
        .send()
        .await
        .with_context(|| format!("Request failed for {}", cfg.endpoint))?;

    let resp = resp
        .error_for_status()
        .with_context(|| format!("HTTP error for {}", cfg.endpoint))?;

    let api: ApiSearchResponse = resp
        .json()
        .await
        .with_context(|| format!("Decoding JSON for {}", cfg.endpoint))?;

    let articles = articles_from_response(api, cfg.num_results as usize);
    info!(
        "Search completed - duration={:.2}s, results={}",
        start.elapsed().as_secs_f32(),
        articles.len()
    );
    Ok(articles)
}

fn text_content(elem: ElementRef<'_>) -> String {
    elem.text().collect::<Vec<_>>().join(" ")
}

fn compact_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Paragraph and list text of the page's `article`, `main` or `body`, in that preference.
pub fn extract_body_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let root = ["article", "main", "body"].iter().find_map(|tag| {
        Selector::parse(tag)
            .ok()
            .and_then(|sel| document.select(&sel).next())
    });
    let Some(root) = root else {
        return String::new();
    };
    let Ok(block_sel) = Selector::parse("p, li") else {
        return String::new();
    };

    root.select(&block_sel)
        .map(|e| compact_ws(&text_content(e)))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

async fn try_fetch_body(client: &Client, link: &str, cfg: &EnrichmentConfig) -> Result<String> {
    let url = Url::parse(link).with_context(|| format!("invalid link {}", link))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!("unsupported scheme {}", url.scheme()));
    }
    let resp = client
        .get(url)
        .header(reqwest::header::USER_AGENT, &cfg.user_agent)
        .timeout(cfg.timeout())
        .send()
        .await
        .with_context(|| format!("Request failed for {}", link))?
        .error_for_status()
        .with_context(|| format!("HTTP error for {}", link))?;
    let html = resp.text().await.with_context(|| format!("Reading body of {}", link))?;
    Ok(extract_body_text(&html))
}

/// Best effort: any failure yields an empty string.
pub async fn fetch_body_text(client: &Client, link: &str, cfg: &EnrichmentConfig) -> String {
    match try_fetch_body(client, link, cfg).await {
        Ok(text) => {
            debug!("Enrichment fetched - url={}, chars={}", link, text.len());
            text
        }
        Err(e) => {
            debug!("Enrichment skipped - url={}, reason={:#}", link, e);
            String::new()
        }
    }
}

/// Fetches body text for every article with a link, concurrently.
pub async fn enrich_articles(client: &Client, mut articles: Vec<Article>, cfg: &EnrichmentConfig) -> Vec<Article> {
    let start = std::time::Instant::now();
    let tasks = articles.iter().map(|a| async move {
        match a.url.as_deref() {
            Some(link) => fetch_body_text(client, link, cfg).await,
            None => String::new(),
        }
    });
    let bodies = futures::future::join_all(tasks).await;

    let mut enriched = 0usize;
    for (a, body) in articles.iter_mut().zip(bodies) {
        if !body.is_empty() {
            enriched += 1;
        }
        a.body_text = body;
    }
    info!(
        "Enrichment completed - duration={:.2}s, enriched={}/{}",
        start.elapsed().as_secs_f32(),
        enriched,
        articles.len()
    );
    articles
}

pub fn normalize_articles(mut articles: Vec<Article>) -> Vec<Article> {
    for a in articles.iter_mut() {
        a.title = a.title.trim().to_string();
        a.snippet = a.snippet.trim().to_string();
    }
    articles
}
