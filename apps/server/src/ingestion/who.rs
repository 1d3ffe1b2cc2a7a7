//! WHO ICD-11 API source
//!
//! Authenticates with OAuth2 client credentials, then walks the TM2 root and
//! the MMS root breadth first along `child` links. Every network or decoding
//! failure is a dependency error and fails the sync.

use super::{ensure_not_cancelled, Icd11Source, ProgressSink};
use crate::config::WhoApiConfig;
use crate::models::{Icd11CodeType, NewIcd11Code};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;

const TOKEN_SCOPE: &str = "icdapi_access";
const API_VERSION: &str = "v2";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

fn dependency(context: &str, err: impl std::fmt::Display) -> Error {
    Error::Dependency(format!("{context}: {err}"))
}

/// Last path segment of an entity URI
fn last_segment(uri: &str) -> &str {
    uri.trim_end_matches('/').rsplit('/').next().unwrap_or(uri)
}

fn language_value(node: &Value, field: &str) -> Option<String> {
    node.get(field)
        .and_then(|v| v.get("@value"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Convert one entity; entities without a title are skipped
fn entity_to_code(
    node: &Value,
    code_type: Icd11CodeType,
    parent: Option<&str>,
    chapter: Option<&str>,
) -> Option<NewIcd11Code> {
    let id = node.get("@id").and_then(Value::as_str)?;
    let code = node
        .get("code")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| last_segment(id));
    let title = language_value(node, "title")?;

    let mut input = NewIcd11Code::new(code_type, code, title);
    input.definition = language_value(node, "definition");
    input.foundation_uri = node
        .get("foundationReference")
        .and_then(Value::as_str)
        .map(str::to_string);
    input.linearization_uri = Some(id.to_string());
    input.parent = parent.map(str::to_string);
    input.chapter = chapter.map(str::to_string);
    Some(input)
}

/// `child` entries are URLs in API v2; inline objects are accepted as well
enum Child {
    Url(String),
    Inline(Value),
}

fn children(node: &Value) -> Vec<Child> {
    node.get("child")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|c| match c {
                    Value::String(url) => Some(Child::Url(url.clone())),
                    Value::Object(_) => Some(Child::Inline(c.clone())),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

pub struct WhoIcd11Source {
    client: Client,
    config: WhoApiConfig,
}

impl WhoIcd11Source {
    pub fn new(config: WhoApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| dependency("building HTTP client", e))?;
        Ok(Self { client, config })
    }

    fn tm2_root(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.tm2_path.trim_start_matches('/')
        )
    }

    async fn token(&self) -> Result<String> {
        let (Some(id), Some(secret)) = (&self.config.client_id, &self.config.client_secret) else {
            return Err(Error::Dependency(
                "WHO API client id and secret are not configured".to_string(),
            ));
        };
        let response = self
            .client
            .post(&self.config.token_url)
            .basic_auth(id, Some(secret))
            .form(&[("grant_type", "client_credentials"), ("scope", TOKEN_SCOPE)])
            .send()
            .await
            .map_err(|e| dependency("requesting WHO API token", e))?;
        if !response.status().is_success() {
            return Err(Error::Dependency(format!(
                "WHO token endpoint returned {}",
                response.status()
            )));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| dependency("decoding WHO API token", e))?;
        Ok(token.access_token)
    }

    async fn entity(&self, url: &str, token: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .header(ACCEPT_LANGUAGE, &self.config.language)
            .header("API-Version", API_VERSION)
            .send()
            .await
            .map_err(|e| dependency(url, e))?;
        if !response.status().is_success() {
            return Err(Error::Dependency(format!(
                "{url} returned {}",
                response.status()
            )));
        }
        response.json().await.map_err(|e| dependency(url, e))
    }

    /// Breadth-first walk below `root`, bounded by `max_entities`
    async fn walk(
        &self,
        root: &str,
        code_type: Icd11CodeType,
        token: &str,
        skip: &HashSet<String>,
        progress: &dyn ProgressSink,
        out: &mut Vec<NewIcd11Code>,
    ) -> Result<()> {
        let root_node = self.entity(root, token).await?;
        let mut queue: VecDeque<(Child, Option<String>, Option<String>)> = children(&root_node)
            .into_iter()
            .map(|c| (c, None, None))
            .collect();
        let mut visited: HashSet<String> = HashSet::new();
        let mut fetched = 0usize;

        while let Some((child, parent, chapter)) = queue.pop_front() {
            ensure_not_cancelled(progress)?;
            if fetched >= self.config.max_entities {
                tracing::warn!(root, max = self.config.max_entities, "Entity limit reached");
                break;
            }
            let node = match child {
                Child::Url(url) => {
                    if skip.contains(&url) || !visited.insert(url.clone()) {
                        continue;
                    }
                    self.entity(&url, token).await?
                }
                Child::Inline(node) => node,
            };
            fetched += 1;

            let Some(code) = entity_to_code(&node, code_type, parent.as_deref(), chapter.as_deref())
            else {
                continue;
            };
            let chapter = chapter.or_else(|| Some(code.code.clone()));
            for grandchild in children(&node) {
                queue.push_back((grandchild, Some(code.code.clone()), chapter.clone()));
            }
            out.push(code);
            progress.report(out.len() as u64, None);
        }
        Ok(())
    }
}

#[async_trait]
impl Icd11Source for WhoIcd11Source {
    fn describe(&self) -> String {
        format!("who-icd-api:{}", self.config.base_url)
    }

    #[tracing::instrument(skip(self, progress))]
    async fn fetch(&self, progress: &dyn ProgressSink) -> Result<Vec<NewIcd11Code>> {
        let token = self.token().await?;
        let tm2_root = self.tm2_root();
        let mut codes = Vec::new();

        self.walk(&tm2_root, Icd11CodeType::Tm2, &token, &HashSet::new(), progress, &mut codes)
            .await?;
        let tm2_count = codes.len();

        let skip: HashSet<String> = [tm2_root].into_iter().collect();
        self.walk(
            &self.config.base_url,
            Icd11CodeType::Biomedicine,
            &token,
            &skip,
            progress,
            &mut codes,
        )
        .await?;

        tracing::info!(
            tm2 = tm2_count,
            biomedicine = codes.len() - tm2_count,
            "Fetched ICD-11 entities from WHO API"
        );
        Ok(codes)
    }
}
