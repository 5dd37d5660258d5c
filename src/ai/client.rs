use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::{AiError, Result};
use super::parse::{parse_ai_response, parse_comparison_response, ProgressComparison, RoomAnalysis};
use super::prompt::{self, AnalysisContext};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            temperature: 0.7,
            max_output_tokens: 2048,
            timeout_secs: 60,
        }
    }
}

impl AiConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// An image ready to be sent inline
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub mime_type: String,
    /// Base64, standard alphabet
    pub data: String,
}

impl ImagePayload {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        ImagePayload {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::from_bytes(&bytes, mime_for_path(path)))
    }

    fn to_part(&self) -> Value {
        json!({
            "inline_data": {
                "mime_type": self.mime_type,
                "data": self.data
            }
        })
    }
}

pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => "image/jpeg",
    }
}

pub struct GeminiClient {
    config: AiConfig,
    http_client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: AiConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_http_client(config, http_client))
    }

    pub fn with_http_client(config: AiConfig, http_client: reqwest::Client) -> Self {
        GeminiClient { config, http_client }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    pub fn build_request_body(&self, parts: Vec<Value>) -> Value {
        json!({
            "contents": [{ "parts": parts }],
            "generationConfig": {
                "temperature": self.config.temperature,
                "maxOutputTokens": self.config.max_output_tokens
            }
        })
    }

    /// Send one generateContent request and return the reply text
    pub async fn generate(&self, parts: Vec<Value>) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(AiError::MissingApiKey)?;

        let request_body = self.build_request_body(parts);
        tracing::debug!("POST {} (model {})", self.endpoint(), self.config.model);

        let response = self
            .http_client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = extract_error_message(&error_text, status.as_u16());
            tracing::warn!("AI request failed ({}): {}", status.as_u16(), message);
            return Err(AiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let response_json: Value = response.json().await?;
        extract_text(&response_json)
    }

    pub async fn analyze_room(
        &self,
        image: &ImagePayload,
        context: &AnalysisContext,
    ) -> Result<RoomAnalysis> {
        let parts = vec![
            json!({ "text": prompt::SYSTEM_PROMPT }),
            json!({ "text": prompt::room_analysis_prompt(context) }),
            image.to_part(),
        ];
        let text = self.generate(parts).await?;
        let analysis = parse_ai_response(&text);
        tracing::info!(
            "Room analysis: mess level {}, {} tasks{}",
            analysis.mess_level,
            analysis.tasks.len(),
            if analysis.used_fallback { " (fallback)" } else { "" }
        );
        Ok(analysis)
    }

    pub async fn compare_progress(
        &self,
        before: &ImagePayload,
        after: &ImagePayload,
        context: &AnalysisContext,
    ) -> Result<ProgressComparison> {
        let parts = vec![
            json!({ "text": prompt::COMPARISON_SYSTEM_PROMPT }),
            json!({ "text": prompt::comparison_prompt(context) }),
            before.to_part(),
            after.to_part(),
        ];
        let text = self.generate(parts).await?;
        Ok(parse_comparison_response(&text))
    }

    pub async fn motivation(&self, context: &str) -> Result<String> {
        let text = self
            .generate(vec![json!({ "text": prompt::motivation_prompt(context) })])
            .await?;
        let line = text.trim().trim_matches('"').trim().to_string();
        if line.is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(line)
    }
}

/// Concatenated text of the first candidate
pub fn extract_text(response: &Value) -> Result<String> {
    let candidate = response
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first());

    let Some(candidate) = candidate else {
        if let Some(reason) = response
            .get("promptFeedback")
            .and_then(|f| f.get("blockReason"))
            .and_then(|r| r.as_str())
        {
            return Err(AiError::Blocked(reason.to_string()));
        }
        return Err(AiError::EmptyResponse);
    };

    let text: String = candidate["content"]["parts"]
        .as_array()
        .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AiError::EmptyResponse);
    }
    Ok(text)
}

/// Provider's `error.message`, or a generic line with the status code
pub fn extract_error_message(body: &str, status: u16) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("API request failed with status {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn test_config(base_url: String) -> AiConfig {
        AiConfig {
            base_url,
            api_key: Some("test-key".to_string()),
            ..AiConfig::default()
        }
    }

    fn test_client(base_url: String) -> GeminiClient {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        GeminiClient::with_http_client(test_config(base_url), http)
    }

    /// Serve one canned response and hand back the raw request
    async fn stub_server(status_line: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    #[test]
    fn test_request_body_shape() {
        let client = GeminiClient::new(AiConfig::default()).unwrap();
        let image = ImagePayload::from_bytes(b"abc", "image/png");
        let body = client.build_request_body(vec![json!({"text": "hi"}), image.to_part()]);

        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(body["contents"][0]["parts"][1]["inline_data"]["data"], "YWJj");
        assert_eq!(body["contents"][0]["parts"][1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_mime_guess() {
        assert_eq!(mime_for_path(Path::new("a/b.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("photo.jpg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("noext")), "image/jpeg");
    }

    #[test]
    fn test_extract_text_variants() {
        let ok = json!({"candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": "1}"}]}}]});
        assert_eq!(extract_text(&ok).unwrap(), "{\"a\":1}");

        let blocked = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        assert!(matches!(extract_text(&blocked), Err(AiError::Blocked(r)) if r == "SAFETY"));

        let empty = json!({"candidates": [{"content": {"parts": []}}]});
        assert!(matches!(extract_text(&empty), Err(AiError::EmptyResponse)));
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid"}}"#;
        assert_eq!(extract_error_message(body, 400), "API key not valid");
        assert_eq!(
            extract_error_message("<html>oops</html>", 502),
            "API request failed with status 502"
        );
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let client = GeminiClient::new(AiConfig::default()).unwrap();
        let image = ImagePayload::from_bytes(b"img", "image/jpeg");
        let err = client
            .analyze_room(&image, &AnalysisContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_analyze_room_against_stub() {
        let reply = json!({
            "candidates": [{
                "content": {"parts": [{
                    "text": "```json\n{\"messLevel\": 64, \"summary\": \"Cluttered desk\", \"tasks\": [{\"title\": \"Clear the desk\", \"estimatedMinutes\": 10}]}\n```"
                }]}
            }]
        });
        let (base_url, server) = stub_server("200 OK", reply.to_string()).await;
        let client = test_client(base_url);

        let image = ImagePayload::from_bytes(b"img", "image/jpeg");
        let analysis = client
            .analyze_room(&image, &AnalysisContext::default())
            .await
            .unwrap();
        assert_eq!(analysis.mess_level, 64);
        assert_eq!(analysis.tasks[0].title, "Clear the desk");
        assert!(!analysis.used_fallback);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1beta/models/gemini-1.5-flash:generateContent?key=test-key"));
        assert!(request.contains("\"inline_data\""));
    }

    #[tokio::test]
    async fn test_compare_progress_against_stub() {
        let reply = json!({
            "candidates": [{
                "content": {"parts": [{
                    "text": "{\"progressPercentage\": \"80%\", \"messLevelAfter\": 20, \"improvements\": [\"Floor is clear\"], \"remainingIssues\": [\"Shelf still full\"], \"encouragement\": \"Huge change!\"}"
                }]}
            }]
        });
        let (base_url, server) = stub_server("200 OK", reply.to_string()).await;
        let client = test_client(base_url);

        let before = ImagePayload::from_bytes(b"before", "image/jpeg");
        let after = ImagePayload::from_bytes(b"after", "image/png");
        let context = AnalysisContext {
            room_name: Some("Garage".to_string()),
            ..AnalysisContext::default()
        };
        let comparison = client.compare_progress(&before, &after, &context).await.unwrap();

        assert_eq!(comparison.progress_percentage, 80);
        assert_eq!(comparison.mess_level_after, Some(20));
        assert_eq!(comparison.improvements, vec!["Floor is clear".to_string()]);
        assert_eq!(comparison.remaining_issues, vec!["Shelf still full".to_string()]);
        assert_eq!(comparison.encouragement, "Huge change!");
        assert!(!comparison.used_fallback);

        let request = server.await.unwrap();
        assert_eq!(request.matches("\"inline_data\"").count(), 2);
        assert!(request.contains("image/png"));
        assert!(request.contains("Garage"));
    }

    #[tokio::test]
    async fn test_http_error_uses_provider_message() {
        let body = r#"{"error": {"code": 403, "message": "Permission denied"}}"#.to_string();
        let (base_url, server) = stub_server("403 Forbidden", body).await;
        let client = test_client(base_url);

        let err = client.motivation("kitchen").await.unwrap_err();
        match err {
            AiError::Http { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Permission denied");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!AiError::Http { status: 403, message: String::new() }.is_retryable());
        server.await.unwrap();
    }
}
