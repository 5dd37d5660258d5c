use rand::seq::SliceRandom;

use super::client::GeminiClient;

pub static QUOTES: &[&str] = &[
    "Progress, not perfection.",
    "One small step is still a step forward.",
    "You don't have to do it all today. Just start.",
    "Clear space, clear mind.",
    "Five minutes now is a gift to future you.",
    "Every item put away is a tiny win.",
    "Done is better than perfect.",
    "Start with what's right in front of you.",
    "You've handled harder things than this.",
    "Little by little, the room gets lighter.",
    "Your space doesn't define you, but caring for it helps you.",
    "Celebrate the small wins. They add up.",
];

pub fn random_quote() -> &'static str {
    QUOTES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Progress, not perfection.")
}

/// A motivating line from the AI, or a stock quote when that isn't possible
pub async fn get_motivation(client: Option<&GeminiClient>, context: &str) -> String {
    let Some(client) = client.filter(|c| c.config().has_api_key()) else {
        return random_quote().to_string();
    };

    match client.motivation(context).await {
        Ok(line) => line,
        Err(e) => {
            tracing::warn!("Motivation request failed, using a quote: {}", e);
            random_quote().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiConfig;

    #[test]
    fn test_random_quote_from_list() {
        for _ in 0..20 {
            assert!(QUOTES.contains(&random_quote()));
        }
    }

    #[tokio::test]
    async fn test_no_client_gives_quote() {
        let line = get_motivation(None, "bedroom").await;
        assert!(QUOTES.contains(&line.as_str()));
    }

    #[tokio::test]
    async fn test_client_without_key_gives_quote() {
        let client = GeminiClient::new(AiConfig::default()).unwrap();
        let line = get_motivation(Some(&client), "bedroom").await;
        assert!(QUOTES.contains(&line.as_str()));
    }

    #[tokio::test]
    async fn test_unreachable_provider_gives_quote() {
        let config = AiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: Some("key".to_string()),
            timeout_secs: 2,
            ..AiConfig::default()
        };
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        let client = GeminiClient::with_http_client(config, http);
        let line = get_motivation(Some(&client), "garage").await;
        assert!(QUOTES.contains(&line.as_str()));
    }
}
