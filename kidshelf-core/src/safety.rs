//! AI safety assessment client
//!
//! One natural-language prompt per title, one JSON verdict back. The HTTP
//! client enforces a minimum inter-request delay and retries transient
//! failures (429/5xx) with Retry-After or capped exponential backoff; every
//! other failure mode is non-retryable and surfaces as a per-item error that
//! the assessment engine converts into "item skipped".

use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::Rng;
use serde::Deserialize;
use serde_json::json;

use crate::config::AssessmentConfig;
use crate::error::{Error, Result};
use crate::types::{AiAssessment, SafetyRating, StimulationLevel};

/// Everything the prompt needs about one title.
#[derive(Debug, Clone)]
pub struct SafetyRequest {
    pub title: String,
    pub year: String,
    pub synopsis: String,
    pub genres: Vec<String>,
    pub certification: Option<String>,
}

/// Assessment interface, mockable for tests and offline runs.
pub trait SafetyClient {
    fn assess(&self, request: &SafetyRequest) -> Result<AiAssessment>;
}

/// Lenient decode of the model's JSON verdict.
///
/// Every field is optional; missing or malformed fields fall back to
/// conservative defaults (Caution, 3..99, Medium) rather than failing the
/// item.
#[derive(Debug, Deserialize)]
struct VerdictPayload {
    rating: Option<String>,
    min_age: Option<f64>,
    max_age: Option<f64>,
    safe_above_age: Option<f64>,
    is_episodic_issue: Option<bool>,
    stimulation_level: Option<String>,
    has_lgbtq: Option<bool>,
    has_violence: Option<bool>,
    has_scary: Option<bool>,
    is_educational: Option<bool>,
    reasoning: Option<String>,
}

impl VerdictPayload {
    fn into_assessment(self) -> AiAssessment {
        AiAssessment {
            rating: self
                .rating
                .as_deref()
                .and_then(|r| r.parse().ok())
                .unwrap_or(SafetyRating::Caution),
            min_age: self.min_age.unwrap_or(3.0),
            max_age: self.max_age.unwrap_or(99.0),
            stimulation_level: self
                .stimulation_level
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(StimulationLevel::Medium),
            has_lgbtq: self.has_lgbtq.unwrap_or(false),
            has_violence: self.has_violence.unwrap_or(false),
            has_scary: self.has_scary.unwrap_or(false),
            is_educational: self.is_educational.unwrap_or(false),
            reasoning: self.reasoning.unwrap_or_default(),
            safe_above_age: self.safe_above_age,
            is_episodic_issue: self.is_episodic_issue.unwrap_or(false),
        }
    }
}

/// Parse the raw model text into a verdict, tolerating fenced or wrapped JSON.
pub fn parse_verdict(raw: &str) -> Result<AiAssessment> {
    let payload = match serde_json::from_str::<VerdictPayload>(raw) {
        Ok(payload) => payload,
        Err(_) => {
            let extracted = extract_json_object(raw)?;
            serde_json::from_str::<VerdictPayload>(&extracted)?
        }
    };
    Ok(payload.into_assessment())
}

fn extract_json_object(raw: &str) -> Result<String> {
    let start = raw
        .find('{')
        .ok_or_else(|| Error::Assessment("response did not contain a JSON object".to_string()))?;
    let end = raw
        .rfind('}')
        .ok_or_else(|| Error::Assessment("response did not contain a JSON object".to_string()))?;
    if end <= start {
        return Err(Error::Assessment(
            "response JSON bounds are invalid".to_string(),
        ));
    }
    Ok(raw[start..=end].to_string())
}

/// Compute one backoff delay in seconds.
///
/// A numeric Retry-After wins, capped at the ceiling. Otherwise exponential
/// backoff from `base` with the supplied jitter, capped at the same ceiling.
pub fn backoff_delay_secs(
    base: f64,
    ceiling: f64,
    attempt: usize,
    retry_after: Option<f64>,
    jitter: f64,
) -> f64 {
    if let Some(delay) = retry_after {
        return delay.min(ceiling);
    }
    let exponential = base * 2f64.powi(attempt as i32);
    (exponential + jitter).min(ceiling)
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// HTTP-backed safety client (Gemini generateContent API).
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    model: String,
    max_retries: usize,
    min_delay: Duration,
    backoff_base_secs: f64,
    max_backoff_secs: f64,
    last_request: Mutex<Option<Instant>>,
    runtime: tokio::runtime::Runtime,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: &AssessmentConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Assessment(format!("failed to build tokio runtime: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| Error::Assessment(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_retries: config.max_retries,
            min_delay: Duration::from_secs_f64(config.min_delay_secs.max(0.0)),
            backoff_base_secs: config.backoff_base_secs,
            max_backoff_secs: config.max_backoff_secs,
            last_request: Mutex::new(None),
            runtime,
            http,
        })
    }

    /// Enforce the minimum delay between requests (client-side rate shaping,
    /// applied regardless of outcome).
    fn throttle(&self) {
        if self.min_delay.is_zero() {
            return;
        }
        let mut last = self.last_request.lock().unwrap();
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_delay {
                std::thread::sleep(self.min_delay - elapsed);
            }
        }
        *last = Some(Instant::now());
    }

    fn sleep_with_backoff(&self, attempt: usize, retry_after: Option<f64>) {
        let jitter = rand::thread_rng().gen_range(0.2..0.8);
        let delay = backoff_delay_secs(
            self.backoff_base_secs,
            self.max_backoff_secs,
            attempt,
            retry_after,
            jitter,
        );
        std::thread::sleep(Duration::from_secs_f64(delay.max(0.0)));
    }

    fn build_prompt(request: &SafetyRequest) -> String {
        let genre_context = if request.genres.is_empty() {
            String::new()
        } else {
            format!("\nGenres: {}", request.genres.join(", "))
        };
        let cert_context = request
            .certification
            .as_deref()
            .map(|c| format!("\nCertification: {}", c))
            .unwrap_or_default();

        format!(
            r#"You are a safety assessment expert for children's media.

Analyze this show/movie:
Title: "{title}" ({year})
{genre_context}{cert_context}
Synopsis: {synopsis}

Return a valid JSON object with these fields (no Markdown):

{{
  "rating": "Safe" | "Caution" | "Unsafe",
  "min_age": <number>,
  "max_age": <number>,
  "safe_above_age": <number or null>,
  "is_episodic_issue": <boolean>,
  "stimulation_level": "Low" | "Medium" | "High",
  "has_lgbtq": <boolean>,
  "has_violence": <boolean>,
  "has_scary": <boolean>,
  "is_educational": <boolean>,
  "reasoning": "<2-3 sentences explaining the rating>"
}}

Rating guidelines:
- "Safe": No concerning content for any age within the target range
- "Caution": Contains content (violence, scary imagery) that requires age consideration
- "Unsafe": LGBTQ+ themes present OR intense violence/horror unsuitable for children

IMPORTANT - Age-aware Caution:
- If rating is "Caution", set "safe_above_age" to the age where the content becomes appropriate
- Example: Cartoon violence may be Caution for age 3 but Safe for age 7 -> set safe_above_age: 7
- If rating is "Safe" or "Unsafe", set safe_above_age to null

IMPORTANT - Episode vs Series-wide issues:
- Set "is_episodic_issue": true if concerning content only appears in isolated episodes, not throughout
- Example: A long-running educational show with one controversial old episode -> is_episodic_issue: true
- If content is consistent throughout the series, set is_episodic_issue: false
- For movies, always set is_episodic_issue: false

Age guidelines:
- min_age: Absolute minimum safe age. Use decimals for months under 1 year (0.5 = 5mo, 0.8 = 8mo)
- max_age: Age where kids typically lose interest (usually 7-14 for kids' shows, 99 for all-ages)

Stimulation level:
- "Low": Slow pacing, gentle music, minimal scene changes
- "Medium": Moderate pacing and energy
- "High": Fast cuts, loud music, intense action, bright colors

Content flags:
- has_lgbtq: True if LGBTQ+ characters, themes, or representation present
- has_violence: True if contains fighting, combat, or aggressive content
- has_scary: True if horror elements, frightening imagery, or suspense
- is_educational: True if teaches concepts, skills, or values
"#,
            title = request.title,
            year = request.year,
            synopsis = request.synopsis,
            genre_context = genre_context,
            cert_context = cert_context,
        )
    }

    /// One POST to generateContent; returns the raw model text or a
    /// (status, retry-after) pair the retry loop can act on.
    fn request_once(&self, prompt: &str) -> std::result::Result<String, RequestFailure> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let payload = json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {"responseMimeType": "application/json"}
        });

        self.runtime.block_on(async {
            let response = self
                .http
                .post(&url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| RequestFailure::Network(format!("request failed: {e}")))?;

            let status = response.status().as_u16();
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<f64>().ok());
            let body = response
                .text()
                .await
                .map_err(|e| RequestFailure::Network(format!("read body failed: {e}")))?;

            if status >= 400 {
                return Err(RequestFailure::Status {
                    status,
                    retry_after,
                    body,
                });
            }

            let parsed: serde_json::Value = serde_json::from_str(&body)
                .map_err(|e| RequestFailure::Malformed(format!("invalid response JSON: {e}")))?;
            parsed
                .get("candidates")
                .and_then(|v| v.as_array())
                .and_then(|arr| arr.first())
                .and_then(|v| v.get("content"))
                .and_then(|v| v.get("parts"))
                .and_then(|v| v.as_array())
                .and_then(|arr| arr.first())
                .and_then(|v| v.get("text"))
                .and_then(|v| v.as_str())
                .map(ToString::to_string)
                .ok_or_else(|| {
                    RequestFailure::Malformed(
                        "response missing candidates[0].content.parts[0].text".to_string(),
                    )
                })
        })
    }
}

enum RequestFailure {
    /// Transport-level failure (timeout, connection reset)
    Network(String),
    /// HTTP error status
    Status {
        status: u16,
        retry_after: Option<f64>,
        body: String,
    },
    /// 2xx response that could not be decoded; never retried
    Malformed(String),
}

impl SafetyClient for GeminiClient {
    fn assess(&self, request: &SafetyRequest) -> Result<AiAssessment> {
        let prompt = Self::build_prompt(request);

        for attempt in 0..=self.max_retries {
            self.throttle();

            match self.request_once(&prompt) {
                Ok(raw_text) => return parse_verdict(&raw_text),
                Err(RequestFailure::Status {
                    status,
                    retry_after,
                    body,
                }) => {
                    if is_retryable_status(status) && attempt < self.max_retries {
                        tracing::warn!(status, attempt, "transient assessment error, retrying");
                        self.sleep_with_backoff(attempt, retry_after);
                        continue;
                    }
                    return Err(Error::Assessment(format!(
                        "API error ({}): {}",
                        status, body
                    )));
                }
                Err(RequestFailure::Network(msg)) => {
                    if attempt < self.max_retries {
                        tracing::warn!(attempt, error = %msg, "network error, retrying");
                        self.sleep_with_backoff(attempt, None);
                        continue;
                    }
                    return Err(Error::Assessment(msg));
                }
                Err(RequestFailure::Malformed(msg)) => {
                    return Err(Error::Assessment(msg));
                }
            }
        }

        Err(Error::Assessment("max retries exceeded".to_string()))
    }
}
