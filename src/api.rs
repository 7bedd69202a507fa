// API client module: the three commands the CLI offers (upload, identify,
// list songs). Each one builds a request, hands it to the retrying executor
// and maps the outcome's status code and body onto domain types.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::config::TunefinderConfig;
use crate::error::ApiError;
use crate::retry::{Executor, Outcome, Request, RetryPolicy};
use crate::transport::{HttpTransport, Transport};

/// Trim length used when the user just presses Enter.
pub const DEFAULT_TRIM_SECS: u32 = 10;
/// Shortest clip the recognition service is given.
pub const MIN_TRIM_SECS: u32 = 5;
/// Scores below this are reported as low confidence.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.85;

/// Client for the tunefinder API gateway.
pub struct ApiClient<T = HttpTransport> {
    executor: Executor<T>,
    base_url: String,
}

/// Body of `POST /upload`.
#[derive(Serialize, Deserialize, Debug)]
pub struct UploadRequest {
    pub audio: String,
}

/// Body returned by a successful upload. The job id is an integer today,
/// kept as a `Value` so a string id would decode too.
#[derive(Serialize, Deserialize, Debug)]
pub struct UploadResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub jobid: Value,
}

/// Body of `POST /identify`.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct IdentifyRequest {
    pub jobid: String,
    pub trim_length: u32,
}

/// Song matched by the recognition service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Identification {
    pub song: String,
    pub artist: String,
    pub album: String,
    pub release_date: String,
    #[serde(default)]
    pub score: Value,
}

impl Identification {
    /// Score as a number; the backend may send it as a number or a string.
    pub fn score(&self) -> Option<f64> {
        match &self.score {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Score for display, two decimals, or `unknown`.
    pub fn score_label(&self) -> String {
        self.score()
            .map(|s| format!("{s:.2}"))
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// A missing or unreadable score counts as low confidence.
    pub fn is_low_confidence(&self) -> bool {
        self.score().map_or(true, |s| s < LOW_CONFIDENCE_THRESHOLD)
    }
}

/// One previously identified song, decoded from a
/// `[title, score, artist, album, release_date]` row.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub title: String,
    pub score: String,
    pub artist: String,
    pub album: String,
    pub release_date: String,
}

impl Song {
    pub fn from_row(row: &[Value]) -> Result<Self, ApiError> {
        if row.len() < 5 {
            return Err(ApiError::Decode(format!(
                "song row has {} columns, expected 5",
                row.len()
            )));
        }
        Ok(Song {
            title: cell_text(&row[0]),
            score: cell_text(&row[1]),
            artist: cell_text(&row[2]),
            album: cell_text(&row[3]),
            release_date: cell_text(&row[4]),
        })
    }
}

fn cell_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Trim length chosen by the user, after defaults and clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimLength {
    pub seconds: u32,
    /// True when the requested value was below [`MIN_TRIM_SECS`].
    pub raised_to_minimum: bool,
}

/// Parse the trim-length prompt: empty means the default, short values are
/// raised to the minimum, anything non-numeric is rejected.
pub fn parse_trim_length(input: &str) -> Result<TrimLength, ApiError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(TrimLength {
            seconds: DEFAULT_TRIM_SECS,
            raised_to_minimum: false,
        });
    }
    let requested: i64 = input
        .parse()
        .map_err(|_| ApiError::InvalidInput(format!("trim length '{input}' is not a number")))?;
    if requested < i64::from(MIN_TRIM_SECS) {
        return Ok(TrimLength {
            seconds: MIN_TRIM_SECS,
            raised_to_minimum: true,
        });
    }
    let seconds = u32::try_from(requested)
        .map_err(|_| ApiError::InvalidInput(format!("trim length '{input}' is too large")))?;
    Ok(TrimLength {
        seconds,
        raised_to_minimum: false,
    })
}

/// Map a non-200 outcome onto the error the user should see.
fn reject(outcome: &Outcome) -> ApiError {
    if outcome.is_accepted() {
        let message = match outcome.json::<Value>() {
            Ok(Value::Object(map)) => match map.get("error") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => Value::Object(map).to_string(),
            },
            Ok(other) => other.to_string(),
            Err(_) => outcome.text(),
        };
        ApiError::Application {
            status: outcome.status_code,
            message,
        }
    } else {
        ApiError::UnexpectedStatus {
            status: outcome.status_code,
            body: outcome.text(),
        }
    }
}

impl ApiClient<HttpTransport> {
    /// Build a client talking HTTP to the configured gateway.
    pub fn from_config(cfg: &TunefinderConfig) -> Result<Self> {
        let transport =
            HttpTransport::new(cfg.request_timeout()).context("Failed to build HTTP client")?;
        let policy = RetryPolicy {
            backoff_unit: cfg.backoff_unit(),
            ..RetryPolicy::default()
        };
        Ok(Self::new(
            Executor::new(transport).with_policy(policy),
            cfg.base_url(),
        ))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(executor: Executor<T>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        ApiClient { executor, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload an audio file as base64 and return the job id the backend
    /// assigned to it.
    pub fn upload(&self, file_path: &Path) -> Result<String, ApiError> {
        let bytes = fs::read(file_path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ApiError::MissingFile(file_path.display().to_string()),
            _ => ApiError::ReadFile {
                path: file_path.display().to_string(),
                source: e,
            },
        })?;
        let payload = UploadRequest {
            audio: STANDARD.encode(&bytes),
        };
        tracing::info!(
            file = %file_path.display(),
            bytes = bytes.len(),
            "uploading audio"
        );

        let url = format!("{}/upload", self.base_url);
        let body = serde_json::to_value(&payload).map_err(|e| ApiError::Decode(e.to_string()))?;
        let req = Request::post(url, body).with_header("Content-Type", "application/json");
        let outcome = self.executor.execute(&req)?;
        if !outcome.is_success() {
            return Err(reject(&outcome));
        }

        let resp: UploadResponse = outcome
            .json()
            .map_err(|e| ApiError::Decode(format!("upload response: {e}")))?;
        match resp.jobid {
            Value::String(s) if !s.is_empty() => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(ApiError::Decode(format!("upload response has no job id: {other}"))),
        }
    }

    /// Ask the backend to trim the uploaded clip and identify it.
    pub fn identify(&self, jobid: &str, trim: TrimLength) -> Result<Identification, ApiError> {
        let jobid = jobid.trim();
        if jobid.is_empty() {
            return Err(ApiError::InvalidInput("job id must not be empty".into()));
        }
        let payload = IdentifyRequest {
            jobid: jobid.to_string(),
            trim_length: trim.seconds,
        };

        let url = format!("{}/identify", self.base_url);
        let body = serde_json::to_value(&payload).map_err(|e| ApiError::Decode(e.to_string()))?;
        let req = Request::post(url, body).with_header("Content-Type", "application/json");
        let outcome = self.executor.execute(&req)?;
        if !outcome.is_success() {
            return Err(reject(&outcome));
        }

        let value: Value = outcome
            .json()
            .map_err(|e| ApiError::Decode(format!("identify response: {e}")))?;
        // A 200 with an `error` field means the service found no match.
        if let Some(err) = value.get("error") {
            return Err(ApiError::Application {
                status: outcome.status_code,
                message: cell_text(err),
            });
        }
        serde_json::from_value(value).map_err(|e| ApiError::Decode(format!("identify response: {e}")))
    }

    /// List every song identified so far.
    pub fn songs(&self) -> Result<Vec<Song>, ApiError> {
        let url = format!("{}/songs", self.base_url);
        let outcome = self.executor.execute(&Request::get(url))?;
        if !outcome.is_success() {
            return Err(reject(&outcome));
        }

        let rows: Vec<Vec<Value>> = outcome
            .json()
            .map_err(|e| ApiError::Decode(format!("songs response: {e}")))?;
        rows.iter().map(|row| Song::from_row(row)).collect()
    }
}
