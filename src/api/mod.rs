use crate::config::EnhancerConfig;
use crate::models::EditorKind;
use futures_util::future::join;
use gloo_timers::future::TimeoutFuture;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Network,
    Http,
    Parse,
    /// 2xx response whose body says the save did not happen.
    Rejected,
}

#[derive(Clone, Debug)]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn http(status: u16, message: Option<String>) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: message.unwrap_or_else(|| format!("HTTP {status}")),
        }
    }

    fn rejected(message: Option<String>) -> Self {
        Self {
            kind: ApiErrorKind::Rejected,
            message: message.unwrap_or_else(|| "Save rejected".to_string()),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// One quick save of a section or roadmap step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SaveRequest {
    pub guide_id: u64,
    pub kind: EditorKind,
    /// Section number or roadmap step number.
    pub target: u64,
    pub content: String,
    pub name: String,
}

impl SaveRequest {
    pub fn endpoint(&self) -> &'static str {
        match self.kind {
            EditorKind::Roadmap => "guide/roadmap/save",
            EditorKind::Section => "guide/section/save",
        }
    }

    /// Form body fields. Content and name are percent-encoded once more on
    /// top of the form encoding; the endpoint decodes them twice.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let target_field = match self.kind {
            EditorKind::Roadmap => "step",
            EditorKind::Section => "section",
        };

        vec![
            ("id", self.guide_id.to_string()),
            ("content", urlencoding::encode(&self.content).into_owned()),
            ("name", urlencoding::encode(&self.name).into_owned()),
            (target_field, self.target.to_string()),
        ]
    }
}

/// Endpoint paths starting with `/` are absolute; others live under the xhr prefix.
pub(crate) fn resolve_url(origin: &str, xhr_prefix: &str, endpoint: &str) -> String {
    if endpoint.starts_with('/') {
        format!("{origin}{endpoint}")
    } else {
        format!("{origin}{xhr_prefix}{endpoint}")
    }
}

/// Any non-2xx status, `success: false`, or a truthy `error` field is a failure.
/// Unparseable bodies count as `{}`.
pub(crate) fn interpret_save_response(status: u16, body: &str) -> ApiResult<serde_json::Value> {
    let data: serde_json::Value =
        serde_json::from_str(body).unwrap_or_else(|_| serde_json::json!({}));

    let message = data
        .get("message")
        .and_then(|v| v.as_str())
        .or_else(|| data.get("error").and_then(|v| v.as_str()))
        .map(|s| s.to_string());

    if !(200..300).contains(&status) {
        return Err(ApiError::http(status, message));
    }

    if data.get("success").and_then(|v| v.as_bool()) == Some(false) {
        return Err(ApiError::rejected(message));
    }

    let has_error = match data.get("error") {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => !s.is_empty(),
        Some(serde_json::Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(_) => true,
    };
    if has_error {
        return Err(ApiError::rejected(message));
    }

    Ok(data)
}

pub(crate) fn csrf_token() -> String {
    let token = crate::util::document()
        .and_then(|d| d.query_selector(r#"meta[name="csrf-token"]"#).ok().flatten())
        .and_then(|m| m.get_attribute("content"))
        .filter(|t| !t.is_empty());

    match token {
        Some(t) => t,
        None => {
            tracing::error!("Could not retrieve CSRF token");
            String::new()
        }
    }
}

/// Sends a save request. Implemented over HTTP by [`SaveClient`].
pub(crate) trait SaveTransport {
    async fn send(&self, req: &SaveRequest) -> ApiResult<serde_json::Value>;
}

#[derive(Clone, Debug)]
pub(crate) struct SaveClient {
    pub(crate) origin: String,
    pub(crate) xhr_prefix: String,
}

impl SaveClient {
    pub fn new(origin: String, xhr_prefix: String) -> Self {
        Self { origin, xhr_prefix }
    }

    pub fn from_page(config: &EnhancerConfig) -> Self {
        let origin = web_sys::window()
            .and_then(|w| w.location().origin().ok())
            .unwrap_or_default();
        Self::new(origin, config.xhr_prefix.clone())
    }
}

impl SaveTransport for SaveClient {
    async fn send(&self, req: &SaveRequest) -> ApiResult<serde_json::Value> {
        let client = reqwest::Client::new();
        let url = resolve_url(&self.origin, &self.xhr_prefix, req.endpoint());

        let res = client
            .post(url)
            .header("x-csrf-token", csrf_token())
            .form(&req.form_fields())
            .send()
            .await
            .map_err(ApiError::network)?;

        let status = res.status().as_u16();
        let body = res.text().await.map_err(ApiError::parse)?;

        interpret_save_response(status, &body)
    }
}

/// Runs the request alongside a timer so "Saving..." never just flickers.
/// Resolves once both are done.
pub(crate) async fn send_with_min_delay<T: SaveTransport>(
    transport: &T,
    req: &SaveRequest,
    min_delay_ms: u32,
) -> ApiResult<serde_json::Value> {
    let (result, ()) = join(transport.send(req), TimeoutFuture::new(min_delay_ms)).await;
    if let Err(e) = &result {
        tracing::error!(kind = ?e.kind, "Save failed: {e}");
    }
    result
}
