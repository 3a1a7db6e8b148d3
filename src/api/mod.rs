use crate::models::{NewTube, Tube, TubeList, TubeUpdate};
use crate::repository::TubeRepository;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    Network,
    Http,
    Parse,
    Empty,
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
        Self::network_message(e)
    }

    pub(crate) fn network_message(e: impl std::fmt::Display) -> Self {
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

    fn unauthorized(body: String) -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: format!("Unauthorized: {body}"),
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }

    fn empty(ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Empty,
            message: format!("{ctx}: backend returned no row"),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

const DEFAULT_SUPABASE_URL: &str = "http://localhost:54321";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct EnvConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl EnvConfig {
    /// Read `window.ENV`.
    ///
    /// Both `SUPABASE_URL` / `SUPABASE_ANON_KEY` and their lower-case
    /// spellings are accepted; upper-case wins.
    pub fn new() -> Self {
        let mut cfg = Self {
            supabase_url: DEFAULT_SUPABASE_URL.to_string(),
            supabase_anon_key: String::new(),
        };

        let Some(env) = web_sys::window()
            .and_then(|w| w.get("ENV"))
            .filter(|env| !env.is_undefined() && env.is_object())
        else {
            return cfg;
        };

        let read = |keys: [&str; 2]| {
            keys.into_iter().find_map(|k| {
                js_sys::Reflect::get(&env, &k.into())
                    .ok()
                    .and_then(|v| v.as_string())
            })
        };

        if let Some(url) = read(["SUPABASE_URL", "supabase_url"]) {
            cfg.supabase_url = url;
        }
        if let Some(key) = read(["SUPABASE_ANON_KEY", "supabase_anon_key"]) {
            cfg.supabase_anon_key = key;
        }

        cfg
    }

    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.supabase_url.trim_end_matches('/'))
    }

    /// Realtime websocket endpoint (`http` → `ws`, `https` → `wss`).
    pub fn realtime_url(&self) -> String {
        let base = self.supabase_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };

        format!(
            "{ws_base}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            urlencoding::encode(&self.supabase_anon_key)
        )
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct CreateListRequest {
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct UpdateListRequest {
    pub name: String,
}

/// Whether PostgREST should echo written rows back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::AsRefStr)]
pub(crate) enum Prefer {
    #[strum(serialize = "return=representation")]
    Representation,
    #[strum(serialize = "return=minimal")]
    Minimal,
}

/// PostgREST client for the `lists` / `tubes` tables.
#[derive(Clone)]
pub(crate) struct SupabaseClient {
    pub(crate) rest_url: String,
    pub(crate) anon_key: String,
}

impl SupabaseClient {
    pub fn new(cfg: &EnvConfig) -> Self {
        Self {
            rest_url: cfg.rest_url(),
            anon_key: cfg.supabase_anon_key.clone(),
        }
    }

    pub(crate) fn table_url(&self, table: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}/{}", self.rest_url, table)
        } else {
            format!("{}/{}?{}", self.rest_url, table, query)
        }
    }

    pub(crate) fn id_filter(id: &str) -> String {
        format!("id=eq.{}", urlencoding::encode(id))
    }

    fn with_auth_headers(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
    }

    async fn send(
        &self,
        method: reqwest::Method,
        url: String,
        body: Option<&impl Serialize>,
        prefer: Option<Prefer>,
        ctx: &str,
    ) -> ApiResult<reqwest::Response> {
        let client = reqwest::Client::new();
        let mut req = self.with_auth_headers(client.request(method, url));

        if let Some(p) = prefer {
            req = req.header("Prefer", p.as_ref());
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(ApiError::network)?;

        if res.status().is_success() {
            Ok(res)
        } else if res.status().as_u16() == 401 {
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::unauthorized(body))
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, ctx))
        }
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: String,
        body: Option<&impl Serialize>,
        prefer: Option<Prefer>,
        ctx: &str,
    ) -> ApiResult<T> {
        let res = self.send(method, url, body, prefer, ctx).await?;
        res.json().await.map_err(ApiError::parse)
    }
}

/// Body type for requests without a payload.
const NO_BODY: Option<&()> = None;

impl TubeRepository for SupabaseClient {
    async fn get_lists(&self) -> ApiResult<Vec<TubeList>> {
        self.fetch_json(
            reqwest::Method::GET,
            self.table_url("lists", "select=*&order=created_at.asc"),
            NO_BODY,
            None,
            "Load lists failed",
        )
        .await
    }

    async fn get_tubes(&self) -> ApiResult<Vec<Tube>> {
        self.fetch_json(
            reqwest::Method::GET,
            self.table_url("tubes", "select=*&order=name.asc"),
            NO_BODY,
            None,
            "Load tubes failed",
        )
        .await
    }

    async fn create_list(&self, name: &str) -> ApiResult<TubeList> {
        let rows: Vec<TubeList> = self
            .fetch_json(
                reqwest::Method::POST,
                self.table_url("lists", "select=*"),
                Some(&[CreateListRequest {
                    name: name.to_string(),
                }]),
                Some(Prefer::Representation),
                "Create list failed",
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| ApiError::empty("Create list"))
    }

    async fn update_list(&self, id: &str, name: &str) -> ApiResult<()> {
        self.send(
            reqwest::Method::PATCH,
            self.table_url("lists", &Self::id_filter(id)),
            Some(&UpdateListRequest {
                name: name.to_string(),
            }),
            Some(Prefer::Minimal),
            "Rename list failed",
        )
        .await
        .map(|_| ())
    }

    async fn delete_list(&self, id: &str) -> ApiResult<()> {
        self.send(
            reqwest::Method::DELETE,
            self.table_url("lists", &Self::id_filter(id)),
            NO_BODY,
            None,
            "Delete list failed",
        )
        .await
        .map(|_| ())
    }

    async fn add_tube(&self, tube: NewTube) -> ApiResult<()> {
        self.send(
            reqwest::Method::POST,
            self.table_url("tubes", ""),
            Some(&[tube]),
            Some(Prefer::Minimal),
            "Add tube failed",
        )
        .await
        .map(|_| ())
    }

    async fn update_tube(&self, id: &str, update: TubeUpdate) -> ApiResult<Vec<Tube>> {
        self.fetch_json(
            reqwest::Method::PATCH,
            self.table_url("tubes", &format!("{}&select=*", Self::id_filter(id))),
            Some(&update),
            Some(Prefer::Representation),
            "Update tube failed",
        )
        .await
    }

    async fn delete_tube(&self, id: &str) -> ApiResult<()> {
        self.send(
            reqwest::Method::DELETE,
            self.table_url("tubes", &Self::id_filter(id)),
            NO_BODY,
            None,
            "Delete tube failed",
        )
        .await
        .map(|_| ())
    }
}
