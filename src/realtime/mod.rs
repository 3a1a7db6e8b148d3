use crate::api::EnvConfig;
use leptos::logging::{error, log, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Tables whose changes trigger a reload.
pub(crate) const WATCHED_TABLES: [&str; 2] = ["lists", "tubes"];

const HEARTBEAT_MS: i32 = 30_000;

/// One Phoenix channel frame (JSON serializer v1).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(rename = "ref", default)]
    pub msg_ref: Option<String>,
}

pub(crate) fn topic_for(table: &str) -> String {
    format!("realtime:public:{table}")
}

pub(crate) fn join_message(table: &str, access_token: &str, msg_ref: u64) -> PhoenixMessage {
    PhoenixMessage {
        topic: topic_for(table),
        event: "phx_join".to_string(),
        payload: serde_json::json!({
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [
                    { "event": "*", "schema": "public", "table": table }
                ]
            },
            "access_token": access_token
        }),
        msg_ref: Some(msg_ref.to_string()),
    }
}

pub(crate) fn heartbeat_message(msg_ref: u64) -> PhoenixMessage {
    PhoenixMessage {
        topic: "phoenix".to_string(),
        event: "heartbeat".to_string(),
        payload: serde_json::json!({}),
        msg_ref: Some(msg_ref.to_string()),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum RealtimeEvent {
    /// A row changed in one of the watched tables.
    Changed { table: String },
    /// The server refused a join or reported a channel error.
    ChannelError { topic: String, reason: String },
    Other,
}

/// Classify one inbound text frame.
pub(crate) fn classify(text: &str) -> RealtimeEvent {
    let Ok(msg) = serde_json::from_str::<PhoenixMessage>(text) else {
        return RealtimeEvent::Other;
    };

    let table = msg
        .topic
        .strip_prefix("realtime:public:")
        .filter(|t| WATCHED_TABLES.contains(t))
        .map(|t| t.to_string());

    match msg.event.as_str() {
        "postgres_changes" | "INSERT" | "UPDATE" | "DELETE" => match table {
            Some(table) => RealtimeEvent::Changed { table },
            None => RealtimeEvent::Other,
        },
        "phx_error" => RealtimeEvent::ChannelError {
            topic: msg.topic,
            reason: msg.payload.to_string(),
        },
        "phx_reply" => {
            let status = msg.payload.get("status").and_then(|s| s.as_str());
            if status == Some("error") {
                RealtimeEvent::ChannelError {
                    topic: msg.topic,
                    reason: msg
                        .payload
                        .get("response")
                        .map(|r| r.to_string())
                        .unwrap_or_default(),
                }
            } else {
                RealtimeEvent::Other
            }
        }
        _ => RealtimeEvent::Other,
    }
}

/// Live websocket subscription. Dropping it closes the socket and stops
/// the heartbeat.
pub(crate) struct RealtimeSubscription {
    socket: web_sys::WebSocket,
    heartbeat_id: Option<i32>,
    _on_open: Closure<dyn FnMut()>,
    _on_message: Closure<dyn FnMut(web_sys::MessageEvent)>,
    _on_close: Closure<dyn FnMut(web_sys::CloseEvent)>,
    _heartbeat: Closure<dyn FnMut()>,
}

impl RealtimeSubscription {
    /// Subscribe to both tables; `on_change` runs once per change frame.
    /// No dedupe: concurrent pushes each trigger their own reload.
    pub fn connect(cfg: &EnvConfig, on_change: impl Fn() + 'static) -> Option<Self> {
        let socket = match web_sys::WebSocket::new(&cfg.realtime_url()) {
            Ok(s) => s,
            Err(e) => {
                error!("[realtime] cannot open websocket: {e:?}");
                return None;
            }
        };

        let refs = Arc::new(AtomicU64::new(0));
        let next_ref = {
            let refs = refs.clone();
            move || refs.fetch_add(1, Ordering::Relaxed) + 1
        };

        let send = {
            let socket = socket.clone();
            move |msg: &PhoenixMessage| match serde_json::to_string(msg) {
                Ok(json) => {
                    if let Err(e) = socket.send_with_str(&json) {
                        warn!("[realtime] send failed: {e:?}");
                    }
                }
                Err(e) => warn!("[realtime] cannot encode frame: {e}"),
            }
        };

        let on_open = {
            let send = send.clone();
            let next_ref = next_ref.clone();
            let token = cfg.supabase_anon_key.clone();
            Closure::wrap(Box::new(move || {
                for table in WATCHED_TABLES {
                    send(&join_message(table, &token, next_ref()));
                }
                log!("[realtime] subscribed to {:?}", WATCHED_TABLES);
            }) as Box<dyn FnMut()>)
        };
        socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));

        let on_message = Closure::wrap(Box::new(move |ev: web_sys::MessageEvent| {
            let Some(text) = ev.data().as_string() else {
                return;
            };
            match classify(&text) {
                RealtimeEvent::Changed { table } => {
                    log!("[realtime] change on {table}, reloading");
                    on_change();
                }
                RealtimeEvent::ChannelError { topic, reason } => {
                    error!("[realtime] channel {topic} error: {reason}");
                }
                RealtimeEvent::Other => {}
            }
        }) as Box<dyn FnMut(web_sys::MessageEvent)>);
        socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        let on_close = Closure::wrap(Box::new(move |ev: web_sys::CloseEvent| {
            warn!("[realtime] socket closed ({}): {}", ev.code(), ev.reason());
        }) as Box<dyn FnMut(web_sys::CloseEvent)>);
        socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        let heartbeat = {
            let socket = socket.clone();
            Closure::wrap(Box::new(move || {
                if socket.ready_state() == web_sys::WebSocket::OPEN {
                    send(&heartbeat_message(next_ref()));
                }
            }) as Box<dyn FnMut()>)
        };
        let heartbeat_id = web_sys::window().and_then(|w| {
            w.set_interval_with_callback_and_timeout_and_arguments_0(
                heartbeat.as_ref().unchecked_ref(),
                HEARTBEAT_MS,
            )
            .ok()
        });

        Some(Self {
            socket,
            heartbeat_id,
            _on_open: on_open,
            _on_message: on_message,
            _on_close: on_close,
            _heartbeat: heartbeat,
        })
    }
}

impl Drop for RealtimeSubscription {
    fn drop(&mut self) {
        if let (Some(w), Some(id)) = (web_sys::window(), self.heartbeat_id) {
            w.clear_interval_with_handle(id);
        }
        self.socket.set_onopen(None);
        self.socket.set_onmessage(None);
        self.socket.set_onclose(None);
        let _ = self.socket.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_message_shape() {
        let msg = join_message("tubes", "anon", 3);
        let v = serde_json::to_value(&msg).expect("should serialize");
        assert_eq!(v["topic"], "realtime:public:tubes");
        assert_eq!(v["event"], "phx_join");
        assert_eq!(v["ref"], "3");
        assert_eq!(v["payload"]["access_token"], "anon");
        assert_eq!(v["payload"]["config"]["postgres_changes"][0]["table"], "tubes");
        assert_eq!(v["payload"]["config"]["postgres_changes"][0]["event"], "*");
    }

    #[test]
    fn test_heartbeat_message_shape() {
        let v = serde_json::to_value(heartbeat_message(7)).expect("should serialize");
        assert_eq!(
            v,
            serde_json::json!({"topic": "phoenix", "event": "heartbeat", "payload": {}, "ref": "7"})
        );
    }

    #[test]
    fn test_classify_postgres_change() {
        let frame = r#"{
            "topic": "realtime:public:tubes",
            "event": "postgres_changes",
            "payload": {"data": {"table": "tubes", "type": "UPDATE"}},
            "ref": null
        }"#;
        assert_eq!(
            classify(frame),
            RealtimeEvent::Changed {
                table: "tubes".to_string()
            }
        );
    }

    #[test]
    fn test_classify_legacy_row_events() {
        let frame = r#"{"topic": "realtime:public:lists", "event": "DELETE", "payload": {}, "ref": null}"#;
        assert_eq!(
            classify(frame),
            RealtimeEvent::Changed {
                table: "lists".to_string()
            }
        );
    }

    #[test]
    fn test_classify_ignores_unwatched_and_noise() {
        let other_table = r#"{"topic": "realtime:public:users", "event": "INSERT", "payload": {}}"#;
        assert_eq!(classify(other_table), RealtimeEvent::Other);

        let ok_reply = r#"{"topic": "phoenix", "event": "phx_reply", "payload": {"status": "ok", "response": {}}, "ref": "2"}"#;
        assert_eq!(classify(ok_reply), RealtimeEvent::Other);

        assert_eq!(classify("not json"), RealtimeEvent::Other);
    }

    #[test]
    fn test_classify_join_error() {
        let frame = r#"{
            "topic": "realtime:public:lists",
            "event": "phx_reply",
            "payload": {"status": "error", "response": {"reason": "unauthorized"}},
            "ref": "1"
        }"#;
        match classify(frame) {
            RealtimeEvent::ChannelError { topic, reason } => {
                assert_eq!(topic, "realtime:public:lists");
                assert!(reason.contains("unauthorized"));
            }
            other => panic!("expected channel error, got {other:?}"),
        }
    }
}
