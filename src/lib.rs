mod api;
mod app;
mod cache;
mod components;
mod dialogs;
mod drafts;
mod models;
mod order;
mod pages;
mod realtime;
mod repository;
mod state;

use crate::app::App;
use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(App);
}

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use crate::api::EnvConfig;
    use crate::pages::focus_leaves_row;
    use wasm_bindgen::JsValue;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn set_window_env(pairs: &[(&str, &str)]) {
        let window = web_sys::window().expect("window");
        let env = js_sys::Object::new();
        for (k, v) in pairs {
            js_sys::Reflect::set(&env, &JsValue::from_str(k), &JsValue::from_str(v))
                .expect("set env key");
        }
        js_sys::Reflect::set(&window, &JsValue::from_str("ENV"), &env).expect("set window.ENV");
    }

    #[wasm_bindgen_test]
    fn test_env_config_reads_window_env() {
        set_window_env(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("supabase_anon_key", "anon-key"),
        ]);

        let cfg = EnvConfig::new();
        assert_eq!(cfg.supabase_url, "https://demo.supabase.co");
        assert_eq!(cfg.supabase_anon_key, "anon-key");
        assert_eq!(
            cfg.realtime_url(),
            "wss://demo.supabase.co/realtime/v1/websocket?apikey=anon-key&vsn=1.0.0"
        );
    }

    #[wasm_bindgen_test]
    fn test_env_config_upper_case_wins() {
        set_window_env(&[
            ("SUPABASE_URL", "https://upper.example"),
            ("supabase_url", "https://lower.example"),
        ]);

        assert_eq!(EnvConfig::new().supabase_url, "https://upper.example");
    }

    #[wasm_bindgen_test]
    fn test_focus_between_fields_of_row_stays_in_row() {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .expect("document");
        let row = document.create_element("li").expect("row");
        let name = document.create_element("textarea").expect("name field");
        let quantity = document.create_element("input").expect("quantity field");
        let elsewhere = document.create_element("button").expect("outside button");
        row.append_child(&name).expect("append name");
        row.append_child(&quantity).expect("append quantity");

        let row: &web_sys::Node = &row;
        let quantity: &web_sys::Node = &quantity;
        let elsewhere: &web_sys::Node = &elsewhere;
        assert!(!focus_leaves_row(Some(row), Some(quantity)));
        assert!(focus_leaves_row(Some(row), Some(elsewhere)));
        assert!(focus_leaves_row(Some(row), None));
    }
}
