use crate::pages::ListsPage;
use crate::realtime::RealtimeSubscription;
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos::task::spawn_local;

#[component]
pub fn App() -> impl IntoView {
    let app_state = AppState::new();
    provide_context(AppContext(app_state.clone()));

    let manager = app_state.manager.clone();
    spawn_local(async move {
        manager.load().await;
    });

    // Every change notification triggers a full reload; no dedupe.
    let manager = app_state.manager.clone();
    let subscription = RealtimeSubscription::connect(&app_state.env, move || {
        let m = manager.clone();
        spawn_local(async move {
            m.load().await;
        });
    });
    // Held for the app lifetime; dropped (socket closed) on unmount.
    let _subscription = StoredValue::new_local(subscription);

    view! { <ListsPage /> }
}
