pub(crate) mod tube_manager;

use crate::api::{EnvConfig, SupabaseClient};
use crate::dialogs::BrowserDialogs;
use leptos::prelude::*;
pub(crate) use tube_manager::{SaveOutcome, TubeManager, ViewSnapshot};

pub(crate) type AppManager = TubeManager<SupabaseClient, BrowserDialogs>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub env: EnvConfig,

    /// Last snapshot published by the manager.
    pub view: RwSignal<ViewSnapshot>,

    pub manager: AppManager,
}

impl AppState {
    pub fn new() -> Self {
        let env = EnvConfig::new();
        let view: RwSignal<ViewSnapshot> = RwSignal::new(ViewSnapshot::default());

        let manager = TubeManager::new(
            SupabaseClient::new(&env),
            BrowserDialogs,
            move |snap: &ViewSnapshot| view.set(snap.clone()),
        );

        Self { env, view, manager }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);
