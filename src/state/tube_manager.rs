use crate::cache::{attach_mail_actions, partition_by_list, ListSnapshot};
use crate::dialogs::Dialogs;
use crate::drafts::{DraftError, TubeDraft, TubeField};
use crate::models::{NewTube, Tube, TubeList};
use crate::order::NOTHING_TO_ORDER;
use crate::repository::TubeRepository;
use leptos::logging::{error, log, warn};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

pub(crate) const CONFIRM_DELETE_LIST: &str =
    "Voulez-vous vraiment supprimer cette liste et tous ses tubes ?";
pub(crate) const CONFIRM_DELETE_TUBE: &str = "Voulez-vous vraiment supprimer ce tube ?";
pub(crate) const PROMPT_NEW_LIST: &str = "Nom de la nouvelle liste:";

/// The one tube row currently in edit mode, with its typed values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct EditingRow {
    pub tube_id: String,
    pub draft: TubeDraft,

    /// Validation or save failure shown under the row.
    pub error: Option<String>,
}

impl EditingRow {
    fn open(t: &Tube) -> Self {
        Self {
            tube_id: t.id.clone(),
            draft: TubeDraft::from_tube(t),
            error: None,
        }
    }
}

/// Everything the page renders.
///
/// Lists/tubes are replaced wholesale on every load; the expanded set, the
/// open add forms and the editing row are UI state carried across loads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ViewSnapshot {
    pub lists: Vec<ListSnapshot>,
    pub expanded: BTreeSet<String>,
    pub add_form_open: BTreeSet<String>,
    pub editing: Option<EditingRow>,
    pub last_error: Option<String>,
    pub loaded: bool,
}

impl ViewSnapshot {
    pub fn list(&self, list_id: &str) -> Option<&ListSnapshot> {
        self.lists.iter().find(|s| s.list.id == list_id)
    }

    pub fn tube(&self, tube_id: &str) -> Option<&Tube> {
        self.lists
            .iter()
            .flat_map(|s| s.tubes.iter())
            .find(|t| t.id == tube_id)
    }

    pub fn is_expanded(&self, list_id: &str) -> bool {
        self.expanded.contains(list_id)
    }

    pub fn is_add_form_open(&self, list_id: &str) -> bool {
        self.add_form_open.contains(list_id)
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing.as_ref().map(|e| e.tube_id.as_str())
    }

    pub fn editing_row(&self, tube_id: &str) -> Option<&EditingRow> {
        self.editing.as_ref().filter(|e| e.tube_id == tube_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SaveOutcome {
    /// Nothing to do (no editing row, cancelled prompt, unchanged value).
    Skipped,
    Saved,
    Invalid(DraftError),
    /// The backend call failed; the error is in `last_error`.
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum MailOutcome {
    Opened(String),
    NothingToOrder,
    Collapsed,
    UnknownList,
}

type RenderHook = Arc<dyn Fn(&ViewSnapshot) + Send + Sync>;

/// List/tube view controller.
///
/// Responsibilities:
/// - full reload after every mutation (no incremental patching)
/// - single editing row; switching rows flushes the previous save first
/// - dialogs (confirm/prompt/alert) and the order-mail action
///
/// Every state change is published through `on_render`.
pub(crate) struct TubeManager<R, D> {
    repo: Arc<R>,
    dialogs: Arc<D>,
    state: Arc<Mutex<ViewSnapshot>>,
    on_render: RenderHook,
}

impl<R, D> Clone for TubeManager<R, D> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            dialogs: self.dialogs.clone(),
            state: self.state.clone(),
            on_render: self.on_render.clone(),
        }
    }
}

impl<R: TubeRepository, D: Dialogs> TubeManager<R, D> {
    pub fn new(repo: R, dialogs: D, on_render: impl Fn(&ViewSnapshot) + Send + Sync + 'static) -> Self {
        Self {
            repo: Arc::new(repo),
            dialogs: Arc::new(dialogs),
            state: Arc::new(Mutex::new(ViewSnapshot::default())),
            on_render: Arc::new(on_render),
        }
    }

    fn state(&self) -> MutexGuard<'_, ViewSnapshot> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.state().clone()
    }

    fn publish(&self) {
        let snap = self.snapshot();
        (self.on_render)(&snap);
    }

    fn record_error(&self, ctx: &str, e: impl std::fmt::Display) {
        error!("[tubes] {ctx}: {e}");
        self.state().last_error = Some(format!("{ctx}: {e}"));
        self.publish();
    }

    pub fn dismiss_error(&self) {
        self.state().last_error = None;
        self.publish();
    }

    /// Fetch lists and tubes, then render. Failures are logged and kept in
    /// `last_error`; the previous snapshot stays on screen.
    pub async fn load(&self) {
        log!("[tubes] loading lists and tubes");

        let lists = match self.repo.get_lists().await {
            Ok(l) => l,
            Err(e) => return self.record_error("Chargement des listes impossible", e),
        };
        let tubes = match self.repo.get_tubes().await {
            Ok(t) => t,
            Err(e) => return self.record_error("Chargement des tubes impossible", e),
        };

        log!("[tubes] loaded {} lists, {} tubes", lists.len(), tubes.len());
        self.render(lists, tubes);
    }

    /// Rebuild the snapshot from fresh rows and publish it.
    pub fn render(&self, lists: Vec<TubeList>, tubes: Vec<Tube>) {
        {
            let mut s = self.state();
            s.lists = partition_by_list(lists, tubes);

            let ids: BTreeSet<String> = s.lists.iter().map(|l| l.list.id.clone()).collect();
            s.expanded.retain(|id| ids.contains(id));
            s.add_form_open.retain(|id| ids.contains(id));

            // The editing row survives a reload unless its tube is gone.
            let gone = s
                .editing_id()
                .is_some_and(|id| s.tube(id).is_none());
            if gone {
                s.editing = None;
            }

            s.loaded = true;
            s.last_error = None;
            after_render(&mut s);
        }
        self.publish();
    }

    pub fn toggle_expanded(&self, list_id: &str) {
        {
            let mut s = self.state();
            if !s.expanded.remove(list_id) {
                s.expanded.insert(list_id.to_string());
            }
        }
        self.publish();
    }

    pub fn toggle_add_form(&self, list_id: &str) {
        {
            let mut s = self.state();
            if !s.add_form_open.remove(list_id) {
                s.add_form_open.insert(list_id.to_string());
            }
        }
        self.publish();
    }

    pub fn has_pending_edit(&self) -> bool {
        self.state().editing.is_some()
    }

    /// Record a typed value of the editing row. Not published: the input
    /// already shows it.
    pub fn set_draft_field(&self, tube_id: &str, field: TubeField, value: String) {
        let mut s = self.state();
        if let Some(row) = s.editing.as_mut().filter(|r| r.tube_id == tube_id) {
            row.draft.set(field, value);
        }
    }

    /// Switch a row to edit mode.
    ///
    /// If another row is mid-edit, its save is issued first (exactly once).
    /// An invalid draft there is discarded and the row reverts; a backend
    /// failure keeps that row open with its typed values instead.
    pub async fn begin_edit(&self, tube_id: &str) {
        let previous = {
            let mut s = self.state();
            if s.editing_id() == Some(tube_id) {
                return;
            }
            s.editing.take()
        };

        let saved = match previous {
            Some(row) => self.commit(row, false).await == SaveOutcome::Saved,
            None => false,
        };

        {
            let mut s = self.state();
            // A later click may already own the editing slot.
            if s.editing.is_none() {
                if let Some(row) = s.tube(tube_id).map(EditingRow::open) {
                    s.editing = Some(row);
                }
            }
        }
        self.publish();

        if saved {
            self.load().await;
        }
    }

    /// Save the editing row (focus left the row).
    pub async fn save_editing(&self) -> SaveOutcome {
        let Some(row) = self.state().editing.take() else {
            return SaveOutcome::Skipped;
        };

        let outcome = self.commit(row, true).await;
        if outcome == SaveOutcome::Saved {
            self.load().await;
        }
        outcome
    }

    /// Validate and send one row. The row is already out of the editing slot.
    /// A backend failure always puts it back (with a message); an invalid
    /// draft only does with `keep_invalid`.
    async fn commit(&self, mut row: EditingRow, keep_invalid: bool) -> SaveOutcome {
        let update = match row.draft.validate() {
            Ok(u) => u,
            Err(e) => {
                warn!("[tubes] not saving tube {}: {e}", row.tube_id);
                if keep_invalid {
                    row.error = Some(e.to_string());
                    self.restore_editing(row);
                }
                return SaveOutcome::Invalid(e);
            }
        };

        match self.repo.update_tube(&row.tube_id, update).await {
            Ok(_) => SaveOutcome::Saved,
            Err(e) => {
                row.error = Some(e.to_string());
                self.restore_editing(row);
                self.record_error("Sauvegarde du tube impossible", e);
                SaveOutcome::Failed
            }
        }
    }

    /// Page-hide hook: start the save of a row left mid-edit. Nothing
    /// guarantees the request completes before the page goes away.
    pub async fn save_on_page_hide(&self) -> SaveOutcome {
        if !self.has_pending_edit() {
            return SaveOutcome::Skipped;
        }
        log!("[tubes] page hidden with a row mid-edit, saving");
        self.save_editing().await
    }

    fn restore_editing(&self, row: EditingRow) {
        {
            let mut s = self.state();
            if s.editing.is_none() {
                s.editing = Some(row);
            }
        }
        self.publish();
    }

    pub async fn create_list(&self) -> SaveOutcome {
        let Some(name) = self.dialogs.prompt(PROMPT_NEW_LIST) else {
            return SaveOutcome::Skipped;
        };
        let name = name.trim();
        if name.is_empty() {
            return SaveOutcome::Skipped;
        }

        match self.repo.create_list(name).await {
            Ok(list) => {
                log!("[tubes] created list {} ({})", list.name, list.id);
                self.load().await;
                SaveOutcome::Saved
            }
            Err(e) => {
                self.record_error("Création de la liste impossible", e);
                SaveOutcome::Failed
            }
        }
    }

    /// Inline title edit. Blank or unchanged names are not sent, so a list
    /// can never be renamed to an empty title (the old page saved it anyway).
    pub async fn rename_list(&self, list_id: &str, name: &str) -> SaveOutcome {
        let name = name.trim();
        let current = self.state().list(list_id).map(|s| s.list.name.clone());
        if name.is_empty() || current.as_deref() == Some(name) {
            return SaveOutcome::Skipped;
        }

        match self.repo.update_list(list_id, name).await {
            Ok(()) => {
                self.load().await;
                SaveOutcome::Saved
            }
            Err(e) => {
                self.record_error("Modification de la liste impossible", e);
                SaveOutcome::Failed
            }
        }
    }

    /// Tubes are removed by the backend cascade.
    pub async fn delete_list(&self, list_id: &str) -> SaveOutcome {
        if !self.dialogs.confirm(CONFIRM_DELETE_LIST) {
            return SaveOutcome::Skipped;
        }

        match self.repo.delete_list(list_id).await {
            Ok(()) => {
                self.load().await;
                SaveOutcome::Saved
            }
            Err(e) => {
                self.record_error("Suppression de la liste impossible", e);
                SaveOutcome::Failed
            }
        }
    }

    pub async fn add_tube(&self, list_id: &str, draft: &TubeDraft) -> SaveOutcome {
        let update = match draft.validate() {
            Ok(u) => u,
            Err(e) => return SaveOutcome::Invalid(e),
        };

        match self.repo.add_tube(NewTube::from_update(list_id, update)).await {
            Ok(()) => {
                self.state().add_form_open.remove(list_id);
                self.load().await;
                SaveOutcome::Saved
            }
            Err(e) => {
                self.record_error("Ajout du tube impossible", e);
                SaveOutcome::Failed
            }
        }
    }

    pub async fn delete_tube(&self, tube_id: &str) -> SaveOutcome {
        if !self.dialogs.confirm(CONFIRM_DELETE_TUBE) {
            return SaveOutcome::Skipped;
        }

        {
            let mut s = self.state();
            if s.editing_id() == Some(tube_id) {
                s.editing = None;
            }
        }

        match self.repo.delete_tube(tube_id).await {
            Ok(()) => {
                self.load().await;
                SaveOutcome::Saved
            }
            Err(e) => {
                self.record_error("Suppression du tube impossible", e);
                SaveOutcome::Failed
            }
        }
    }

    /// Compose the order mail from the cached list snapshot (no backend call).
    pub fn send_order_mail(&self, list_id: &str) -> MailOutcome {
        let (expanded, list) = {
            let s = self.state();
            (s.is_expanded(list_id), s.list(list_id).cloned())
        };

        let Some(list) = list else {
            warn!("[tubes] no snapshot for list {list_id}");
            return MailOutcome::UnknownList;
        };
        if !expanded {
            return MailOutcome::Collapsed;
        }

        match list.order_mail() {
            Some(mail) => {
                let url = mail.mailto_url();
                log!("[tubes] opening order mail for {}", list.list.name);
                self.dialogs.open_url(&url);
                MailOutcome::Opened(url)
            }
            None => {
                self.dialogs.alert(NOTHING_TO_ORDER);
                MailOutcome::NothingToOrder
            }
        }
    }
}

/// Post-render hook: runs synchronously after every render pass.
fn after_render(s: &mut ViewSnapshot) {
    let attached = attach_mail_actions(&mut s.lists);
    if attached > 0 {
        log!("[tubes] order-mail action wired on {attached} list(s)");
    }
}
