use super::TubeRepository;
use crate::api::{ApiError, ApiResult};
use crate::models::{NewTube, Tube, TubeList, TubeUpdate};
use std::sync::Mutex;

/// Calls recorded by [`MemoryRepository`], in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    GetLists,
    GetTubes,
    CreateList(String),
    UpdateList(String, String),
    DeleteList(String),
    AddTube(NewTube),
    UpdateTube(String, TubeUpdate),
    DeleteTube(String),
}

/// In-memory backend double that mimics the ordering and cascade rules.
#[derive(Default)]
pub(crate) struct MemoryRepository {
    lists: Mutex<Vec<TubeList>>,
    tubes: Mutex<Vec<Tube>>,
    calls: Mutex<Vec<Call>>,
    next_id: Mutex<u32>,
    fail_reads: Mutex<bool>,
    fail_updates: Mutex<bool>,
}

impl MemoryRepository {
    pub fn with_data(lists: Vec<TubeList>, tubes: Vec<Tube>) -> Self {
        Self {
            lists: Mutex::new(lists),
            tubes: Mutex::new(tubes),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut c) = self.calls.lock() {
            c.clear();
        }
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|&c| pred(c)).count()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        if let Ok(mut f) = self.fail_reads.lock() {
            *f = fail;
        }
    }

    pub fn set_fail_updates(&self, fail: bool) {
        if let Ok(mut f) = self.fail_updates.lock() {
            *f = fail;
        }
    }

    /// Simulate a change made by another client.
    pub fn set_quantity_externally(&self, tube_id: &str, quantity: i64) {
        if let Ok(mut tubes) = self.tubes.lock() {
            if let Some(t) = tubes.iter_mut().find(|t| t.id == tube_id) {
                t.quantity = quantity;
            }
        }
    }

    pub fn tube(&self, tube_id: &str) -> Option<Tube> {
        self.tubes
            .lock()
            .ok()
            .and_then(|t| t.iter().find(|t| t.id == tube_id).cloned())
    }

    fn record(&self, call: Call) {
        if let Ok(mut c) = self.calls.lock() {
            c.push(call);
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut n = self.next_id.lock().unwrap_or_else(|e| e.into_inner());
        *n += 1;
        format!("{prefix}-{}", *n)
    }

    fn check_reads(&self) -> ApiResult<()> {
        if self.fail_reads.lock().map(|f| *f).unwrap_or(false) {
            return Err(ApiError::network_message("connection refused"));
        }
        Ok(())
    }
}

impl TubeRepository for MemoryRepository {
    async fn get_lists(&self) -> ApiResult<Vec<TubeList>> {
        self.record(Call::GetLists);
        self.check_reads()?;
        let mut lists = self.lists.lock().map(|l| l.clone()).unwrap_or_default();
        lists.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(lists)
    }

    async fn get_tubes(&self) -> ApiResult<Vec<Tube>> {
        self.record(Call::GetTubes);
        self.check_reads()?;
        let mut tubes = self.tubes.lock().map(|t| t.clone()).unwrap_or_default();
        tubes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tubes)
    }

    async fn create_list(&self, name: &str) -> ApiResult<TubeList> {
        self.record(Call::CreateList(name.to_string()));
        let id = self.next_id("list");
        let list = TubeList {
            created_at: format!("9999-{id}"),
            id,
            name: name.to_string(),
        };
        if let Ok(mut lists) = self.lists.lock() {
            lists.push(list.clone());
        }
        Ok(list)
    }

    async fn update_list(&self, id: &str, name: &str) -> ApiResult<()> {
        self.record(Call::UpdateList(id.to_string(), name.to_string()));
        if let Ok(mut lists) = self.lists.lock() {
            if let Some(l) = lists.iter_mut().find(|l| l.id == id) {
                l.name = name.to_string();
            }
        }
        Ok(())
    }

    async fn delete_list(&self, id: &str) -> ApiResult<()> {
        self.record(Call::DeleteList(id.to_string()));
        if let Ok(mut lists) = self.lists.lock() {
            lists.retain(|l| l.id != id);
        }
        if let Ok(mut tubes) = self.tubes.lock() {
            tubes.retain(|t| t.list_id != id);
        }
        Ok(())
    }

    async fn add_tube(&self, tube: NewTube) -> ApiResult<()> {
        self.record(Call::AddTube(tube.clone()));
        let id = self.next_id("tube");
        if let Ok(mut tubes) = self.tubes.lock() {
            tubes.push(Tube {
                id,
                list_id: tube.list_id,
                name: tube.name,
                esp: tube.esp,
                usage: tube.usage,
                quantity: tube.quantity,
                stock_mini: tube.stock_mini,
            });
        }
        Ok(())
    }

    async fn update_tube(&self, id: &str, update: TubeUpdate) -> ApiResult<Vec<Tube>> {
        self.record(Call::UpdateTube(id.to_string(), update.clone()));
        if self.fail_updates.lock().map(|f| *f).unwrap_or(false) {
            return Err(ApiError::network_message("connection reset"));
        }
        let mut out = Vec::new();
        if let Ok(mut tubes) = self.tubes.lock() {
            if let Some(t) = tubes.iter_mut().find(|t| t.id == id) {
                t.name = update.name;
                t.esp = update.esp;
                t.usage = update.usage;
                t.quantity = update.quantity;
                t.stock_mini = update.stock_mini;
                out.push(t.clone());
            }
        }
        Ok(out)
    }

    async fn delete_tube(&self, id: &str) -> ApiResult<()> {
        self.record(Call::DeleteTube(id.to_string()));
        if let Ok(mut tubes) = self.tubes.lock() {
            tubes.retain(|t| t.id != id);
        }
        Ok(())
    }
}
