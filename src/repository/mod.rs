use crate::api::ApiResult;
use crate::models::{NewTube, Tube, TubeList, TubeUpdate};

#[cfg(test)]
pub(crate) mod memory;

/// Narrow CRUD contract over the `lists` and `tubes` tables.
///
/// Reads are ordered by the backend (lists by creation time, tubes by name).
/// Deleting a list cascades to its tubes on the backend side.
///
/// The UI runs on a single-threaded event loop, so futures are not `Send`.
#[allow(async_fn_in_trait)]
pub(crate) trait TubeRepository {
    async fn get_lists(&self) -> ApiResult<Vec<TubeList>>;
    async fn get_tubes(&self) -> ApiResult<Vec<Tube>>;

    async fn create_list(&self, name: &str) -> ApiResult<TubeList>;
    async fn update_list(&self, id: &str, name: &str) -> ApiResult<()>;
    async fn delete_list(&self, id: &str) -> ApiResult<()>;

    async fn add_tube(&self, tube: NewTube) -> ApiResult<()>;
    async fn update_tube(&self, id: &str, update: TubeUpdate) -> ApiResult<Vec<Tube>>;
    async fn delete_tube(&self, id: &str) -> ApiResult<()>;
}
