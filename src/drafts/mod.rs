mod tube;

pub(crate) use tube::{DraftError, TubeDraft, TubeField};
