pub(crate) mod list_snapshot;

pub(crate) use list_snapshot::{attach_mail_actions, partition_by_list, ListSnapshot};
