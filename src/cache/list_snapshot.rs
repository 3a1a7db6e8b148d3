use crate::models::{Tube, TubeList};
use crate::order::OrderMail;

/// Denormalized copy of one list and its tubes, as of the last load.
///
/// Order mails are built from this without re-querying the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ListSnapshot {
    pub list: TubeList,
    pub tubes: Vec<Tube>,

    /// Set by the post-render hook once the order-mail action is wired.
    pub mail_action: bool,
}

impl ListSnapshot {
    pub fn new(list: TubeList, tubes: Vec<Tube>) -> Self {
        Self {
            list,
            tubes,
            mail_action: false,
        }
    }

    pub fn total_quantity(&self) -> i64 {
        self.tubes.iter().map(|t| t.quantity).sum()
    }

    pub fn count_label(&self) -> String {
        let total = self.total_quantity();
        format!("{} tube{}", total, if total != 1 { "s" } else { "" })
    }

    pub fn order_mail(&self) -> Option<OrderMail> {
        OrderMail::compose(&self.list.name, &self.tubes)
    }
}

/// Group tubes under their owning list.
///
/// Keeps the backend ordering of both inputs. Tubes whose `list_id` matches
/// no list are dropped.
pub(crate) fn partition_by_list(lists: Vec<TubeList>, tubes: Vec<Tube>) -> Vec<ListSnapshot> {
    let mut out: Vec<ListSnapshot> = lists
        .into_iter()
        .map(|l| ListSnapshot::new(l, Vec::new()))
        .collect();

    for t in tubes {
        if let Some(s) = out.iter_mut().find(|s| s.list.id == t.list_id) {
            s.tubes.push(t);
        }
    }

    out
}

/// Wire the order-mail action on every list that lacks one.
///
/// Idempotent; returns how many lists were newly wired.
pub(crate) fn attach_mail_actions(lists: &mut [ListSnapshot]) -> usize {
    let mut attached = 0;
    for s in lists.iter_mut().filter(|s| !s.mail_action) {
        s.mail_action = true;
        attached += 1;
    }
    attached
}
