/// Blocking browser dialogs and navigation used by the list manager.
pub(crate) trait Dialogs {
    fn confirm(&self, message: &str) -> bool;

    /// `None` when the user cancels.
    fn prompt(&self, message: &str) -> Option<String>;

    fn alert(&self, message: &str);

    fn open_url(&self, url: &str);
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct BrowserDialogs;

impl Dialogs for BrowserDialogs {
    fn confirm(&self, message: &str) -> bool {
        web_sys::window()
            .and_then(|w| w.confirm_with_message(message).ok())
            .unwrap_or(false)
    }

    fn prompt(&self, message: &str) -> Option<String> {
        web_sys::window().and_then(|w| w.prompt_with_message(message).ok().flatten())
    }

    fn alert(&self, message: &str) {
        if let Some(w) = web_sys::window() {
            let _ = w.alert_with_message(message);
        }
    }

    fn open_url(&self, url: &str) {
        if let Some(w) = web_sys::window() {
            let _ = w.location().set_href(url);
        }
    }
}
