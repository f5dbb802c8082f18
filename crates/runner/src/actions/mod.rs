//! Built-in actions
//!
//! Each action states its parameter schema up front through
//! [`Parameters`](stitch_common::Parameters), so a step with bad parameters
//! fails before the session is touched. Session failures are wrapped with the
//! action's own context, e.g. `Failed to click "#submit": <cause>`.

use std::sync::Arc;

use crate::registry::Action;

mod assertion;
mod interaction;
mod navigation;
mod page;
mod tabs;
mod waiting;

pub use assertion::{ExpectHidden, ExpectText, ExpectTitle, ExpectUrl, ExpectVisible};
pub use interaction::{Click, Fill, Hover, Press, Type};
pub use navigation::{Goto, NavigateToPage};
pub use page::{ExecuteJavaScript, LoadAuthState, SaveAuthState, Screenshot};
pub use tabs::{CloseTab, OpenNewTab, SwitchToTab};
pub use waiting::{Wait, WaitForLoadState, WaitForNetwork, WaitForSelector};

/// Default timeout for element interactions and assertions
pub(crate) const ELEMENT_TIMEOUT_MS: u64 = 10_000;

/// Default timeout for explicit waits
pub(crate) const WAIT_TIMEOUT_MS: u64 = 30_000;

pub(crate) fn builtin() -> Vec<Arc<dyn Action>> {
    vec![
        Arc::new(Goto),
        Arc::new(NavigateToPage),
        Arc::new(Click),
        Arc::new(Fill),
        Arc::new(Type),
        Arc::new(Press),
        Arc::new(Hover),
        Arc::new(ExpectTitle),
        Arc::new(ExpectVisible),
        Arc::new(ExpectHidden),
        Arc::new(ExpectText),
        Arc::new(ExpectUrl),
        Arc::new(Screenshot),
        Arc::new(Wait),
        Arc::new(WaitForSelector),
        Arc::new(WaitForLoadState),
        Arc::new(WaitForNetwork::response()),
        Arc::new(WaitForNetwork::request()),
        Arc::new(OpenNewTab),
        Arc::new(SwitchToTab),
        Arc::new(CloseTab),
        Arc::new(ExecuteJavaScript),
        Arc::new(SaveAuthState),
        Arc::new(LoadAuthState),
    ]
}
