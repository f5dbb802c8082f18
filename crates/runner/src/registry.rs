//! Action trait and the registry of built-in actions

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use stitch_common::Parameters;

use crate::actions;
use crate::error::RunnerResult;
use crate::session::BrowserSession;

/// A named unit of work executed against the session
#[async_trait]
pub trait Action: Send + Sync {
    /// Name that steps refer to in their `block` field
    fn name(&self) -> &'static str;

    /// One-line summary shown by `stitch --list-blocks`
    fn description(&self) -> &'static str;

    /// Validate `params`, then drive the session
    async fn run(&self, session: &dyn BrowserSession, params: &Parameters) -> RunnerResult<()>;
}

/// Immutable name to action map
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: BTreeMap<&'static str, Arc<dyn Action>>,
}

impl ActionRegistry {
    /// Registry holding every built-in action
    pub fn builtin() -> Self {
        Self::from_actions(actions::builtin())
    }

    /// Registry holding exactly `actions`; later duplicates replace earlier ones
    pub fn from_actions(actions: impl IntoIterator<Item = Arc<dyn Action>>) -> Self {
        let actions = actions
            .into_iter()
            .map(|action| (action.name(), action))
            .collect();
        Self { actions }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&'static str> {
        self.actions.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Action>> {
        self.actions.values()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}
