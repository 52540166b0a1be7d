//! Transition hooks

use std::fmt;
use std::sync::Arc;

/// Hook receiving the circuit name
pub type TransitionHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Circuit transitions observable through hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A failure left the counter above the threshold (first trip or failed trial)
    Opened,
    /// The gate admitted a trial call after the backoff window elapsed
    HalfOpened,
    /// A success reset a counter that was above the threshold
    Closed,
}

/// Hooks registered on a breaker; called outside of the state lock
#[derive(Clone, Default)]
pub struct Callbacks {
    pub on_open: Option<TransitionHook>,
    pub on_half_open: Option<TransitionHook>,
    pub on_close: Option<TransitionHook>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fire(&self, transition: Transition, circuit: &str) {
        let hook = match transition {
            Transition::Opened => &self.on_open,
            Transition::HalfOpened => &self.on_half_open,
            Transition::Closed => &self.on_close,
        };
        if let Some(hook) = hook {
            hook(circuit);
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_open", &self.on_open.is_some())
            .field("on_half_open", &self.on_half_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}
