use host::HostError;
use scheduler::SchedulerError;
use thiserror::Error;

/// Misuse of the hooks API detected while rendering a component.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("hook {index} in `{component}` was a {previous} hook and is now a {current} hook")]
    KindMismatch {
        component: String,
        index: usize,
        previous: &'static str,
        current: &'static str,
    },
    #[error("hook {index} in `{component}` changed its value type")]
    TypeMismatch { component: String, index: usize },
    #[error("`{component}` called {current} hooks, previous render called {previous}")]
    CountMismatch {
        component: String,
        previous: usize,
        current: usize,
    },
}

/// Failure returned by a component's render function.
#[derive(Debug, Error)]
pub enum ComponentError {
    #[error(transparent)]
    Hook(#[from] HookError),
    #[error("{0}")]
    Message(String),
}

impl ComponentError {
    pub fn msg(message: impl Into<String>) -> Self {
        ComponentError::Message(message.into())
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("component `{component}` failed to render")]
    Component {
        component: String,
        #[source]
        source: ComponentError,
    },
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("malformed element: {0}")]
    MalformedElement(String),
    #[error("prop `{key}` names an event but does not hold a listener")]
    NotAListener { key: String },
    #[error("fiber `{0}` has no host ancestor")]
    Orphan(String),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

impl RenderError {
    /// The hook misuse behind this error, if any.
    pub fn hook_error(&self) -> Option<&HookError> {
        match self {
            RenderError::Component {
                source: ComponentError::Hook(err),
                ..
            } => Some(err),
            _ => None,
        }
    }
}
