use super::LedgerError;

/// Lifecycle of one consumer of the ledger (a summary view, a list view...).
///
/// ```text
/// Uninitialized -> Initializing -> Ready | Failed
/// Ready -> Refreshing -> Ready
/// Failed -> Initializing   (user retries)
/// ```
///
/// A failed refresh keeps the last loaded data and records the error instead
/// of moving to `Failed`.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenState<T> {
    Uninitialized,
    Initializing,
    Ready { data: T, error: Option<String> },
    Refreshing { data: T },
    Failed { error: String },
}

#[derive(Debug)]
pub struct Screen<T> {
    state: ScreenState<T>,
}

impl<T> Default for Screen<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Screen<T> {
    pub fn new() -> Self {
        Self {
            state: ScreenState::Uninitialized,
        }
    }

    pub fn state(&self) -> &ScreenState<T> {
        &self.state
    }

    /// Start the initial load, or retry after a failure.
    /// Returns `false` if a load is not allowed from the current state.
    pub fn begin_load(&mut self) -> bool {
        match self.state {
            ScreenState::Uninitialized | ScreenState::Failed { .. } => {
                self.state = ScreenState::Initializing;
                true
            }
            _ => false,
        }
    }

    /// Start a refresh of already loaded data.
    /// Returns `false` unless the screen is `Ready`.
    pub fn begin_refresh(&mut self) -> bool {
        match std::mem::replace(&mut self.state, ScreenState::Uninitialized) {
            ScreenState::Ready { data, .. } => {
                self.state = ScreenState::Refreshing { data };
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    /// Drop a pending refresh, keeping the data on screen.
    pub fn cancel_refresh(&mut self) {
        match std::mem::replace(&mut self.state, ScreenState::Uninitialized) {
            ScreenState::Refreshing { data } => {
                self.state = ScreenState::Ready { data, error: None };
            }
            other => self.state = other,
        }
    }

    /// Apply the outcome of the pending load or refresh.
    /// Results that arrive when nothing is pending are ignored.
    pub fn finish(&mut self, result: Result<T, LedgerError>) {
        self.state = match (std::mem::replace(&mut self.state, ScreenState::Uninitialized), result) {
            (ScreenState::Initializing, Ok(data)) => ScreenState::Ready { data, error: None },
            (ScreenState::Initializing, Err(err)) => ScreenState::Failed {
                error: err.to_string(),
            },
            (ScreenState::Refreshing { .. }, Ok(data)) => ScreenState::Ready { data, error: None },
            (ScreenState::Refreshing { data }, Err(err)) => ScreenState::Ready {
                data,
                error: Some(err.to_string()),
            },
            (other, _) => other,
        };
    }

    /// The data currently on display, if any.
    pub fn data(&self) -> Option<&T> {
        match &self.state {
            ScreenState::Ready { data, .. } | ScreenState::Refreshing { data } => Some(data),
            _ => None,
        }
    }

    /// The error to surface, either fatal or from the last refresh.
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            ScreenState::Ready { error, .. } => error.as_deref(),
            ScreenState::Failed { error } => Some(error),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, ScreenState::Failed { .. })
    }
}
