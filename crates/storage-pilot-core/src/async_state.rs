//! Load state of data fetched from the cluster

use std::fmt::Display;

/// Idle, in flight, loaded, or failed with the error message
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AsyncState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Error(String),
}

impl<T> AsyncState<T> {
    pub fn from_result<E: Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => AsyncState::Loaded(value),
            Err(e) => AsyncState::Error(e.to_string()),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AsyncState::Loading)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            AsyncState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            AsyncState::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AsyncState<U> {
        match self {
            AsyncState::Idle => AsyncState::Idle,
            AsyncState::Loading => AsyncState::Loading,
            AsyncState::Loaded(value) => AsyncState::Loaded(f(value)),
            AsyncState::Error(e) => AsyncState::Error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_result() {
        let ok: AsyncState<u32> = AsyncState::from_result(Ok::<_, String>(3));
        assert_eq!(ok.loaded(), Some(&3));
        assert_eq!(ok.map(|v| v * 2), AsyncState::Loaded(6));

        let err: AsyncState<u32> = AsyncState::from_result(Err("forbidden"));
        assert_eq!(err.error(), Some("forbidden"));
        assert!(err.loaded().is_none());
    }

    #[test]
    fn test_default_is_idle() {
        let state: AsyncState<()> = AsyncState::default();
        assert_eq!(state, AsyncState::Idle);
        assert!(!state.is_loading());
    }
}
