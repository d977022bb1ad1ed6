//! Client-side state containers.
//!
//! Each store owns its state exclusively and publishes snapshots through a
//! [`tokio::sync::watch`] channel; views subscribe instead of reading fields.

pub mod session;
pub mod survey;
pub mod survey_list;

use std::future::Future;

use tokio::sync::watch;

use crate::error::ClientResult;

/// State shapes carrying the usual `loading` / `error` pair.
pub(crate) trait Tracked {
    /// Number of operations currently running against the store.
    fn in_flight(&mut self) -> &mut usize;
    fn set_loading(&mut self, loading: bool);
    fn set_error(&mut self, error: String);
}

/// Holds `loading = true` for its lifetime. The flag drops back to `false`
/// when the last overlapping guard of the store is released, whichever way
/// the operations exit.
pub(crate) struct LoadingGuard<'a, S: Tracked> {
    state: &'a watch::Sender<S>,
}

impl<'a, S: Tracked> LoadingGuard<'a, S> {
    pub(crate) fn start(state: &'a watch::Sender<S>) -> Self {
        state.send_modify(|s| {
            *s.in_flight() += 1;
            s.set_loading(true);
        });
        Self { state }
    }
}

impl<S: Tracked> Drop for LoadingGuard<'_, S> {
    fn drop(&mut self) {
        self.state.send_modify(|s| {
            let running = s.in_flight();
            *running = running.saturating_sub(1);
            if *running == 0 {
                s.set_loading(false);
            }
        });
    }
}

/// Runs a store operation: clears the previous error, flags loading, and
/// records the failure message before handing the error back to the caller.
pub(crate) async fn tracked<S, T, F>(state: &watch::Sender<S>, operation: F) -> ClientResult<T>
where
    S: Tracked,
    F: Future<Output = ClientResult<T>>,
{
    let _loading = LoadingGuard::start(state);
    state.send_modify(|s| s.set_error(String::new()));
    let result = operation.await;
    if let Err(err) = &result {
        let message = err.user_message();
        state.send_modify(|s| s.set_error(message));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Probe {
        in_flight: usize,
        loading: bool,
        error: String,
    }

    impl Tracked for Probe {
        fn in_flight(&mut self) -> &mut usize {
            &mut self.in_flight
        }

        fn set_loading(&mut self, loading: bool) {
            self.loading = loading;
        }

        fn set_error(&mut self, error: String) {
            self.error = error;
        }
    }

    #[tokio::test]
    async fn test_tracked_resets_loading_and_records_error() {
        let (state, rx) = watch::channel(Probe {
            error: "old".into(),
            ..Probe::default()
        });

        let result: ClientResult<()> = tracked(&state, async {
            assert!(rx.borrow().loading);
            assert!(rx.borrow().error.is_empty());
            Err(ClientError::Application("falló".into()))
        })
        .await;

        assert!(result.is_err());
        assert!(!rx.borrow().loading);
        assert_eq!(rx.borrow().error, "falló");
    }

    #[tokio::test]
    async fn test_loading_reset_when_future_is_dropped() {
        let (state, rx) = watch::channel(Probe::default());
        {
            let pending = tracked(&state, std::future::pending::<ClientResult<()>>());
            let _ = tokio::time::timeout(std::time::Duration::from_millis(10), pending).await;
        }
        assert!(!rx.borrow().loading);
    }

    #[test]
    fn test_loading_held_until_last_overlapping_operation_ends() {
        let (state, rx) = watch::channel(Probe::default());

        let fetch = LoadingGuard::start(&state);
        let delete = LoadingGuard::start(&state);
        drop(fetch);
        assert!(rx.borrow().loading);
        assert_eq!(rx.borrow().in_flight, 1);

        drop(delete);
        assert!(!rx.borrow().loading);
        assert_eq!(rx.borrow().in_flight, 0);
    }

    #[tokio::test]
    async fn test_overlapping_tracked_operations_share_loading() {
        let (state, rx) = watch::channel(Probe::default());
        let (release, released) = tokio::sync::oneshot::channel::<()>();

        let slow = tracked(&state, async {
            released.await.ok();
            Ok::<_, ClientError>(())
        });
        let fast = async {
            tokio::task::yield_now().await;
            let result = tracked(&state, async { Ok::<_, ClientError>(()) }).await;
            assert!(rx.borrow().loading);
            release.send(()).ok();
            result
        };

        let (slow, fast) = tokio::join!(slow, fast);
        assert!(slow.is_ok() && fast.is_ok());
        assert!(!rx.borrow().loading);
    }
}
