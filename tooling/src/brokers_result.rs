/*!

`BrokersResult` hands the plugins that a broker resolved from the task that listens for broker
events to the task that waits for them. It is single use: `get` is called once, after that exactly
one of `set_result` or `error` succeeds.

!*/

use crate::error::{self, Error, Result};
use log::{debug, trace};
use snafu::ensure;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{oneshot, Notify};
use tooling_model::ChePlugin;

#[derive(Debug)]
enum State {
    NotStarted,
    Awaiting(oneshot::Sender<Result<Vec<ChePlugin>>>),
    Completed,
}

#[derive(Debug)]
pub struct BrokersResult {
    state: Mutex<State>,
    awaiting: Notify,
}

impl Default for BrokersResult {
    fn default() -> Self {
        Self::new()
    }
}

impl BrokersResult {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::NotStarted),
            awaiting: Notify::new(),
        }
    }

    /// Waits up to `timeout` for a result or an error to be submitted. This must be the first call
    /// on a `BrokersResult` and may be made only once.
    pub async fn get(&self, timeout: Duration) -> Result<Vec<ChePlugin>> {
        let receiver = {
            let mut state = self.lock();
            ensure!(
                matches!(*state, State::NotStarted),
                error::ResultGetCalledTwiceSnafu
            );
            let (sender, receiver) = oneshot::channel();
            *state = State::Awaiting(sender);
            receiver
        };
        self.awaiting.notify_waiters();
        trace!("Waiting up to {:?} for the broker result", timeout);
        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => error::ResultDroppedSnafu.fail().map_err(Into::into),
            Err(_) => error::ResultTimeoutSnafu { timeout }.fail().map_err(Into::into),
        }
    }

    /// Completes the wait with `plugins`. Fails if `get` has not been called yet or if the wait
    /// has already been completed.
    pub fn set_result(&self, plugins: &[ChePlugin]) -> Result<()> {
        self.complete("set_result", Ok(plugins.to_vec()))
    }

    /// Completes the wait with `error`. Fails if `get` has not been called yet or if the wait has
    /// already been completed.
    pub fn error(&self, error: Error) -> Result<()> {
        self.complete("error", Err(error))
    }

    /// Resolves once `get` has been called.
    pub async fn awaiting(&self) {
        loop {
            let notified = self.awaiting.notified();
            let started = !matches!(*self.lock(), State::NotStarted);
            if started {
                return;
            }
            notified.await;
        }
    }

    fn complete(&self, operation: &str, result: Result<Vec<ChePlugin>>) -> Result<()> {
        let mut state = self.lock();
        match std::mem::replace(&mut *state, State::Completed) {
            State::Awaiting(sender) => {
                if sender.send(result).is_err() {
                    debug!("The broker result was submitted after the waiter gave up");
                }
                Ok(())
            }
            State::NotStarted => {
                *state = State::NotStarted;
                error::ResultNotAwaitingSnafu { operation }
                    .fail()
                    .map_err(Into::into)
            }
            State::Completed => error::ResultAlreadyCompletedSnafu.fail().map_err(Into::into),
        }
    }

    /// The state is never left half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::Arc;

    fn plugins() -> Vec<ChePlugin> {
        vec![ChePlugin {
            id: "eclipse/theia/next".to_string(),
            ..ChePlugin::default()
        }]
    }

    fn broker_failure() -> Error {
        error::BrokerFailedSnafu {
            workspace_id: "workspace1",
            message: "boom",
        }
        .build()
        .into()
    }

    #[test]
    fn completion_before_get_fails() {
        let result = BrokersResult::new();
        assert_eq!(
            result.set_result(&plugins()).unwrap_err().kind(),
            ErrorKind::ProtocolViolation
        );
        assert_eq!(
            result.error(broker_failure()).unwrap_err().kind(),
            ErrorKind::ProtocolViolation
        );
    }

    #[tokio::test]
    async fn get_returns_submitted_plugins() {
        let result = Arc::new(BrokersResult::new());
        let listener = result.clone();
        let handle = tokio::spawn(async move {
            listener.awaiting().await;
            listener.set_result(&plugins())
        });
        let plugins = result.get(Duration::from_secs(5)).await.unwrap();
        assert_eq!(plugins[0].id, "eclipse/theia/next");
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn get_returns_submitted_error() {
        let result = Arc::new(BrokersResult::new());
        let listener = result.clone();
        tokio::spawn(async move {
            listener.awaiting().await;
            listener.error(broker_failure()).unwrap();
        });
        let error = result.get(Duration::from_secs(5)).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Infrastructure);
    }

    #[tokio::test]
    async fn only_one_completion_succeeds() {
        let result = Arc::new(BrokersResult::new());
        let waiter = result.clone();
        let handle = tokio::spawn(async move { waiter.get(Duration::from_secs(5)).await });
        result.awaiting().await;
        result.set_result(&plugins()).unwrap();
        assert_eq!(
            result.set_result(&plugins()).unwrap_err().kind(),
            ErrorKind::ProtocolViolation
        );
        assert_eq!(
            result.error(broker_failure()).unwrap_err().kind(),
            ErrorKind::ProtocolViolation
        );
        assert_eq!(handle.await.unwrap().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_get_fails() {
        let result = Arc::new(BrokersResult::new());
        let waiter = result.clone();
        let handle = tokio::spawn(async move { waiter.get(Duration::from_millis(50)).await });
        result.awaiting().await;
        assert_eq!(
            result
                .get(Duration::from_secs(1))
                .await
                .unwrap_err()
                .kind(),
            ErrorKind::ProtocolViolation
        );
        assert_eq!(
            handle.await.unwrap().unwrap_err().kind(),
            ErrorKind::Timeout
        );
    }

    #[tokio::test(start_paused = true)]
    async fn get_times_out_without_completion() {
        let result = BrokersResult::new();
        let error = result
            .get(Duration::from_secs(5 * 60))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Timeout);
    }
}
