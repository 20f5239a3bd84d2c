use crate::brokers_result::BrokersResult;
use crate::error::Result;
use log::debug;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tooling_model::{ChePlugin, KubernetesEnvironment, RuntimeIdentity};

/// The state that the phases of one broker run share.
pub(crate) struct BrokerContext {
    pub(crate) identity: RuntimeIdentity,
    /// Ephemeral workspaces have no storage to prepare.
    pub(crate) ephemeral: bool,
    pub(crate) broker_environment: KubernetesEnvironment,
    pub(crate) brokers_result: Arc<BrokersResult>,
    /// The task that feeds broker events into `brokers_result`.
    pub(crate) listener: Option<JoinHandle<()>>,
    pub(crate) plugins: Option<Vec<ChePlugin>>,
}

impl BrokerContext {
    pub(crate) fn new(
        identity: RuntimeIdentity,
        ephemeral: bool,
        broker_environment: KubernetesEnvironment,
    ) -> Self {
        Self {
            identity,
            ephemeral,
            broker_environment,
            brokers_result: Arc::new(BrokersResult::new()),
            listener: None,
            plugins: None,
        }
    }
}

impl Drop for BrokerContext {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

/// One step of a broker run.
#[async_trait::async_trait]
pub(crate) trait BrokerPhase: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(&self, context: &mut BrokerContext) -> Result<()>;
}

/// Executes `phases` in order. A phase runs only if every phase before it succeeded.
pub(crate) async fn run_phases(
    phases: &[Box<dyn BrokerPhase>],
    context: &mut BrokerContext,
) -> Result<()> {
    for phase in phases {
        debug!(
            "Running broker phase '{}' for workspace '{}'",
            phase.name(),
            context.identity.workspace_id
        );
        phase.execute(context).await?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::{self, ErrorKind};
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        fail: bool,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait::async_trait]
    impl BrokerPhase for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn execute(&self, context: &mut BrokerContext) -> Result<()> {
            self.log.lock().unwrap().push(self.name);
            if self.fail {
                return error::BrokerFailedSnafu {
                    workspace_id: &context.identity.workspace_id,
                    message: self.name,
                }
                .fail()
                .map_err(Into::into);
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn phases_stop_at_first_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let phase = |name, fail| -> Box<dyn BrokerPhase> {
            Box::new(Recorder {
                name,
                fail,
                log: log.clone(),
            })
        };
        let phases = vec![phase("one", false), phase("two", true), phase("three", false)];
        let mut context = BrokerContext::new(
            RuntimeIdentity::default(),
            false,
            KubernetesEnvironment::default(),
        );
        let error = run_phases(&phases, &mut context).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Infrastructure);
        assert_eq!(*log.lock().unwrap(), vec!["one", "two"]);
    }
}
