//! Store-then-notify for one accepted submission.

use std::sync::Arc;

use crate::mailer::Mailer;
use crate::store::AppendStore;
use crate::submission::Submission;

/// Runs persist + send for accepted submissions, isolating the failure of
/// each step: a store failure does not suppress the send attempt, a send
/// failure does not roll back the stored record, and neither is retried.
///
/// The intake boundary replies to the submitter before delivery runs, so
/// both kinds of failure are observable only through logs. That is the
/// contract: "accepted for processing", not "confirmed delivered".
pub struct DeliveryCoordinator {
    store: Arc<AppendStore>,
    mailer: Arc<dyn Mailer>,
}

impl DeliveryCoordinator {
    pub fn new(store: Arc<AppendStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self { store, mailer }
    }

    /// Spawn [`run`](Self::run) on `runtime` as a fire-and-forget task.
    /// There is no return channel back to the request that triggered it.
    pub fn spawn(self: &Arc<Self>, runtime: &tokio::runtime::Handle, submission: Submission) {
        let coordinator = Arc::clone(self);
        runtime.spawn(async move {
            coordinator.run(submission).await;
        });
    }

    /// Persist the submission, then forward it, regardless of whether the
    /// persist succeeded. Neither step is cancellable once started.
    pub async fn run(&self, submission: Submission) {
        if let Err(error) = self.store.append(&submission).await {
            tracing::error!(
                error = %error,
                email = %submission.email,
                "failed to record submission in the store"
            );
        }

        if let Err(error) = self.mailer.send_message(&submission).await {
            tracing::error!(
                error = %error,
                email = %submission.email,
                "failed to forward submission over mail"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::mailer::MailError;

    /// Records every submission it is asked to send; optionally fails.
    struct RecordingMailer {
        sent: Mutex<Vec<Submission>>,
        fail: bool,
    }

    impl RecordingMailer {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail,
            })
        }

        fn sent(&self) -> Vec<Submission> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_message(&self, submission: &Submission) -> Result<(), MailError> {
            self.sent.lock().unwrap().push(submission.clone());
            if self.fail {
                Err(MailError::Other("recording mailer set to fail".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn submission() -> Submission {
        Submission {
            subject: "A subject line".to_string(),
            fullname: "Jane Doe".to_string(),
            email: "jane.doe@example.com".to_string(),
            business: "Acme Corp".to_string(),
            body: "A body long enough to be delivered.".to_string(),
            details: "None".to_string(),
        }
    }

    #[tokio::test]
    async fn run_persists_then_sends() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = Arc::new(AppendStore::open(tmp.path().join("storage.json")).unwrap());
        let mailer = RecordingMailer::new(false);
        let coordinator =
            DeliveryCoordinator::new(Arc::clone(&store), Arc::clone(&mailer) as Arc<dyn Mailer>);

        coordinator.run(submission()).await;

        let stored: Vec<Submission> =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(stored, vec![submission()]);
        assert_eq!(mailer.sent(), vec![submission()]);
    }

    #[tokio::test]
    async fn store_failure_does_not_suppress_the_send() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("storage.json");
        let store = Arc::new(AppendStore::open(&path).unwrap());
        // Corrupt the file so the append fails its probe.
        std::fs::write(&path, b"garbage").unwrap();

        let mailer = RecordingMailer::new(false);
        let coordinator =
            DeliveryCoordinator::new(store, Arc::clone(&mailer) as Arc<dyn Mailer>);

        coordinator.run(submission()).await;

        assert_eq!(mailer.sent(), vec![submission()]);
    }

    #[tokio::test]
    async fn send_failure_does_not_roll_back_the_stored_record() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = Arc::new(AppendStore::open(tmp.path().join("storage.json")).unwrap());
        let mailer = RecordingMailer::new(true);
        let coordinator =
            DeliveryCoordinator::new(Arc::clone(&store), Arc::clone(&mailer) as Arc<dyn Mailer>);

        coordinator.run(submission()).await;

        let stored: Vec<Submission> =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(stored, vec![submission()]);
    }

    #[tokio::test]
    async fn spawn_runs_the_delivery_to_completion() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = Arc::new(AppendStore::open(tmp.path().join("storage.json")).unwrap());
        let mailer = RecordingMailer::new(false);
        let coordinator = Arc::new(DeliveryCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&mailer) as Arc<dyn Mailer>,
        ));

        coordinator.spawn(&tokio::runtime::Handle::current(), submission());

        // Fire-and-forget: poll for the observable side effect.
        for _ in 0..100 {
            if !mailer.sent().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(mailer.sent(), vec![submission()]);
    }
}
