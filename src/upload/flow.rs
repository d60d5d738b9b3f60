//! What happens when the user presses "Upload file".

use super::client::{UploadClient, UploadError};
use super::types::{SelectedFile, UploadOutcome};
use crate::notify::{Notification, NotificationBus};
use crate::query::QueryClient;

#[derive(Clone)]
pub struct UploadFlow {
    client: UploadClient,
    bus: NotificationBus,
    query: QueryClient,
    notify_transfer_errors: bool,
}

impl UploadFlow {
    pub fn new(client: UploadClient, bus: NotificationBus, query: QueryClient) -> Self {
        Self {
            client,
            bus,
            query,
            notify_transfer_errors: false,
        }
    }

    /// Also toast transfer failures instead of only logging them.
    pub fn with_transfer_notifications(mut self, enabled: bool) -> Self {
        self.notify_transfer_errors = enabled;
        self
    }

    /// Asks the backend for a destination. Failures are toasted and come back as `None`.
    pub async fn request_destination(&self, resource_url: &str, file_name: &str) -> Option<String> {
        let result = self
            .query
            .mutate(async {
                match self.client.request_destination(resource_url, file_name).await {
                    Ok(destination) => {
                        log::info!("Authorization: OK");
                        Ok::<_, UploadError>(Some(destination))
                    }
                    Err(e) => {
                        log::error!("Destination request to {resource_url} failed: {e}");
                        self.bus.publish_notification(Notification::error(e.user_message()));
                        Ok(None)
                    }
                }
            })
            .await;

        result.ok().flatten()
    }

    pub async fn transfer(&self, destination: &str, file: &SelectedFile) -> Result<(), UploadError> {
        log::info!("File to upload: {}", file.name);
        log::info!("Uploading to: {destination}");

        match self.client.transfer_file(destination, file.bytes.clone()).await {
            Ok(()) => {
                log::info!("Uploading complete: {} ({} bytes)", file.name, file.size());
                Ok(())
            }
            Err(e) => {
                log::error!("Uploading error: {e}");
                if self.notify_transfer_errors {
                    self.bus.publish_notification(Notification::error(e.user_message()));
                }
                Err(e)
            }
        }
    }

    /// Destination request, then transfer. Never transfers without a destination.
    pub async fn upload(&self, resource_url: &str, file: &SelectedFile) -> UploadOutcome {
        log::info!("uploadFile to {resource_url}");

        let Some(destination) = self.request_destination(resource_url, &file.name).await else {
            return UploadOutcome::NoDestination;
        };

        match self.transfer(&destination, file).await {
            Ok(()) => UploadOutcome::Completed,
            Err(e) => UploadOutcome::TransferFailed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;
    use crate::notify::Severity;
    use crate::query::QueryPolicy;
    use crate::upload::client::tests::capture_server;
    use crate::upload::credentials::StaticToken;
    use std::sync::{Arc, Mutex};

    struct Harness {
        flow: UploadFlow,
        bus: NotificationBus,
        seen: Arc<Mutex<Vec<Notification>>>,
        _subscription: crate::notify::Subscription,
    }

    fn harness(base_url: &str, token: StaticToken) -> Harness {
        let bus = NotificationBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let subscription = bus.subscribe(move |n| sink.lock().unwrap().push(n.clone()));

        let hook_bus = bus.clone();
        let query = QueryClient::new(QueryPolicy::default())
            .with_mutation_error_hook(move |message| hook_bus.publish(message, Severity::Error));
        let client = UploadClient::new(Some(base_url), Arc::new(token)).unwrap();

        Harness {
            flow: UploadFlow::new(client, bus.clone(), query),
            bus,
            seen,
            _subscription: subscription,
        }
    }

    #[tokio::test]
    async fn uploads_through_destination() {
        let backend = MockBackend::start("/api/products/import").await.unwrap();
        let h = harness(backend.base_url(), StaticToken::new("abc"));
        let file = SelectedFile::new("data.csv", b"sku,qty\nA1,3\n".to_vec());

        let outcome = h.flow.upload("/api/products/import", &file).await;

        assert_eq!(outcome, UploadOutcome::Completed);
        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].target, "/api/products/import?name=data.csv");
        assert_eq!(requests[0].header("authorization"), Some("Basic abc"));
        assert_eq!(requests[1].method, "PUT");
        assert!(requests[1].target.starts_with("/uploads/"));
        assert_eq!(requests[1].body, file.bytes);
        assert!(h.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn forbidden_destination_is_toasted_once_and_nothing_is_sent() {
        let (url, handle) = capture_server(403, r#"{"message":"Forbidden"}"#).await;
        let h = harness(&url, StaticToken::new("abc"));
        let file = SelectedFile::new("data.csv", vec![1]);

        let outcome = h.flow.upload("/api/products/import", &file).await;
        let request = handle.await.unwrap();

        assert_eq!(outcome, UploadOutcome::NoDestination);
        assert_eq!(request.method, "GET");
        assert_eq!(
            *h.seen.lock().unwrap(),
            vec![Notification::error("403 Forbidden")]
        );
    }

    #[tokio::test]
    async fn unauthorized_destination_is_toasted() {
        let (url, handle) = capture_server(401, "").await;
        let h = harness(&url, StaticToken::none());

        let destination = h.flow.request_destination("/import", "a.csv").await;
        handle.await.unwrap();

        assert_eq!(destination, None);
        assert_eq!(
            *h.seen.lock().unwrap(),
            vec![Notification::error("401 Unauthorized")]
        );
    }

    #[tokio::test]
    async fn transfer_failure_is_only_logged_by_default() {
        let (url, handle) = capture_server(200, r#""http://127.0.0.1:9/uploads/a.csv""#).await;
        let h = harness(&url, StaticToken::none());
        let file = SelectedFile::new("a.csv", vec![1, 2]);

        let outcome = h.flow.upload("/import", &file).await;
        handle.await.unwrap();

        assert!(matches!(outcome, UploadOutcome::TransferFailed(_)));
        assert!(h.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn transfer_failure_can_be_toasted() {
        let (url, handle) = capture_server(500, "").await;
        let h = harness("http://127.0.0.1:9", StaticToken::none());
        let flow = h.flow.clone().with_transfer_notifications(true);
        let file = SelectedFile::new("a.csv", vec![1, 2]);

        let result = flow.transfer(&format!("{url}/uploads/a.csv"), &file).await;
        handle.await.unwrap();

        assert!(result.is_err());
        assert_eq!(
            *h.seen.lock().unwrap(),
            vec![Notification::error("Unknown error")]
        );
        assert_eq!(h.bus.subscriber_count(), 1);
    }
}
