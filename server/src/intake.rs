//! HTTP request handling.
//!
//! The intake loop is synchronous (tiny_http) and runs on the main thread;
//! accepted submissions are handed to the delivery coordinator on the tokio
//! runtime and the caller is acknowledged immediately, decoupled from the
//! delivery outcome.

use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use postbox_core::delivery::DeliveryCoordinator;
use postbox_core::submission::Submission;
use postbox_core::validator::{self, ValidationResult};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

/// Amount of bytes to read from the body of a request.
pub const PAYLOAD_MAX_SIZE: u64 = 8192;

/// Result of decoding and validating one `POST /write-email` payload.
#[derive(Debug)]
pub enum SubmissionOutcome {
    /// The body was not a JSON object we can decode.
    Malformed,
    /// Decoded, but one or more fields failed validation.
    Rejected(ValidationResult),
    /// Ready for delivery.
    Accepted(Box<Submission>),
}

/// Decode the request body and run field validation. Missing fields decode
/// as empty strings and are rejected by the length rules rather than
/// failing the decode.
pub fn decode_submission(body: &[u8]) -> SubmissionOutcome {
    let Ok(submission) = serde_json::from_slice::<Submission>(body) else {
        return SubmissionOutcome::Malformed;
    };

    let errors = validator::check(&submission);
    if errors.is_empty() {
        SubmissionOutcome::Accepted(Box::new(submission))
    } else {
        SubmissionOutcome::Rejected(errors)
    }
}

#[allow(clippy::expect_used)]
fn header(name: &str, value: &str) -> Header {
    // Both inputs are static ASCII, so this cannot fail.
    Header::from_bytes(name.as_bytes(), value.as_bytes()).expect("valid header")
}

fn text_response(body: &str, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body).with_status_code(StatusCode(status))
}

/// JSON body plus the CORS headers the UI expects.
fn json_response(content: &serde_json::Value, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    match serde_json::to_vec(content) {
        Ok(body) => Response::from_data(body)
            .with_status_code(StatusCode(status))
            .with_header(header("Content-Type", "application/json"))
            .with_header(header("Access-Control-Allow-Origin", "*"))
            .with_header(header("Access-Control-Allow-Methods", "GET, POST")),
        Err(_) => text_response("Failed to encode content to JSON", 500),
    }
}

/// Route dispatch plus the shared state each route needs.
pub struct Intake {
    coordinator: Arc<DeliveryCoordinator>,
    runtime: tokio::runtime::Handle,
    homepage: Vec<u8>,
    static_root: PathBuf,
}

impl Intake {
    pub fn new(
        coordinator: Arc<DeliveryCoordinator>,
        runtime: tokio::runtime::Handle,
        homepage: Vec<u8>,
        static_root: PathBuf,
    ) -> Self {
        Self {
            coordinator,
            runtime,
            homepage,
            static_root,
        }
    }

    /// Accept loop. Runs until the server socket is closed.
    pub fn serve(&self, server: Server) {
        for request in server.incoming_requests() {
            self.handle(request);
        }
    }

    fn handle(&self, request: Request) {
        let method = request.method().clone();
        let url = request.url().to_string();

        let result = match (&method, url.as_str()) {
            (Method::Get, "/") => request
                .respond(
                    Response::from_data(self.homepage.clone())
                        .with_header(header("Content-Type", "text/html; charset=utf-8")),
                )
                .map(|()| 200),
            (Method::Post, "/write-email") => self.handle_write_email(request),
            (Method::Get, path) if path.starts_with("/static/") => {
                self.handle_static(request, path)
            }
            _ => request
                .respond(Response::empty(StatusCode(404)))
                .map(|()| 404),
        };

        match result {
            Ok(status) => tracing::info!(
                target: crate::bootstrap::REQUEST_LOG_TARGET,
                method = %method,
                url = %url,
                status,
                "handled HTTP request"
            ),
            Err(error) => {
                tracing::warn!(error = %error, url = %url, "failed to write HTTP response");
            }
        }
    }

    fn handle_write_email(&self, mut request: Request) -> std::io::Result<u16> {
        let mut body = Vec::new();
        if let Err(error) = request
            .as_reader()
            .take(PAYLOAD_MAX_SIZE)
            .read_to_end(&mut body)
        {
            tracing::warn!(error = %error, "failed to read request body");
            return request
                .respond(text_response("Failed to read body from HTTP request", 500))
                .map(|()| 500);
        }

        match decode_submission(&body) {
            SubmissionOutcome::Malformed => request
                .respond(text_response("Failed to parse payload", 400))
                .map(|()| 400),
            SubmissionOutcome::Rejected(errors) => request
                .respond(json_response(&serde_json::json!({ "errors": errors }), 400))
                .map(|()| 400),
            SubmissionOutcome::Accepted(submission) => {
                // Fire-and-forget: the submitter gets the acknowledgment now;
                // persist/send failures are observable only in the logs.
                self.coordinator.spawn(&self.runtime, *submission);
                request
                    .respond(Response::empty(StatusCode(200)))
                    .map(|()| 200)
            }
        }
    }

    fn handle_static(&self, request: Request, url_path: &str) -> std::io::Result<u16> {
        let Some(path) = resolve_static(&self.static_root, url_path) else {
            return request
                .respond(Response::empty(StatusCode(404)))
                .map(|()| 404);
        };

        match std::fs::File::open(&path) {
            Ok(file) => {
                let mime = mime_guess::from_path(&path).first_or_octet_stream();
                request
                    .respond(
                        Response::from_file(file)
                            .with_header(header("Content-Type", mime.essence_str())),
                    )
                    .map(|()| 200)
            }
            Err(_) => request
                .respond(Response::empty(StatusCode(404)))
                .map(|()| 404),
        }
    }
}

/// Map a `/static/...` URL onto a path under the static root.
///
/// Only plain path components are accepted: an absolute path, a `..`
/// component, or a drive prefix resolves to `None`, so the route can never
/// read a file outside the root. `Path::join` would happily replace the
/// base with an absolute argument, hence the component check.
fn resolve_static(static_root: &Path, url_path: &str) -> Option<PathBuf> {
    let relative = url_path.trim_start_matches("/static/");
    let candidate = Path::new(relative);

    if candidate
        .components()
        .any(|component| !matches!(component, Component::Normal(_)))
    {
        return None;
    }

    Some(static_root.join(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn valid_payload() -> serde_json::Value {
        serde_json::json!({
            "subject": "Question about billing",
            "fullname": "Jane Doe",
            "email": "jane.doe@example.com",
            "business": "Acme Corp",
            "body": "I would like to ask about the invoice you sent to our office last \
                     week. Could you confirm the total amount before we process it?",
            "details": "None",
        })
    }

    #[test]
    fn static_route_rejects_absolute_paths() {
        let tmp = tempfile::TempDir::new().unwrap();
        let secret = tmp.path().join("secret.txt");
        std::fs::write(&secret, b"confidential").unwrap();
        let static_root = tmp.path().join("build");

        // `/static//abs/path` trims to an absolute path, which `join` would
        // otherwise substitute for the static root wholesale.
        let url = format!("/static/{}", secret.display());
        assert_eq!(resolve_static(&static_root, &url), None);
    }

    #[test]
    fn static_route_rejects_parent_traversal() {
        let root = Path::new("/srv/postbox/build");
        assert_eq!(resolve_static(root, "/static/../storage.json"), None);
        assert_eq!(
            resolve_static(root, "/static/css/../../../../etc/passwd"),
            None
        );
    }

    #[test]
    fn static_route_resolves_plain_paths_under_the_root() {
        let root = Path::new("/srv/postbox/build");
        assert_eq!(
            resolve_static(root, "/static/css/main.css"),
            Some(root.join("css/main.css"))
        );
    }

    #[test]
    fn garbage_payload_is_malformed() {
        assert!(matches!(
            decode_submission(b"not json at all"),
            SubmissionOutcome::Malformed
        ));
    }

    #[test]
    fn valid_payload_is_accepted() {
        let body = serde_json::to_vec(&valid_payload()).unwrap();
        match decode_submission(&body) {
            SubmissionOutcome::Accepted(submission) => {
                assert_eq!(submission.fullname, "Jane Doe");
            }
            other => panic!("expected acceptance, got {other:?}"),
        }
    }

    #[test]
    fn missing_fields_are_rejected_not_malformed() {
        let body = serde_json::to_vec(&serde_json::json!({
            "subject": "Question about billing",
        }))
        .unwrap();

        match decode_submission(&body) {
            SubmissionOutcome::Rejected(errors) => {
                assert!(errors.contains_key("fullname"));
                assert!(errors.contains_key("body"));
                assert!(!errors.contains_key("subject"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn rejection_payload_nests_errors_by_field() {
        let mut payload = valid_payload();
        payload["business"] = serde_json::json!("x");
        let body = serde_json::to_vec(&payload).unwrap();

        let SubmissionOutcome::Rejected(errors) = decode_submission(&body) else {
            panic!("expected rejection");
        };

        let reply = serde_json::json!({ "errors": errors });
        assert_eq!(
            reply["errors"]["business"],
            "Business length mustn't be shorter than 3 characters or longer than 32 characters"
        );
    }
}
