// Event Wizard E2E Tests
//
// End-to-end runs of the wizard against a mocked event backend over HTTP

/// Shared backend mocks for E2E tests
pub mod utils {
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Path the presign endpoint hands out for uploads
    pub const UPLOAD_PATH: &str = "/bucket/events/poster.png";

    /// Presigned URL served by `server`
    pub fn signed_upload_url(server: &MockServer) -> String {
        format!(
            "{}{}?X-Amz-Signature=abc123&X-Amz-Expires=60",
            server.uri(),
            UPLOAD_PATH
        )
    }

    /// Public URL the created record must point at
    pub fn public_asset_url(server: &MockServer) -> String {
        format!("{}{}", server.uri(), UPLOAD_PATH)
    }

    /// Mount the presign endpoint, answering for `poster.png`
    pub async fn mount_presign(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/presign"))
            .and(query_param("file", "poster.png"))
            .and(query_param("fileType", "image/png"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "url": signed_upload_url(server) })),
            )
            .mount(server)
            .await;
    }

    /// Mount the storage endpoint with the given status
    pub async fn mount_upload(server: &MockServer, status: u16) {
        Mock::given(method("PUT"))
            .and(path(UPLOAD_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(server)
            .await;
    }

    /// Requests received on the create endpoint, as JSON bodies
    pub async fn created_bodies(server: &MockServer) -> Vec<Value> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == "/api/event/create/aws")
            .filter_map(|request| serde_json::from_slice(&request.body).ok())
            .collect()
    }
}
