//! Login/logout flows through the session context, token store, and client.

use std::sync::Arc;

use async_trait::async_trait;
use profilematch_core::api::{ApiClient, ApiError};
use profilematch_core::auth::{SessionContext, SessionState, TokenStore};
use profilematch_core::storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Store that can be read but refuses every write.
#[derive(Default)]
struct ReadOnlyStore {
    inner: MemoryStore,
}

#[async_trait]
impl KeyValueStore for ReadOnlyStore {
    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        self.inner.get_many(keys).await
    }

    async fn set_many(&self, _entries: &[(&str, &str)]) -> Result<(), StorageError> {
        Err(StorageError::Write("read-only".to_string()))
    }

    async fn remove_many(&self, _keys: &[&str]) -> Result<(), StorageError> {
        Err(StorageError::Write("read-only".to_string()))
    }
}

async fn mount_auth(server: &MockServer, response: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/auth"))
        .and(body_json(json!({"username": "alice", "password": "hunter2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .expect(1)
        .mount(server)
        .await;
}

fn client_for(server: &MockServer, tokens: TokenStore) -> ApiClient {
    ApiClient::new(&server.uri(), tokens)
        .unwrap()
        .with_auth_url(&format!("{}/auth", server.uri()))
        .unwrap()
}

#[tokio::test]
async fn test_authenticate_then_list() {
    let server = MockServer::start().await;
    let tokens = TokenStore::new(Arc::new(MemoryStore::new()));
    let client = client_for(&server, tokens.clone());
    let mut session = SessionContext::restored(tokens.clone()).await;
    assert!(!session.is_authenticated());

    mount_auth(&server, json!({"access_token": "issued", "expires_in": 7200})).await;
    Mock::given(method("GET"))
        .and(path("/profiles"))
        .and(header("authorization", "Bearer issued"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"profiles": []})))
        .expect(1)
        .mount(&server)
        .await;

    let issued = client.authenticate("alice", "hunter2").await.unwrap();
    assert_eq!(issued.value, "issued");
    assert_eq!(tokens.retrieve().await.unwrap().as_deref(), Some("issued"));

    session.login(issued.value);
    assert_eq!(session.token(), Some("issued"));

    let profiles = client.list_profiles().await.unwrap();
    assert!(profiles.is_empty());
}

#[tokio::test]
async fn test_authenticate_default_lifetime() {
    let server = MockServer::start().await;
    let tokens = TokenStore::new(Arc::new(MemoryStore::new()));
    let client = client_for(&server, tokens.clone());

    mount_auth(&server, json!({"token": "plain"})).await;

    let before = tokens.now_millis();
    let issued = client.authenticate("alice", "hunter2").await.unwrap();
    let lifetime = issued.expires_at - before;
    assert!((3_600_000..3_660_000).contains(&lifetime), "lifetime was {lifetime}");
}

#[tokio::test]
async fn test_authenticate_fails_when_token_cannot_be_stored() {
    let server = MockServer::start().await;
    let tokens = TokenStore::new(Arc::new(ReadOnlyStore::default()));
    let client = client_for(&server, tokens.clone());
    let mut session = SessionContext::restored(tokens.clone()).await;

    mount_auth(&server, json!({"token": "issued"})).await;

    // The session only moves to authenticated once the token is stored
    let err = match client.authenticate("alice", "hunter2").await {
        Ok(issued) => {
            session.login(issued.value);
            panic!("authenticate succeeded without persisting the token");
        }
        Err(err) => err,
    };
    let api_err = err.downcast_ref::<ApiError>().unwrap();
    assert!(
        matches!(api_err, ApiError::Storage(StorageError::Write(_))),
        "unexpected error: {api_err}"
    );

    assert_eq!(session.state(), &SessionState::Unauthenticated);
    assert_eq!(tokens.retrieve().await.unwrap(), None);
}

#[tokio::test]
async fn test_authenticate_rejected() {
    let server = MockServer::start().await;
    let tokens = TokenStore::new(Arc::new(MemoryStore::new()));
    let client = client_for(&server, tokens.clone());

    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "bad credentials"})))
        .mount(&server)
        .await;

    let err = client.authenticate("alice", "wrong").await.unwrap_err();
    let api_err = err.downcast_ref::<ApiError>().unwrap();
    assert_eq!(api_err.to_string(), "Authentication failed: bad credentials");
    assert!(api_err.requires_login());
    assert_eq!(tokens.retrieve().await.unwrap(), None);
}

#[tokio::test]
async fn test_authenticate_without_token_field() {
    let server = MockServer::start().await;
    let tokens = TokenStore::new(Arc::new(MemoryStore::new()));
    let client = client_for(&server, tokens.clone());

    mount_auth(&server, json!({"expires_in": 60})).await;

    let err = client.authenticate("alice", "hunter2").await.unwrap_err();
    assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_logout_blocks_further_requests() {
    let server = MockServer::start().await;
    let tokens = TokenStore::new(Arc::new(MemoryStore::new()));
    let client = ApiClient::new(&server.uri(), tokens.clone()).unwrap();

    tokens.store("abc", 3600).await.unwrap();
    let mut session = SessionContext::restored(tokens.clone()).await;
    assert_eq!(
        session.state(),
        &SessionState::Authenticated { token: "abc".to_string() }
    );

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    session.logout().await.unwrap();
    assert_eq!(tokens.retrieve().await.unwrap(), None);

    let err = client.list_profiles().await.unwrap_err();
    assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::NoToken)));
}

#[tokio::test]
async fn test_file_store_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let tokens = TokenStore::new(Arc::new(FileStore::new(dir.path().to_path_buf())));
        tokens.store("persisted", 3600).await.unwrap();
    }

    let tokens = TokenStore::new(Arc::new(FileStore::new(dir.path().to_path_buf())));
    let mut session = SessionContext::restored(tokens.clone()).await;
    assert_eq!(session.token(), Some("persisted"));

    session.logout().await.unwrap();
    let reopened = TokenStore::new(Arc::new(FileStore::new(dir.path().to_path_buf())));
    assert_eq!(reopened.retrieve().await.unwrap(), None);
}
