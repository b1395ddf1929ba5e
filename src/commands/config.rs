use anyhow::Result;
use log::{debug, warn};
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    api::{DemoPhotos, PhotoService, RemotePhotos},
    demo::DemoStore,
    domain::model::User,
    http::ApiClient,
    runtime::Runtime,
    session::{FileSessionStore, SessionManager},
};

use super::paths::default_state_dir;
use super::report::api_failure;

/// Service address compiled in by the build script.
pub const DEFAULT_API_URL: &str = env!("PHOTOSHELF_DEFAULT_API_URL");

pub const USER_AGENT: &str = "photoshelf-cli";

pub struct Config<R: Runtime + Clone + 'static> {
    pub runtime: R,
    pub state_dir: PathBuf,
    pub session: Arc<SessionManager>,
    pub client: ApiClient,
}

impl<R: Runtime + Clone + 'static> Config<R> {
    pub fn new(runtime: R, state_dir: Option<PathBuf>, api_url: Option<String>) -> Result<Self> {
        let state_dir = match state_dir {
            Some(path) => path,
            None => default_state_dir(&runtime)?,
        };
        let api_url = api_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        debug!("Using state dir {:?} and service {}", state_dir, api_url);

        let store = FileSessionStore::new(runtime.clone(), &state_dir);
        let session = SessionManager::load(Box::new(store))?.on_session_invalidated(|reason| {
            warn!(
                "Signed out ({}). Run `photoshelf login` to sign in again.",
                reason
            );
        });
        let session = Arc::new(session);

        let client = Client::builder().user_agent(USER_AGENT).build()?;
        let client = ApiClient::new(client, api_url, Arc::clone(&session));

        Ok(Self {
            runtime,
            state_dir,
            session,
            client,
        })
    }

    pub fn demo_store(&self) -> DemoStore<R> {
        DemoStore::new(self.runtime.clone(), &self.state_dir)
    }

    /// Demo sessions keep photos locally, everyone else talks to the service.
    pub fn photo_service(&self) -> Box<dyn PhotoService> {
        if self.session.is_demo() {
            Box::new(DemoPhotos::new(self.demo_store()))
        } else {
            Box::new(RemotePhotos::new(self.client.clone()))
        }
    }

    /// The signed-in user, after the same expiry check the API client runs.
    ///
    /// Demo sessions never reach the client, so this is where their expired
    /// tokens get dropped.
    pub fn require_user(&self) -> Result<User> {
        self.session
            .ensure_fresh()
            .map_err(|e| api_failure(e, "Authentication"))?;
        match self.session.user() {
            Some(user) if self.session.token().is_some() => Ok(user),
            _ => anyhow::bail!("Not logged in. Run `photoshelf login` first."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::token::tests::token_expiring_in;
    use crate::http::{ApiError, ErrorCode};
    use crate::runtime::RealRuntime;
    use crate::session::Session;
    use mockito::{Matcher, Server};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_config_sends_user_agent() {
        let dir = tempdir().unwrap();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/ping")
            .match_header("user-agent", Matcher::Exact(USER_AGENT.to_string()))
            .with_status(200)
            .create_async()
            .await;

        let config =
            Config::new(RealRuntime, Some(dir.path().to_path_buf()), Some(server.url())).unwrap();
        let _: () = config
            .client
            .get("/ping", Default::default())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(config.client.base_url(), server.url());
    }

    #[test]
    fn test_config_defaults_api_url() {
        let dir = tempdir().unwrap();
        let config =
            Config::new(RealRuntime, Some(dir.path().to_path_buf()), Some(" ".into())).unwrap();
        assert_eq!(
            config.client.base_url(),
            DEFAULT_API_URL.trim_end_matches('/')
        );
    }

    #[test]
    fn test_config_loads_saved_session() {
        let dir = tempdir().unwrap();
        let session = Session {
            token: Some(token_expiring_in(3600)),
            user: Some(User {
                id: "3".into(),
                email: "ada@example.com".into(),
                ..Default::default()
            }),
            is_demo: true,
            ..Default::default()
        };
        std::fs::write(
            dir.path().join("session.json"),
            serde_json::to_string(&session).unwrap(),
        )
        .unwrap();

        let config = Config::new(RealRuntime, Some(dir.path().to_path_buf()), None).unwrap();
        assert!(config.session.is_demo());
        assert_eq!(config.require_user().unwrap().id, "3");
    }

    #[test]
    fn test_require_user_drops_expired_demo_session() {
        let dir = tempdir().unwrap();
        let session = Session {
            token: Some(token_expiring_in(-3600)),
            user: Some(User {
                id: "3".into(),
                email: "demo@demo.com".into(),
                ..Default::default()
            }),
            is_demo: true,
            ..Default::default()
        };
        std::fs::write(
            dir.path().join("session.json"),
            serde_json::to_string(&session).unwrap(),
        )
        .unwrap();

        let config = Config::new(RealRuntime, Some(dir.path().to_path_buf()), None).unwrap();
        let err = config.require_user().unwrap_err();

        assert_eq!(
            err.downcast_ref::<ApiError>().map(ApiError::code),
            Some(ErrorCode::TokenExpired)
        );
        assert!(err.to_string().contains("photoshelf login"));
        assert_eq!(config.session.token(), None);
        assert!(!config.session.is_demo());

        let saved: Session = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("session.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(saved.token, None);
    }

    #[test]
    fn test_require_user_without_session() {
        let dir = tempdir().unwrap();
        let config = Config::new(RealRuntime, Some(dir.path().to_path_buf()), None).unwrap();
        let err = config.require_user().unwrap_err();
        assert!(err.to_string().contains("Not logged in"));
    }
}
