use crate::notes_app::models::{Account, Note};
use crate::notes_app::NotesRepository;
use tracing::{info, warn};

/// Client-side state. Token presence decides which screen is shown.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub notes: Vec<Note>,
    pub draft: String,
    pub error: Option<String>,
    /// Tenant slug of the logged-in account, used for plan upgrades.
    pub tenant: Option<String>,
    pub plan: Option<String>,
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    // true when the token actually changed
    fn set_token(&mut self, token: String) -> bool {
        if self.token.as_deref() == Some(token.as_str()) {
            return false;
        }
        self.token = Some(token);
        true
    }
}

pub struct SessionController {
    repo: NotesRepository,
    session: Session,
}

impl SessionController {
    pub fn new(repo: NotesRepository) -> Self {
        Self {
            repo,
            session: Session::default(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn set_draft(&mut self, draft: &str) {
        self.session.draft = draft.to_string();
    }

    /// Notes are fetched right after a login that changes the token.
    pub async fn login(&mut self, email: &str, password: &str) {
        match self.repo.login(email, password).await {
            Ok(token) => {
                info!(email, "logged in");
                self.session.error = None;
                self.session.tenant = Account::tenant_slug(email);
                if self.session.set_token(token) {
                    self.fetch_notes().await;
                }
            }
            Err(err) => {
                warn!(email, error = %err, "login failed");
                self.session.error = Some(err.to_string());
            }
        }
    }

    pub async fn fetch_notes(&mut self) {
        let Some(token) = self.session.token.as_deref() else {
            return;
        };
        match self.repo.load_notes(token).await {
            Ok(notes) => {
                self.session.notes = notes;
                self.session.error = None;
            }
            Err(err) => {
                warn!(error = %err, "fetching notes failed");
                self.session.error = Some(err.to_string());
            }
        }
    }

    pub async fn add_note(&mut self) {
        let Some(token) = self.session.token.as_deref() else {
            return;
        };
        if self.session.draft.is_empty() {
            return;
        }
        match self.repo.create_note(token, &self.session.draft).await {
            Ok(()) => {
                info!("note created");
                self.session.draft.clear();
                self.session.error = None;
                self.fetch_notes().await;
            }
            Err(err) => {
                warn!(error = %err, "creating note failed");
                self.session.error = Some(err.to_string());
            }
        }
    }

    /// Replaces the content of note `id` with the draft.
    pub async fn update_note(&mut self, id: i64) {
        let Some(token) = self.session.token.as_deref() else {
            return;
        };
        if self.session.draft.is_empty() {
            return;
        }
        match self.repo.update_note(token, id, &self.session.draft).await {
            Ok(()) => {
                info!(id, "note updated");
                self.session.draft.clear();
                self.session.error = None;
                self.fetch_notes().await;
            }
            Err(err) => {
                warn!(id, error = %err, "updating note failed");
                self.session.error = Some(err.to_string());
            }
        }
    }

    pub async fn delete_note(&mut self, id: i64) {
        let Some(token) = self.session.token.as_deref() else {
            return;
        };
        match self.repo.delete_note(token, id).await {
            Ok(()) => {
                info!(id, "note deleted");
                self.session.error = None;
                self.fetch_notes().await;
            }
            Err(err) => {
                warn!(id, error = %err, "deleting note failed");
                self.session.error = Some(err.to_string());
            }
        }
    }

    pub async fn upgrade_tenant(&mut self) {
        let (Some(token), Some(slug)) = (
            self.session.token.as_deref(),
            self.session.tenant.as_deref(),
        ) else {
            return;
        };
        match self.repo.upgrade_tenant(token, slug).await {
            Ok(plan) => {
                info!(slug, plan = %plan, "tenant upgraded");
                self.session.plan = Some(plan);
                self.session.error = None;
            }
            Err(err) => {
                warn!(slug, error = %err, "upgrading tenant failed");
                self.session.error = Some(err.to_string());
            }
        }
    }

    pub fn logout(&mut self) {
        if self.session.is_logged_in() {
            info!("logged out");
        }
        self.session = Session::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes_app::notes_repository::{
        ADD_FAILED, FETCH_FAILED, LOGIN_FAILED, UPDATE_FAILED,
    };
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn note(id: i64, content: &str) -> Note {
        Note {
            id,
            title: None,
            content: content.to_string(),
        }
    }

    async fn mount_login(server: &MockServer, token: &str) {
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": token})))
            .mount(server)
            .await;
    }

    async fn mount_notes(server: &MockServer, body: serde_json::Value, expected: u64) {
        Mock::given(method("GET"))
            .and(path("/notes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(expected)
            .mount(server)
            .await;
    }

    fn logged_in(server: &MockServer) -> SessionController {
        let mut controller = SessionController::new(NotesRepository::new(&server.uri()));
        controller.session.token = Some("tok".to_string());
        controller
    }

    async fn get_notes_requests(server: &MockServer) -> usize {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|request| request.method.as_str() == "GET" && request.url.path() == "/notes")
            .count()
    }

    #[tokio::test]
    async fn login_sets_token_clears_error_and_fetches_once() {
        let server = MockServer::start().await;
        mount_login(&server, "tok-1").await;
        mount_notes(&server, json!([{"id": 1, "content": "a"}]), 1).await;

        let mut controller = SessionController::new(NotesRepository::new(&server.uri()));
        controller.session.error = Some("old".to_string());
        controller.login("admin@acme.test", "password").await;

        let session = controller.session();
        assert_eq!(session.token.as_deref(), Some("tok-1"));
        assert_eq!(session.error, None);
        assert_eq!(session.notes, vec![note(1, "a")]);
        assert_eq!(session.tenant.as_deref(), Some("acme"));
    }

    #[tokio::test]
    async fn login_with_same_token_does_not_refetch() {
        let server = MockServer::start().await;
        mount_login(&server, "tok-1").await;
        mount_notes(&server, json!([]), 1).await;

        let mut controller = SessionController::new(NotesRepository::new(&server.uri()));
        controller.login("admin@acme.test", "password").await;
        controller.login("admin@acme.test", "password").await;

        assert_eq!(get_notes_requests(&server).await, 1);
    }

    #[tokio::test]
    async fn rejected_login_keeps_token_unset() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        mount_notes(&server, json!([]), 0).await;

        let mut controller = SessionController::new(NotesRepository::new(&server.uri()));
        controller.login("admin@acme.test", "wrong").await;

        assert_eq!(controller.session().token, None);
        assert_eq!(controller.session().error.as_deref(), Some(LOGIN_FAILED));
    }

    #[tokio::test]
    async fn network_failure_on_login_reports_transport_text() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut controller =
            SessionController::new(NotesRepository::new(&format!("http://127.0.0.1:{port}")));
        controller.login("admin@acme.test", "password").await;

        assert_eq!(controller.session().token, None);
        let error = controller.session().error.clone().unwrap_or_default();
        assert!(!error.is_empty());
        assert_ne!(error, LOGIN_FAILED);
    }

    #[tokio::test]
    async fn fetch_without_token_is_a_noop() {
        let server = MockServer::start().await;
        mount_notes(&server, json!([{"id": 1, "content": "a"}]), 0).await;

        let mut controller = SessionController::new(NotesRepository::new(&server.uri()));
        controller.session.notes = vec![note(4, "kept")];
        controller.session.error = Some("earlier failure".to_string());
        let before = controller.session().clone();

        controller.fetch_notes().await;

        assert_eq!(controller.session(), &before);
        assert_eq!(controller.session().notes, vec![note(4, "kept")]);
        assert_eq!(controller.session().error.as_deref(), Some("earlier failure"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_replaces_list_in_server_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notes"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "content": "a"},
                {"id": 2, "content": "b"}
            ])))
            .mount(&server)
            .await;

        let mut controller = logged_in(&server);
        controller.session.notes = vec![note(9, "stale")];
        controller.fetch_notes().await;

        assert_eq!(controller.session().notes, vec![note(1, "a"), note(2, "b")]);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_stale_notes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notes"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut controller = logged_in(&server);
        controller.session.notes = vec![note(9, "stale")];
        controller.fetch_notes().await;

        assert_eq!(controller.session().notes, vec![note(9, "stale")]);
        assert_eq!(controller.session().error.as_deref(), Some(FETCH_FAILED));
    }

    #[tokio::test]
    async fn empty_draft_sends_nothing() {
        let server = MockServer::start().await;
        let mut controller = logged_in(&server);
        let before = controller.session().clone();

        controller.add_note().await;

        assert_eq!(controller.session(), &before);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_without_token_sends_nothing() {
        let server = MockServer::start().await;
        let mut controller = SessionController::new(NotesRepository::new(&server.uri()));
        controller.set_draft("hello");

        controller.add_note().await;

        assert_eq!(controller.session().draft, "hello");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn successful_add_clears_draft_and_refetches_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notes"))
            .and(header("authorization", "Bearer tok"))
            .and(body_partial_json(json!({"content": "hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3})))
            .expect(1)
            .mount(&server)
            .await;
        mount_notes(&server, json!([{"id": 3, "content": "hello"}]), 1).await;

        let mut controller = logged_in(&server);
        controller.set_draft("hello");
        controller.add_note().await;

        assert_eq!(controller.session().draft, "");
        assert_eq!(controller.session().notes, vec![note(3, "hello")]);
    }

    #[tokio::test]
    async fn failed_add_with_detail_keeps_draft() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notes"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "duplicate"})))
            .mount(&server)
            .await;
        mount_notes(&server, json!([]), 0).await;

        let mut controller = logged_in(&server);
        controller.set_draft("hello");
        controller.add_note().await;

        assert_eq!(controller.session().error.as_deref(), Some("duplicate"));
        assert_eq!(controller.session().draft, "hello");
    }

    #[tokio::test]
    async fn failed_add_without_detail_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notes"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut controller = logged_in(&server);
        controller.set_draft("hello");
        controller.add_note().await;

        assert_eq!(controller.session().error.as_deref(), Some(ADD_FAILED));
    }

    #[tokio::test]
    async fn delete_refetches_once() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/notes/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "deleted"})))
            .expect(1)
            .mount(&server)
            .await;
        mount_notes(&server, json!([{"id": 2, "content": "b"}]), 1).await;

        let mut controller = logged_in(&server);
        controller.session.notes = vec![note(1, "a"), note(2, "b")];
        controller.delete_note(1).await;

        assert_eq!(controller.session().notes, vec![note(2, "b")]);
    }

    #[tokio::test]
    async fn successful_update_clears_draft_and_refetches_once() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/notes/1"))
            .and(header("authorization", "Bearer tok"))
            .and(body_partial_json(json!({"content": "edited"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;
        mount_notes(&server, json!([{"id": 1, "content": "edited"}]), 1).await;

        let mut controller = logged_in(&server);
        controller.session.notes = vec![note(1, "a")];
        controller.set_draft("edited");
        controller.update_note(1).await;

        assert_eq!(controller.session().draft, "");
        assert_eq!(controller.session().error, None);
        assert_eq!(controller.session().notes, vec![note(1, "edited")]);
    }

    #[tokio::test]
    async fn update_of_missing_note_shows_detail_and_keeps_draft() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/notes/8"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found"})))
            .expect(1)
            .mount(&server)
            .await;
        mount_notes(&server, json!([]), 0).await;

        let mut controller = logged_in(&server);
        controller.set_draft("edited");
        controller.update_note(8).await;

        assert_eq!(controller.session().error.as_deref(), Some("Not found"));
        assert_eq!(controller.session().draft, "edited");
    }

    #[tokio::test]
    async fn update_without_detail_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/notes/1"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut controller = logged_in(&server);
        controller.set_draft("edited");
        controller.update_note(1).await;

        assert_eq!(controller.session().error.as_deref(), Some(UPDATE_FAILED));
    }

    #[tokio::test]
    async fn update_without_token_or_draft_sends_nothing() {
        let server = MockServer::start().await;
        let mut controller = SessionController::new(NotesRepository::new(&server.uri()));
        controller.set_draft("edited");
        controller.update_note(1).await;

        let mut controller = logged_in(&server);
        controller.update_note(1).await;

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upgrade_uses_tenant_of_logged_in_account() {
        let server = MockServer::start().await;
        mount_login(&server, "tok").await;
        mount_notes(&server, json!([]), 1).await;
        Mock::given(method("POST"))
            .and(path("/tenants/globex/upgrade"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "upgraded", "plan": "pro"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut controller = SessionController::new(NotesRepository::new(&server.uri()));
        controller.login("admin@globex.test", "password").await;
        controller.upgrade_tenant().await;

        assert_eq!(controller.session().plan.as_deref(), Some("pro"));
        assert_eq!(controller.session().error, None);
    }

    #[tokio::test]
    async fn upgrade_as_member_surfaces_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenants/acme/upgrade"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Admin only"})))
            .mount(&server)
            .await;

        let mut controller = logged_in(&server);
        controller.session.tenant = Some("acme".to_string());
        controller.upgrade_tenant().await;

        assert_eq!(controller.session().error.as_deref(), Some("Admin only"));
        assert_eq!(controller.session().plan, None);
    }

    #[tokio::test]
    async fn logout_clears_everything() {
        let server = MockServer::start().await;
        let mut controller = logged_in(&server);
        controller.session.notes = vec![note(1, "a")];
        controller.session.error = Some("boom".to_string());
        controller.session.tenant = Some("acme".to_string());
        controller.session.plan = Some("pro".to_string());
        controller.set_draft("half written");

        controller.logout();

        assert_eq!(controller.session(), &Session::default());
        assert!(!controller.session().is_logged_in());
    }
}
