//! Test helpers for web integration tests.
//!
//! Builds the full application over an in-memory database, a temporary blob
//! directory and a recording mailer.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use tempfile::TempDir;

use fileshare::auth::{register, RegistrationRequest};
use fileshare::web::create_app;
use fileshare::{
    AppState, Database, FileStorage, MemoryMailer, NewSharedFile, Role, SharedFileRepository,
    User, UserRepository, WebSettings,
};

pub const PASSWORD: &str = "password123";

/// A running application and handles to its collaborators.
pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
    pub mailer: MemoryMailer,
    pub storage: FileStorage,
    _storage_dir: TempDir,
}

impl TestApp {
    /// Build the application with default settings.
    pub async fn new() -> Self {
        Self::with_settings(WebSettings::default()).await
    }

    /// Build the application with custom settings.
    pub async fn with_settings(settings: WebSettings) -> Self {
        let db = Database::open_in_memory()
            .await
            .expect("Failed to create test database");
        let storage_dir = tempfile::tempdir().expect("Failed to create storage dir");
        let storage = FileStorage::new(storage_dir.path()).expect("Failed to create storage");
        let mailer = MemoryMailer::new();

        let state = AppState::new(
            db.clone(),
            storage.clone(),
            Arc::new(mailer.clone()),
            settings,
        );

        let mut server =
            TestServer::new(create_app(Arc::new(state), None)).expect("Failed to create test server");
        server.save_cookies();

        Self {
            server,
            db,
            mailer,
            storage,
            _storage_dir: storage_dir,
        }
    }

    /// Create an account directly in the database.
    pub async fn create_user(&self, name: &str, email: &str, role: Role) -> User {
        let repo = UserRepository::new(self.db.pool());
        register(
            &repo,
            &RegistrationRequest::new(name, email, PASSWORD).with_role(role),
        )
        .await
        .expect("Failed to create user")
    }

    /// Store a file and its metadata directly. Returns the file id.
    pub async fn seed_file(&self, sender_email: &str, recipient_email: &str) -> i64 {
        let stored_name = self
            .storage
            .save(b"hello world", "notes.txt")
            .await
            .expect("Failed to store blob");
        SharedFileRepository::new(self.db.pool())
            .insert(&NewSharedFile {
                doc_name: "notes.txt".to_string(),
                stored_name,
                size: 11,
                sender_name: "Cheryl Smith".to_string(),
                sender_email: sender_email.to_string(),
                recipient_name: "Foo".to_string(),
                recipient_email: recipient_email.to_string(),
                password_hash: "unused".to_string(),
                expires_in_days: 365,
            })
            .await
            .expect("Failed to insert file")
    }

    /// Rows in the web session store.
    pub async fn session_rows(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM tower_sessions")
            .fetch_one(self.db.pool())
            .await
            .expect("Failed to count sessions")
    }

    /// CSRF token embedded in the page at `path`.
    pub async fn csrf_token(&self, path: &str) -> String {
        let response = self.server.get(path).await;
        extract_csrf_token(&response.text()).expect("page has no CSRF token")
    }

    /// Log in through the login form.
    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        let token = self.csrf_token("/user/login").await;
        self.server
            .post("/user/login")
            .form(&[
                ("email", email),
                ("password", password),
                ("csrf_token", token.as_str()),
            ])
            .await
    }

    /// Create an account with the given role and sign in as it.
    pub async fn login_as(&self, name: &str, email: &str, role: Role) -> User {
        let user = self.create_user(name, email, role).await;
        let response = self.login(email, PASSWORD).await;
        response.assert_status(axum::http::StatusCode::SEE_OTHER);
        user
    }

    /// Upload `content` through the form with a valid CSRF token.
    pub async fn upload(&self, recipient_name: &str, recipient_email: &str, content: &[u8]) -> TestResponse {
        let token = self.csrf_token("/files/create").await;
        let form = upload_form(&token, recipient_name, recipient_email, "365")
            .add_part(
                "uploadFile",
                Part::bytes(content.to_vec())
                    .file_name("report.pdf")
                    .mime_type("application/pdf"),
            );
        self.server.post("/files/create").multipart(form).await
    }
}

/// Upload form fields without the file part.
pub fn upload_form(token: &str, recipient_name: &str, recipient_email: &str, expires: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("csrf_token", token.to_string())
        .add_text("recipientName", recipient_name.to_string())
        .add_text("recipientEmail", recipient_email.to_string())
        .add_text("senderName", "Cheryl Smith")
        .add_text("senderEmail", "cheryl@example.com")
        .add_text("expires", expires.to_string())
}

/// Pull the CSRF token out of a rendered form.
pub fn extract_csrf_token(html: &str) -> Option<String> {
    let marker = r#"name="csrf_token" value=""#;
    let start = html.find(marker)? + marker.len();
    let end = html[start..].find('"')?;
    Some(html[start..start + end].to_string())
}

/// `Location` header of a redirect.
pub fn location(response: &TestResponse) -> String {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
