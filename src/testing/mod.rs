use std::sync::Arc;
use tempfile::TempDir;
use tower_sessions::Session;
use uuid::Uuid;

use crate::auth::{MemorySessionStore, PasswordHasher, TokenSigner};
use crate::database::{EntityStore, MemoryStore};
use crate::services::{
    AuthService, BoardService, BoardView, CreateBoardInput, LocalFileStore, PinService, RegisterInput,
    UploadPolicy, UploadedFile, UserService,
};

pub const TEST_PASSWORD: &str = "password123";

/// Token signing secret of the test services
pub const TEST_SECRET: &str = "test-secret";

/// A registered user and their session token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub token: String,
}

/// Services wired to an in-memory store and a throwaway uploads directory
pub struct TestContext {
    pub auth: AuthService,
    pub users: UserService,
    pub boards: BoardService,
    pub pins: PinService,
    pub sessions: Arc<MemorySessionStore>,
    uploads: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
        let uploads = tempfile::tempdir().expect("create uploads dir");
        let files = Arc::new(LocalFileStore::new(uploads.path()));
        // Cheapest argon2 cost keeps the suite fast
        let hasher = PasswordHasher::new(1024, 1, 1).expect("hasher params");
        let signer = TokenSigner::new(TEST_SECRET, 1).expect("signer");
        let sessions = Arc::new(MemorySessionStore::new());

        Self {
            auth: AuthService::new(store.clone(), sessions.clone(), signer, hasher),
            users: UserService::new(store.clone()),
            boards: BoardService::new(store.clone()),
            pins: PinService::new(store, files, UploadPolicy::new(1024)),
            sessions,
            uploads,
        }
    }

    /// A fresh, empty cookie session over the test session store
    pub fn session(&self) -> Session {
        Session::new(None, self.sessions.clone(), None)
    }

    /// Register `<name>@example.com`
    pub async fn user(&self, name: &str) -> TestUser {
        let grant = self
            .auth
            .register(
                RegisterInput {
                    name: Some(name.to_string()),
                    email: Some(format!("{}@example.com", name)),
                    password: Some(TEST_PASSWORD.to_string()),
                    ..Default::default()
                },
                &self.session(),
            )
            .await
            .expect("register test user");
        TestUser {
            id: grant.user.id,
            name: grant.user.name,
            email: grant.user.email,
            token: grant.token,
        }
    }

    pub async fn board(&self, owner: &TestUser, title: &str, collaborators: &[&TestUser]) -> BoardView {
        self.boards
            .create(
                owner.id,
                CreateBoardInput {
                    title: Some(title.to_string()),
                    description: None,
                    collaborators: Some(collaborators.iter().map(|u| u.id.to_string()).collect()),
                },
            )
            .await
            .expect("create test board")
    }

    pub fn file(&self, name: &str, content_type: &str, len: usize) -> UploadedFile {
        UploadedFile {
            file_name: Some(name.to_string()),
            content_type: Some(content_type.to_string()),
            bytes: vec![7u8; len],
        }
    }

    /// Number of files written to the uploads directory
    pub fn stored_files(&self) -> usize {
        std::fs::read_dir(self.uploads.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}
