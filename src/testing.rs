//! In-memory stores and fake upstreams for router-level tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::Value;
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    app::build_app,
    auth::{
        google::{GoogleIdentity, IdTokenVerifier, VerifyError},
        password::hash_password,
    },
    chat::client::{ChatClient, ChatError, ChatReply},
    config::{AppConfig, GoogleConfig, JwtConfig, OpenAiConfig},
    knowledge::repo::{InfoEntry, InfoRepo},
    notifs::repo::{AdminNotif, NotifRepo},
    state::AppState,
    users::{
        repo::{RepoError, UserRepo},
        repo_types::{
            GoogleProfile, NewTask, NewUser, Task, TaskStatus, User, UserUpdate, ROLE_USER,
            STATUS_ACTIVE,
        },
    },
};

#[derive(Default)]
pub struct MemoryUsers {
    rows: Mutex<Vec<User>>,
    broken: Mutex<bool>,
}

impl MemoryUsers {
    /// Makes id lookups fail like an unreachable database.
    pub fn break_lookups(&self) {
        *self.broken.lock().unwrap() = true;
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.rows.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    fn blank(email: &str, name: &str) -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
            password_hash: None,
            google_id: None,
            role: ROLE_USER.to_string(),
            status: STATUS_ACTIVE.to_string(),
            buddy_name: None,
            buddy_url: None,
            picture: None,
            department: None,
            position: None,
            tasks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_update(
        rows: &mut [User],
        idx: usize,
        update: &UserUpdate,
    ) -> Result<User, RepoError> {
        if let Some(email) = &update.email {
            let taken = rows
                .iter()
                .enumerate()
                .any(|(i, u)| i != idx && &u.email == email);
            if taken {
                return Err(RepoError::DuplicateEmail);
            }
        }
        let user = &mut rows[idx];
        update.apply(user);
        user.updated_at = OffsetDateTime::now_utc();
        Ok(user.clone())
    }
}

#[async_trait]
impl UserRepo for MemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        if *self.broken.lock().unwrap() {
            anyhow::bail!("connection refused");
        }
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| u.name == name).cloned())
    }

    async fn list_accounts(&self) -> anyhow::Result<Vec<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .rev()
            .map(|u| User {
                tasks: Vec::new(),
                ..u.clone()
            })
            .collect())
    }

    async fn create(&self, new: NewUser) -> Result<User, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.email == new.email) {
            return Err(RepoError::DuplicateEmail);
        }
        let mut user = Self::blank(&new.email, &new.name);
        user.password_hash = Some(new.password_hash);
        user.role = new.role;
        user.buddy_url = Some(new.buddy_url);
        user.buddy_name = Some(new.buddy_name);
        user.department = new.department;
        user.position = new.position;
        rows.push(user.clone());
        Ok(user)
    }

    async fn upsert_google(&self, p: &GoogleProfile) -> anyhow::Result<User> {
        let mut rows = self.rows.lock().unwrap();
        let idx = match rows.iter().position(|u| u.email == p.email) {
            Some(idx) => idx,
            None => {
                rows.push(Self::blank(&p.email, &p.name));
                rows.len() - 1
            }
        };
        let user = &mut rows[idx];
        user.google_id = Some(p.google_id.clone());
        user.name = p.name.clone();
        user.picture = Some(p.picture.clone());
        user.updated_at = OffsetDateTime::now_utc();
        Ok(user.clone())
    }

    async fn update(&self, id: Uuid, update: &UserUpdate) -> Result<Option<User>, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter().position(|u| u.id == id) {
            Some(idx) => Self::apply_update(&mut rows, idx, update).map(Some),
            None => Ok(None),
        }
    }

    async fn update_by_name(
        &self,
        name: &str,
        update: &UserUpdate,
    ) -> Result<Option<User>, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter().position(|u| u.name == name) {
            Some(idx) => Self::apply_update(&mut rows, idx, update).map(Some),
            None => Ok(None),
        }
    }

    async fn push_task(&self, user_id: Uuid, task: NewTask) -> anyhow::Result<Option<User>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|u| u.id == user_id).map(|user| {
            user.tasks.push(Task {
                id: Uuid::new_v4(),
                title: task.title,
                datetime: task.datetime,
                status: TaskStatus::Pending,
            });
            user.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .position(|u| u.id == id)
            .map(|idx| rows.remove(idx)))
    }
}

#[derive(Default)]
pub struct MemoryNotifs {
    rows: Mutex<Vec<AdminNotif>>,
}

#[async_trait]
impl NotifRepo for MemoryNotifs {
    async fn create(&self, ad_notif: &str, title: Option<&str>) -> anyhow::Result<AdminNotif> {
        let notif = AdminNotif {
            id: Uuid::new_v4(),
            ad_notif: ad_notif.to_string(),
            title: title.map(str::to_string),
            created_at: OffsetDateTime::now_utc(),
        };
        self.rows.lock().unwrap().push(notif.clone());
        Ok(notif)
    }

    async fn list(&self) -> anyhow::Result<Vec<AdminNotif>> {
        Ok(self.rows.lock().unwrap().iter().rev().cloned().collect())
    }

    async fn latest(&self) -> anyhow::Result<Option<AdminNotif>> {
        Ok(self.rows.lock().unwrap().last().cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        ad_notif: &str,
        title: Option<&str>,
    ) -> anyhow::Result<Option<AdminNotif>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|n| n.id == id).map(|n| {
            n.ad_notif = ad_notif.to_string();
            if let Some(title) = title {
                n.title = Some(title.to_string());
            }
            n.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<AdminNotif>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .position(|n| n.id == id)
            .map(|idx| rows.remove(idx)))
    }
}

#[derive(Default)]
pub struct MemoryInfos {
    rows: Mutex<Vec<InfoEntry>>,
}

#[async_trait]
impl InfoRepo for MemoryInfos {
    async fn create(&self, info: &str) -> anyhow::Result<InfoEntry> {
        let entry = InfoEntry {
            id: Uuid::new_v4(),
            info: info.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.rows.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn list(&self) -> anyhow::Result<Vec<InfoEntry>> {
        Ok(self.rows.lock().unwrap().iter().rev().cloned().collect())
    }

    async fn update(&self, id: Uuid, info: &str) -> anyhow::Result<Option<InfoEntry>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|e| e.id == id).map(|e| {
            e.info = info.to_string();
            e.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<InfoEntry>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .position(|e| e.id == id)
            .map(|idx| rows.remove(idx)))
    }
}

/// Accepts only the tokens registered with [`FakeVerifier::allow`].
#[derive(Default)]
pub struct FakeVerifier {
    tokens: Mutex<HashMap<String, GoogleIdentity>>,
    unconfigured: Mutex<bool>,
}

impl FakeVerifier {
    pub fn allow(&self, token: &str, sub: &str, email: &str, name: Option<&str>) {
        self.tokens.lock().unwrap().insert(
            token.to_string(),
            GoogleIdentity {
                sub: sub.to_string(),
                email: email.to_string(),
                name: name.map(str::to_string),
                picture: None,
            },
        );
    }

    pub fn unconfigure(&self) {
        *self.unconfigured.lock().unwrap() = true;
    }
}

#[async_trait]
impl IdTokenVerifier for FakeVerifier {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, VerifyError> {
        if *self.unconfigured.lock().unwrap() {
            return Err(VerifyError::NotConfigured);
        }
        self.tokens
            .lock()
            .unwrap()
            .get(id_token)
            .cloned()
            .ok_or_else(|| VerifyError::Rejected("unknown token".into()))
    }
}

/// Records every conversation it is sent and answers with a canned reply.
pub struct FakeChat {
    calls: Mutex<Vec<Vec<Value>>>,
    reply: Mutex<Option<ChatReply>>,
}

impl Default for FakeChat {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reply: Mutex::new(Some(ChatReply {
                status: 200,
                body: serde_json::json!({"choices": []}),
            })),
        }
    }
}

impl FakeChat {
    pub fn reply_with(&self, status: u16, body: Value) {
        *self.reply.lock().unwrap() = Some(ChatReply { status, body });
    }

    pub fn fail(&self) {
        *self.reply.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<Vec<Value>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for FakeChat {
    async fn complete(&self, messages: Vec<Value>) -> Result<ChatReply, ChatError> {
        self.calls.lock().unwrap().push(messages);
        self.reply.lock().unwrap().clone().ok_or(ChatError::NotConfigured)
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".into(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt: JwtConfig {
            secret: "test-secret".into(),
        },
        google: GoogleConfig {
            client_id: Some("test-client".into()),
            tokeninfo_url: "http://127.0.0.1:9/tokeninfo".into(),
        },
        openai: OpenAiConfig {
            api_key: Some("sk-test".into()),
            base_url: "http://127.0.0.1:9/v1".into(),
            model: "gpt-4.1".into(),
        },
    }
}

/// Application wired to in-memory stores, driven through `oneshot`.
pub struct TestApp {
    pub state: AppState,
    pub users: Arc<MemoryUsers>,
    pub google: Arc<FakeVerifier>,
    pub chat: Arc<FakeChat>,
}

impl TestApp {
    pub fn new() -> Self {
        let google = Arc::new(FakeVerifier::default());
        Self::build(google.clone(), google)
    }

    /// App whose Google sign-in goes through `verifier` instead of the fake.
    pub fn with_verifier(verifier: Arc<dyn IdTokenVerifier>) -> Self {
        Self::build(Arc::new(FakeVerifier::default()), verifier)
    }

    fn build(google: Arc<FakeVerifier>, verifier: Arc<dyn IdTokenVerifier>) -> Self {
        let users = Arc::new(MemoryUsers::default());
        let chat = Arc::new(FakeChat::default());
        let state = AppState::from_parts(
            Arc::new(test_config()),
            users.clone(),
            Arc::new(MemoryNotifs::default()),
            Arc::new(MemoryInfos::default()),
            verifier,
            chat.clone(),
        );
        Self {
            state,
            users,
            google,
            chat,
        }
    }

    pub async fn seed_user(&self, name: &str, email: &str, password: &str, role: &str) -> User {
        self.users
            .create(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash: hash_password(password).unwrap(),
                role: role.to_string(),
                buddy_url: String::new(),
                buddy_name: String::new(),
                department: None,
                position: None,
            })
            .await
            .unwrap()
    }

    pub fn token_for(&self, user: &User) -> String {
        self.state.jwt.sign(user.id, &user.email, &user.name).unwrap()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        };
        self.dispatch(req.unwrap()).await
    }

    pub async fn send_raw(&self, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.dispatch(req).await
    }

    async fn dispatch(&self, req: Request<Body>) -> (StatusCode, Value) {
        let res = build_app(self.state.clone()).oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }
}
