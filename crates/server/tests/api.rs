use std::sync::{Arc, Mutex};

use api_types::{
    ErrorResponse, Rel, Resource,
    account::{AccountResponse, AccountResponseCollection},
    home::HomeResponse,
    login::{LoginResponse, RegisterResponse},
    schedule::{SchedulePeriod, ScheduleResponse, ScheduleResponseCollection},
    transaction::{TransactionResponse, TransactionResponseCollection},
};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{Engine, EngineError, PasswordHasher};
use migration::MigratorTrait;
use server::{LOGIN_FAILED, Mailer, ServerState, TokenService, router};

#[derive(Debug)]
struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, plain: &str) -> Result<String, EngineError> {
        Ok(format!("plain:{plain}"))
    }

    fn verify(&self, plain: &str, hash: &str) -> bool {
        hash.strip_prefix("plain:") == Some(plain)
    }
}

/// Keeps every verification link instead of mailing it.
#[derive(Debug, Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    fn link_for(&self, email: &str) -> String {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, link)| link.clone())
            .unwrap()
    }
}

impl Mailer for RecordingMailer {
    fn send_verification(&self, email: &str, link: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), link.to_string()));
    }
}

struct TestApp {
    router: Router,
    mailer: Arc<RecordingMailer>,
}

async fn app() -> TestApp {
    let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db)
        .hasher(Arc::new(PlainHasher))
        .build()
        .await
        .unwrap();
    let mailer = Arc::new(RecordingMailer::default());
    let state = ServerState::new(
        Arc::new(engine),
        TokenService::new(b"test-secret", 60),
        mailer.clone(),
    );
    TestApp {
        router: router(state),
        mailer,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    async fn get<T: DeserializeOwned>(&self, uri: &str, token: Option<&str>) -> T {
        let (status, body) = self.send(Method::GET, uri, token, None).await;
        assert_eq!(status, StatusCode::OK, "GET {uri}");
        serde_json::from_slice(&body).unwrap()
    }

    async fn post<T: DeserializeOwned>(
        &self,
        uri: &str,
        token: Option<&str>,
        body: Value,
        expected: StatusCode,
    ) -> T {
        let (status, bytes) = self.send(Method::POST, uri, token, Some(body)).await;
        assert_eq!(status, expected, "POST {uri}");
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Register, follow the emailed link and log in. Returns the token.
    async fn signed_in(&self, email: &str, password: &str) -> String {
        let home: HomeResponse = self.get("/", None).await;
        let _: RegisterResponse = self
            .post(
                &home.link(Rel::Self_).unwrap().href,
                None,
                json!({"email": email, "password": password}),
                StatusCode::CREATED,
            )
            .await;
        let link = self.mailer.link_for(email);
        let _: HomeResponse = self.get(&link, None).await;

        let session: LoginResponse = self
            .post(
                &home.link(Rel::Login).unwrap().href,
                None,
                json!({"email": email, "password": password}),
                StatusCode::OK,
            )
            .await;
        session.token
    }

    async fn new_account(&self, token: &str, name: &str) -> AccountResponse {
        let home: HomeResponse = self.get("/", Some(token)).await;
        self.post(
            &home.link(Rel::Account).unwrap().href,
            Some(token),
            json!({"account_name": name}),
            StatusCode::CREATED,
        )
        .await
    }
}

fn rels(resource: &impl Resource) -> Vec<Rel> {
    resource.links().iter().map(|l| l.rel).collect()
}

#[tokio::test]
async fn anonymous_home_offers_login() {
    let app = app().await;
    let home: HomeResponse = app.get("/", None).await;

    assert_eq!(home.email, None);
    assert_eq!(rels(&home), vec![Rel::Login, Rel::Self_, Rel::Home]);
}

#[tokio::test]
async fn ledger_scenario_by_following_links() {
    let app = app().await;
    let token = app.signed_in("a@x.com", "pw1").await;

    let home: HomeResponse = app.get("/", Some(&token)).await;
    assert_eq!(home.email.as_deref(), Some("a@x.com"));
    assert_eq!(rels(&home), vec![Rel::Account, Rel::Self_, Rel::Home]);

    let account = app.new_account(&token, "Checking").await;
    assert_eq!(account.account_name, "Checking");
    let transactions_href = account.link(Rel::Transaction).unwrap().href.clone();

    let first: TransactionResponse = app
        .post(
            &transactions_href,
            Some(&token),
            json!({"amount_minor": 145}),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(first.balance_minor, 145);

    let second: TransactionResponse = app
        .post(
            &transactions_href,
            Some(&token),
            json!({"amount_minor": 278}),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(second.balance_minor, 423);

    let list: TransactionResponseCollection = app.get(&transactions_href, Some(&token)).await;
    let view: Vec<(i64, i64)> = list
        .transactions
        .iter()
        .map(|tx| (tx.amount_minor, tx.balance_minor))
        .collect();
    assert_eq!(view, vec![(278, 423), (145, 145)]);

    let again: TransactionResponse = app
        .get(&second.link(Rel::Self_).unwrap().href, Some(&token))
        .await;
    assert_eq!(again.transaction_id, second.transaction_id);
    let back: AccountResponse = app
        .get(&again.link(Rel::Account).unwrap().href, Some(&token))
        .await;
    assert_eq!(back.account_id, account.account_id);
}

#[tokio::test]
async fn unverified_login_cannot_sign_in() {
    let app = app().await;
    let _: RegisterResponse = app
        .post(
            "/",
            None,
            json!({"email": "a@x.com", "password": "pw1"}),
            StatusCode::CREATED,
        )
        .await;

    let error: ErrorResponse = app
        .post(
            "/login",
            None,
            json!({"email": "a@x.com", "password": "pw1"}),
            StatusCode::UNAUTHORIZED,
        )
        .await;
    assert_eq!(error.error, LOGIN_FAILED);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = app().await;
    app.signed_in("a@x.com", "pw1").await;

    let wrong: ErrorResponse = app
        .post(
            "/login",
            None,
            json!({"email": "a@x.com", "password": "nope"}),
            StatusCode::UNAUTHORIZED,
        )
        .await;
    let unknown: ErrorResponse = app
        .post(
            "/login",
            None,
            json!({"email": "z@x.com", "password": "pw1"}),
            StatusCode::UNAUTHORIZED,
        )
        .await;
    assert_eq!(wrong.error, unknown.error);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = app().await;
    let body = json!({"email": "a@x.com", "password": "pw1"});
    let _: RegisterResponse = app.post("/", None, body.clone(), StatusCode::CREATED).await;
    let _: ErrorResponse = app.post("/", None, body, StatusCode::CONFLICT).await;
}

#[tokio::test]
async fn invalid_token_is_rejected() {
    let app = app().await;
    let (status, _) = app.send(Method::GET, "/", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn anonymous_caller_cannot_list_accounts() {
    let app = app().await;
    let (status, _) = app.send(Method::GET, "/accounts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn other_login_gets_404_for_foreign_account() {
    let app = app().await;
    let owner = app.signed_in("a@x.com", "pw1").await;
    let intruder = app.signed_in("b@x.com", "pw2").await;
    let account = app.new_account(&owner, "Checking").await;

    let href = account.link(Rel::Self_).unwrap().href.clone();
    let (status, _) = app.send(Method::GET, &href, Some(&intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let transactions_href = account.link(Rel::Transaction).unwrap().href.clone();
    let (status, _) = app
        .send(
            Method::POST,
            &transactions_href,
            Some(&intruder),
            Some(json!({"amount_minor": 100})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mine: AccountResponseCollection = app.get("/accounts", Some(&intruder)).await;
    assert!(mine.accounts.is_empty());
}

#[tokio::test]
async fn zero_amount_is_unprocessable() {
    let app = app().await;
    let token = app.signed_in("a@x.com", "pw1").await;
    let account = app.new_account(&token, "Checking").await;

    let _: ErrorResponse = app
        .post(
            &account.link(Rel::Transaction).unwrap().href,
            Some(&token),
            json!({"amount_minor": 0}),
            StatusCode::UNPROCESSABLE_ENTITY,
        )
        .await;
}

#[tokio::test]
async fn password_change_via_session_link() {
    let app = app().await;
    app.signed_in("a@x.com", "pw1").await;
    let session: LoginResponse = app
        .post(
            "/login",
            None,
            json!({"email": "a@x.com", "password": "pw1"}),
            StatusCode::OK,
        )
        .await;
    assert_eq!(rels(&session), vec![Rel::Home, Rel::Password]);
    let password_href = session.link(Rel::Password).unwrap().href.clone();

    let (status, _) = app
        .send(
            Method::PUT,
            &password_href,
            Some(&session.token),
            Some(json!({"old_password": "wrong", "new_password": "pw2"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(
            Method::PUT,
            &password_href,
            Some(&session.token),
            Some(json!({"old_password": "pw1", "new_password": "pw2"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let _: ErrorResponse = app
        .post(
            "/login",
            None,
            json!({"email": "a@x.com", "password": "pw1"}),
            StatusCode::UNAUTHORIZED,
        )
        .await;
    let _: LoginResponse = app
        .post(
            "/login",
            None,
            json!({"email": "a@x.com", "password": "pw2"}),
            StatusCode::OK,
        )
        .await;
}

#[tokio::test]
async fn deleting_account_hides_its_transactions() {
    let app = app().await;
    let token = app.signed_in("a@x.com", "pw1").await;
    let account = app.new_account(&token, "Checking").await;
    let transactions_href = account.link(Rel::Transaction).unwrap().href.clone();
    let _: TransactionResponse = app
        .post(
            &transactions_href,
            Some(&token),
            json!({"amount_minor": 100}),
            StatusCode::CREATED,
        )
        .await;

    let (status, body) = app
        .send(
            Method::DELETE,
            &account.link(Rel::Self_).unwrap().href,
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let deleted: AccountResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(rels(&deleted), vec![Rel::Account, Rel::Home]);

    let (status, _) = app
        .send(Method::GET, &transactions_href, Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_login_token_is_a_server_fault() {
    let app = app().await;
    let token = app.signed_in("a@x.com", "pw1").await;
    let home: HomeResponse = app.get("/", Some(&token)).await;

    let (status, body) = app
        .send(
            Method::DELETE,
            &home.link(Rel::Self_).unwrap().href,
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let gone: HomeResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(rels(&gone), vec![Rel::Home]);

    // The token outlives its login: the store no longer has what it names.
    let (status, _) = app.send(Method::GET, "/", Some(&token), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn deleted_login_can_no_longer_sign_in() {
    let app = app().await;
    let token = app.signed_in("a@x.com", "pw1").await;
    let home: HomeResponse = app.get("/", Some(&token)).await;

    let (status, _) = app
        .send(
            Method::DELETE,
            &home.link(Rel::Self_).unwrap().href,
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let anonymous: HomeResponse = app.get("/", None).await;
    let error: ErrorResponse = app
        .post(
            &anonymous.link(Rel::Login).unwrap().href,
            None,
            json!({"email": "a@x.com", "password": "pw1"}),
            StatusCode::UNAUTHORIZED,
        )
        .await;
    assert_eq!(error.error, LOGIN_FAILED);
}

#[tokio::test]
async fn old_verification_link_does_not_verify_a_new_registration() {
    let app = app().await;
    let token = app.signed_in("a@x.com", "pw1").await;
    let stale_link = app.mailer.link_for("a@x.com");
    app.signed_in("b@x.com", "pw1").await;

    let (status, _) = app.send(Method::DELETE, "/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let _: RegisterResponse = app
        .post(
            "/",
            None,
            json!({"email": "a@x.com", "password": "pw2"}),
            StatusCode::CREATED,
        )
        .await;

    let (status, _) = app.send(Method::GET, &stale_link, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let _: ErrorResponse = app
        .post(
            "/login",
            None,
            json!({"email": "a@x.com", "password": "pw2"}),
            StatusCode::UNAUTHORIZED,
        )
        .await;

    let fresh_link = app.mailer.link_for("a@x.com");
    let _: HomeResponse = app.get(&fresh_link, None).await;
    let _: LoginResponse = app
        .post(
            "/login",
            None,
            json!({"email": "a@x.com", "password": "pw2"}),
            StatusCode::OK,
        )
        .await;
}

#[tokio::test]
async fn schedules_are_created_listed_and_deleted() {
    let app = app().await;
    let token = app.signed_in("a@x.com", "pw1").await;
    let account = app.new_account(&token, "Checking").await;
    let schedules_href = account.link(Rel::Schedule).unwrap().href.clone();

    let schedule: ScheduleResponse = app
        .post(
            &schedules_href,
            Some(&token),
            json!({
                "time_period": "week",
                "next_run": "2030-01-01T09:00:00+02:00",
                "amount_minor": 300
            }),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(schedule.time_period, SchedulePeriod::Week);
    assert_eq!(schedule.amount_minor, 300);
    assert_eq!(schedule.next_run.to_rfc3339(), "2030-01-01T07:00:00+00:00");

    let list: ScheduleResponseCollection = app.get(&schedules_href, Some(&token)).await;
    assert_eq!(list.schedules.len(), 1);
    assert_eq!(rels(&list), vec![Rel::Self_, Rel::Account, Rel::Home]);

    let (status, body) = app
        .send(
            Method::DELETE,
            &schedule.link(Rel::Self_).unwrap().href,
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let deleted: ScheduleResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(rels(&deleted), vec![Rel::Schedule, Rel::Account]);

    let list: ScheduleResponseCollection = app.get(&schedules_href, Some(&token)).await;
    assert!(list.schedules.is_empty());
}

#[tokio::test]
async fn unknown_schedule_period_is_rejected() {
    let app = app().await;
    let token = app.signed_in("a@x.com", "pw1").await;
    let account = app.new_account(&token, "Checking").await;

    let (status, _) = app
        .send(
            Method::POST,
            &account.link(Rel::Schedule).unwrap().href,
            Some(&token),
            Some(json!({
                "time_period": "fortnight",
                "next_run": "2030-01-01T09:00:00Z",
                "amount_minor": 300
            })),
        )
        .await;
    assert!(status.is_client_error());
}
