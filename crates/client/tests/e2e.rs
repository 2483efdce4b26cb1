use std::sync::{Arc, Mutex};

use api_types::{
    Rel,
    account::{AccountRequest, AccountResponse, AccountResponseCollection},
    home::HomeResponse,
    login::{ChangePasswordRequest, ChangePasswordResponse},
    schedule::{SchedulePeriod, ScheduleRequest, ScheduleResponse},
    transaction::{TransactionRequest, TransactionResponse, TransactionResponseCollection},
};
use chrono::{TimeDelta, Utc};
use client::{Client, ClientError};
use engine::Engine;
use migration::MigratorTrait;
use server::{Mailer, ServerState, TokenService};

#[derive(Debug, Default)]
struct Outbox {
    links: Mutex<Vec<String>>,
}

impl Outbox {
    fn last(&self) -> String {
        self.links.lock().unwrap().last().cloned().unwrap()
    }
}

impl Mailer for Outbox {
    fn send_verification(&self, _email: &str, link: &str) {
        self.links.lock().unwrap().push(link.to_string());
    }
}

struct Running {
    base_url: String,
    engine: Arc<Engine>,
    outbox: Arc<Outbox>,
}

async fn spawn_server() -> Running {
    let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Arc::new(Engine::builder().database(db).build().await.unwrap());
    let outbox = Arc::new(Outbox::default());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");
    let state = ServerState::new(
        engine.clone(),
        TokenService::new(b"e2e-secret", 60),
        outbox.clone(),
    )
    .with_public_url(&base_url);
    server::spawn_with_listener(state, listener).unwrap();

    Running {
        base_url,
        engine,
        outbox,
    }
}

/// Register, verify through the emailed link and log in.
async fn signed_in_client(running: &Running, email: &str, password: &str) -> Client {
    let mut client = Client::new(&running.base_url).unwrap();
    client.register(email, password).await.unwrap();
    let _: HomeResponse = client.open(&running.outbox.last()).await.unwrap();
    client.login(email, password).await.unwrap();
    client
}

#[tokio::test]
async fn checking_account_scenario() {
    let running = spawn_server().await;
    let client = signed_in_client(&running, "a@x.com", "pw1").await;

    let home = client.home().await.unwrap();
    assert_eq!(home.email.as_deref(), Some("a@x.com"));

    let account: AccountResponse = client
        .post(
            &home,
            Rel::Account,
            &AccountRequest {
                account_name: "Checking".to_string(),
            },
        )
        .await
        .unwrap();

    let first: TransactionResponse = client
        .post(
            &account,
            Rel::Transaction,
            &TransactionRequest { amount_minor: 145 },
        )
        .await
        .unwrap();
    assert_eq!(first.balance_minor, 145);

    let second: TransactionResponse = client
        .post(
            &account,
            Rel::Transaction,
            &TransactionRequest { amount_minor: 278 },
        )
        .await
        .unwrap();
    assert_eq!(second.balance_minor, 423);

    let list: TransactionResponseCollection =
        client.get(&account, Rel::Transaction).await.unwrap();
    let view: Vec<(i64, i64)> = list
        .transactions
        .iter()
        .map(|tx| (tx.amount_minor, tx.balance_minor))
        .collect();
    assert_eq!(view, vec![(278, 423), (145, 145)]);

    let back_home: HomeResponse = client.get(&list, Rel::Home).await.unwrap();
    let accounts: AccountResponseCollection =
        client.get(&back_home, Rel::Account).await.unwrap();
    assert_eq!(accounts.accounts.len(), 1);
    assert_eq!(accounts.accounts[0].account_name, "Checking");
}

#[tokio::test]
async fn unverified_login_is_refused() {
    let running = spawn_server().await;
    let mut client = Client::new(&running.base_url).unwrap();
    client.register("a@x.com", "pw1").await.unwrap();

    let err = client.login("a@x.com", "pw1").await.unwrap_err();
    match err {
        ClientError::Unauthorized(message) => assert_eq!(message, "Unknown Email or Password."),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(client.token(), None);
}

#[tokio::test]
async fn anonymous_home_has_no_account_link() {
    let running = spawn_server().await;
    let client = Client::new(&running.base_url).unwrap();

    let home = client.home().await.unwrap();
    let err = client
        .get::<AccountResponseCollection>(&home, Rel::Account)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Link(_)));
}

#[tokio::test]
async fn password_change_through_session() {
    let running = spawn_server().await;
    let mut client = signed_in_client(&running, "a@x.com", "pw1").await;
    let session = client.login("a@x.com", "pw1").await.unwrap();

    let changed: ChangePasswordResponse = client
        .put(
            &session,
            Rel::Password,
            &ChangePasswordRequest {
                old_password: "pw1".to_string(),
                new_password: "pw2".to_string(),
            },
        )
        .await
        .unwrap();
    assert!(changed.links.iter().any(|l| l.rel == Rel::Home));

    assert!(matches!(
        client.login("a@x.com", "pw1").await,
        Err(ClientError::Unauthorized(_))
    ));
    client.login("a@x.com", "pw2").await.unwrap();
}

#[tokio::test]
async fn due_schedule_shows_up_in_transactions() {
    let running = spawn_server().await;
    let client = signed_in_client(&running, "a@x.com", "pw1").await;
    let home = client.home().await.unwrap();
    let account: AccountResponse = client
        .post(
            &home,
            Rel::Account,
            &AccountRequest {
                account_name: "Savings".to_string(),
            },
        )
        .await
        .unwrap();

    let tomorrow = Utc::now() + TimeDelta::days(1);
    let schedule: ScheduleResponse = client
        .post(
            &account,
            Rel::Schedule,
            &ScheduleRequest {
                time_period: SchedulePeriod::Week,
                next_run: tomorrow.fixed_offset(),
                amount_minor: 300,
            },
        )
        .await
        .unwrap();

    assert!(running.engine.run_due_schedules(Utc::now()).await.unwrap().is_empty());

    let later = tomorrow + TimeDelta::hours(1);
    let runs = running.engine.run_due_schedules(later).await.unwrap();
    assert_eq!(runs.len(), 1);

    let list: TransactionResponseCollection =
        client.get(&account, Rel::Transaction).await.unwrap();
    assert_eq!(list.transactions.len(), 1);
    assert_eq!(list.transactions[0].amount_minor, 300);
    assert_eq!(list.transactions[0].balance_minor, 300);

    let refreshed: ScheduleResponse = client.get(&schedule, Rel::Self_).await.unwrap();
    assert_eq!(
        refreshed.next_run.timestamp(),
        (tomorrow + TimeDelta::weeks(1)).timestamp()
    );
}

#[tokio::test]
async fn deleted_account_is_gone() {
    let running = spawn_server().await;
    let client = signed_in_client(&running, "a@x.com", "pw1").await;
    let home = client.home().await.unwrap();
    let account: AccountResponse = client
        .post(
            &home,
            Rel::Account,
            &AccountRequest {
                account_name: "Checking".to_string(),
            },
        )
        .await
        .unwrap();

    let deleted: AccountResponse = client.delete(&account, Rel::Self_).await.unwrap();
    let accounts: AccountResponseCollection = client.get(&deleted, Rel::Account).await.unwrap();
    assert!(accounts.accounts.is_empty());

    let err = client
        .get::<AccountResponse>(&account, Rel::Self_)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotFound));
}
