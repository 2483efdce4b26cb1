use std::{error::Error, io::Write};

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, EngineError};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "hyperbank_admin")]
#[command(about = "Admin utilities for Hyperbank (bootstrap logins, run schedules)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./hyperbank.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login(Login),
    Schedules(Schedules),
}

#[derive(Args, Debug)]
struct Login {
    #[command(subcommand)]
    command: LoginCommand,
}

#[derive(Subcommand, Debug)]
enum LoginCommand {
    /// Create an already verified login, prompting for its password.
    Create(LoginEmailArgs),
    /// Mark an existing login as verified without the emailed link.
    Verify(LoginEmailArgs),
}

#[derive(Args, Debug)]
struct LoginEmailArgs {
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct Schedules {
    #[command(subcommand)]
    command: SchedulesCommand,
}

#[derive(Subcommand, Debug)]
enum SchedulesCommand {
    /// Fire every schedule that is due now.
    Run,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Login(Login {
            command: LoginCommand::Create(args),
        }) => {
            let password = prompt_password_twice()?;

            let login = match engine.register(&args.email, &password).await {
                Ok(login) => login,
                Err(EngineError::ExistingKey(email)) => {
                    eprintln!("login already exists: {email}");
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            };
            engine.verify_login(login.id).await?;

            println!("created login: {} ({})", login.email, login.id);
        }
        Command::Login(Login {
            command: LoginCommand::Verify(args),
        }) => match engine.verify_login_by_email(&args.email).await? {
            Some(login) => println!("verified login: {} ({})", login.email, login.id),
            None => {
                eprintln!("login not found: {}", args.email);
                std::process::exit(1);
            }
        },
        Command::Schedules(Schedules {
            command: SchedulesCommand::Run,
        }) => {
            let runs = engine.run_due_schedules(Utc::now()).await?;
            if runs.is_empty() {
                println!("no schedule due");
            }
            let mut failed = false;
            for (schedule_id, run) in runs {
                match run {
                    Ok(run) => println!(
                        "schedule {schedule_id}: transaction {} of {}, next run {}",
                        run.transaction.id, run.transaction.amount, run.next_run
                    ),
                    Err(err) => {
                        failed = true;
                        eprintln!("schedule {schedule_id} failed: {err}");
                    }
                }
            }
            if failed {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
