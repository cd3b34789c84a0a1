//! Dial the USSD menu against an in-process router.
//!
//! `cargo run --bin ussd_simulator` replays the scripted scenarios below on one
//! phone number, so later scenarios see the customer and policy created by
//! earlier ones. `cargo run --bin ussd_simulator -- interactive` reads one
//! answer per line from stdin instead (`q` quits).

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, header},
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tower::ServiceExt;
use tracing::info;
use ussd_flow::{InMemoryLedger, InMemorySessionStorage, Ledgers};
use ussd_insurance_service::{AppState, build_router};
use uuid::Uuid;

const PHONE_NUMBER: &str = "+254712345678";
const SERVICE_CODE: &str = "*123#";

struct Scenario {
    name: &'static str,
    steps: &'static [&'static str],
}

const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "Complete Registration Flow",
        steps: &["1", "John Doe", "12345678", "1990-05-15"],
    },
    Scenario {
        name: "Buy Health Insurance",
        steps: &["2", "2", "1"],
    },
    Scenario {
        name: "Check Policy Status",
        steps: &["3"],
    },
    Scenario {
        name: "Pay Premium",
        steps: &["4", "1"],
    },
    Scenario {
        name: "Customer Support",
        steps: &["8"],
    },
];

/// One phone dialling `SERVICE_CODE`; keeps the `*`-joined answer history.
struct Dialer {
    app: Router,
    session_id: String,
    history: Vec<String>,
}

impl Dialer {
    fn new(app: Router) -> Self {
        Self {
            app,
            session_id: format!("SIM_{}", Uuid::new_v4()),
            history: Vec::new(),
        }
    }

    async fn dial(&self) -> anyhow::Result<String> {
        self.send("").await
    }

    async fn answer(&mut self, input: &str) -> anyhow::Result<String> {
        self.history.push(input.to_string());
        let text = self.history.join("*");
        self.send(&text).await
    }

    async fn send(&self, text: &str) -> anyhow::Result<String> {
        let body = format!(
            "SessionId={}&PhoneNumber={}&Text={}&ServiceCode={}",
            urlencoding::encode(&self.session_id),
            urlencoding::encode(PHONE_NUMBER),
            urlencoding::encode(text),
            urlencoding::encode(SERVICE_CODE),
        );
        let request = Request::builder()
            .method("POST")
            .uri("/api/ussd")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))?;

        let response = self.app.clone().oneshot(request).await?;
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }
}

fn print_screen(screen: &str) {
    let (tag, message) = screen.split_once(' ').unwrap_or((screen, ""));
    let width = message.lines().map(str::len).max().unwrap_or(0).max(36);

    println!("┌{}┐", "─".repeat(width + 2));
    for line in message.lines() {
        println!("│ {line:<width$} │");
    }
    println!("└{}┘", "─".repeat(width + 2));
    if tag == "END" {
        println!("[Session Ended]\n");
    }
}

fn is_final(screen: &str) -> bool {
    screen.starts_with("END ")
}

/// Play `scenario` on a fresh session and return the last screen shown.
async fn run_scenario(app: &Router, scenario: &Scenario) -> anyhow::Result<String> {
    println!("=== {} ===", scenario.name);
    let mut dialer = Dialer::new(app.clone());

    let mut screen = dialer.dial().await?;
    print_screen(&screen);

    for step in scenario.steps {
        if is_final(&screen) {
            break;
        }
        println!("→ {step}");
        screen = dialer.answer(step).await?;
        print_screen(&screen);
    }

    Ok(screen)
}

async fn run_interactive(app: &Router) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    'sessions: loop {
        let mut dialer = Dialer::new(app.clone());
        println!("Dialling {SERVICE_CODE} (session {})", dialer.session_id);
        let mut screen = dialer.dial().await?;
        print_screen(&screen);

        while !is_final(&screen) {
            let Some(line) = lines.next_line().await? else {
                break 'sessions;
            };
            let input = line.trim();
            match input {
                "q" => break 'sessions,
                "" => continue,
                _ => {
                    screen = dialer.answer(input).await?;
                    print_screen(&screen);
                }
            }
        }
    }

    Ok(())
}

fn in_memory_app() -> Router {
    build_router(AppState::new(
        Ledgers::in_memory(Arc::new(InMemoryLedger::new())),
        Arc::new(InMemorySessionStorage::new()),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("ussd_simulator=info,warn")
        .init();

    let app = in_memory_app();

    if std::env::args().nth(1).as_deref() == Some("interactive") {
        run_interactive(&app).await?;
    } else {
        for scenario in SCENARIOS {
            run_scenario(&app, scenario).await?;
        }
        info!(scenarios = SCENARIOS.len(), "Simulation finished");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_scenarios_build_on_each_other() {
        let app = in_memory_app();
        let mut last_screens = Vec::new();
        for scenario in SCENARIOS {
            last_screens.push(run_scenario(&app, scenario).await.unwrap());
        }

        assert!(last_screens[0].starts_with("END Registration successful!"));
        assert!(last_screens[1].starts_with("END Policy Created!"));
        assert!(last_screens[2].starts_with("END Your Policies:"));
        assert!(last_screens[3].starts_with("END Payment initiated!\nAmount: $50"));
        assert!(last_screens[4].starts_with("END "));
    }

    #[tokio::test]
    async fn test_dialer_accumulates_answers() {
        let mut dialer = Dialer::new(in_memory_app());
        assert!(dialer.dial().await.unwrap().starts_with("CON Welcome"));
        dialer.answer("1").await.unwrap();
        let screen = dialer.answer("Jane Doe").await.unwrap();
        assert_eq!(screen, "CON Enter your ID number:");
        assert_eq!(dialer.history, vec!["1", "Jane Doe"]);
    }
}
