use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::time::Duration;

// `#[zbus::proxy]` generates `RollcallProxy` from the daemon interface.
#[zbus::proxy(
    interface = "org.rollcall.Rollcall1",
    default_service = "org.rollcall.Rollcall1",
    default_path = "/org/rollcall/Rollcall1"
)]
trait Rollcall {
    async fn enroll(&self, roll_no: i64, name: &str, retrain: bool) -> zbus::Result<String>;
    async fn enroll_progress(&self) -> zbus::Result<String>;
    async fn cancel_enroll(&self) -> zbus::Result<bool>;
    async fn start_session(&self) -> zbus::Result<bool>;
    async fn stop_session(&self) -> zbus::Result<String>;
    async fn session_view(&self) -> zbus::Result<String>;
    async fn list_students(&self) -> zbus::Result<String>;
    async fn remove_student(&self, roll_no: i64) -> zbus::Result<bool>;
    async fn report(&self) -> zbus::Result<String>;
    async fn status(&self) -> zbus::Result<String>;
}

#[derive(Parser)]
#[command(name = "rollcall", about = "Rollcall attendance CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll a new student from the camera
    Enroll {
        /// Roll number (unique)
        #[arg(short, long)]
        roll_no: i64,
        /// Full name
        #[arg(short, long)]
        name: String,
        /// Re-capture the embedding for an already enrolled student
        #[arg(long)]
        retrain: bool,
    },
    /// Run a live attendance session until Ctrl-C
    Watch,
    /// List enrolled students
    List,
    /// Remove a student and their attendance history
    Remove { roll_no: i64 },
    /// Print the attendance report, most recent first
    Report,
    /// Show daemon status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let conn = zbus::Connection::session().await?;
    let proxy = RollcallProxy::new(&conn).await?;

    match cli.command {
        Commands::Enroll {
            roll_no,
            name,
            retrain,
        } => run_enroll(&proxy, roll_no, &name, retrain).await?,
        Commands::Watch => run_watch(&proxy).await?,
        Commands::List => {
            let students: Vec<serde_json::Value> =
                serde_json::from_str(&proxy.list_students().await?)?;
            if students.is_empty() {
                println!("no students enrolled");
            }
            for s in &students {
                println!("#{:<6} {}", s["roll_no"], s["name"].as_str().unwrap_or("?"));
            }
        }
        Commands::Remove { roll_no } => {
            proxy.remove_student(roll_no).await?;
            println!("removed student #{roll_no} and their attendance history");
        }
        Commands::Report => {
            let rows: Vec<serde_json::Value> = serde_json::from_str(&proxy.report().await?)?;
            if rows.is_empty() {
                println!("no attendance recorded");
            }
            for r in &rows {
                println!(
                    "{} {}  #{:<6} {}",
                    r["date"].as_str().unwrap_or("?"),
                    r["time"].as_str().unwrap_or("?"),
                    r["roll_no"],
                    r["name"].as_str().unwrap_or("?"),
                );
            }
        }
        Commands::Status => {
            let status: serde_json::Value = serde_json::from_str(&proxy.status().await?)?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}

/// Drive an enrollment, mirroring daemon-side progress to the terminal.
/// Ctrl-C requests cancellation and waits for the daemon to confirm.
async fn run_enroll(proxy: &RollcallProxy<'_>, roll_no: i64, name: &str, retrain: bool) -> Result<()> {
    println!("enrolling {name} (#{roll_no}); look at the camera");

    let enroll_fut = proxy.enroll(roll_no, name, retrain);
    tokio::pin!(enroll_fut);

    let mut last_line = String::new();
    let outcome = loop {
        tokio::select! {
            result = &mut enroll_fut => break result,
            _ = tokio::signal::ctrl_c() => {
                proxy.cancel_enroll().await?;
            }
            _ = tokio::time::sleep(Duration::from_millis(300)) => {
                if let Ok(progress) = proxy.enroll_progress().await {
                    let line = progress_line(&progress);
                    if !line.is_empty() && line != last_line {
                        print!("\r\x1b[2K{line}");
                        std::io::stdout().flush().ok();
                        last_line = line;
                    }
                }
            }
        }
    };
    println!();

    let outcome: serde_json::Value = serde_json::from_str(&outcome?)?;
    let verb = if outcome["retrained"].as_bool().unwrap_or(false) {
        "retrained"
    } else {
        "enrolled"
    };
    println!(
        "{} {} (#{}) from {} samples",
        verb, outcome["name"].as_str().unwrap_or("?"), outcome["roll_no"], outcome["samples_used"],
    );
    Ok(())
}

/// Start a session, print the live view until Ctrl-C, then stop and
/// print the summary.
async fn run_watch(proxy: &RollcallProxy<'_>) -> Result<()> {
    proxy.start_session().await?;
    println!("session running; press Ctrl-C to stop");

    let mut last_line = String::new();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(Duration::from_millis(500)) => {
                if let Ok(view) = proxy.session_view().await {
                    let line = view_line(&view);
                    if !line.is_empty() && line != last_line {
                        println!("{line}");
                        last_line = line;
                    }
                }
            }
        }
    }

    let summary: serde_json::Value = serde_json::from_str(&proxy.stop_session().await?)?;
    let marked = summary["marked"].as_array().cloned().unwrap_or_default();
    println!(
        "session ended: {} frames captured, {} students newly marked",
        summary["frames_captured"],
        marked.len()
    );
    for m in &marked {
        println!("  #{:<6} {}", m["roll_no"], m["name"].as_str().unwrap_or("?"));
    }
    Ok(())
}

fn progress_line(progress_json: &str) -> String {
    let Ok(p) = serde_json::from_str::<serde_json::Value>(progress_json) else {
        return String::new();
    };
    match p["phase"].as_str() {
        Some("collecting") => {
            let accepted = p["accepted"].as_u64().unwrap_or(0);
            let target = p["target"].as_u64().unwrap_or(0);
            match p["state"].as_str() {
                Some("no_face") => format!("{accepted}/{target} — no face detected"),
                Some("multiple_faces") => format!("{accepted}/{target} — multiple faces detected"),
                _ => format!("{accepted}/{target} frames captured"),
            }
        }
        Some("extracting") => format!(
            "processing samples {}/{}",
            p["done"].as_u64().unwrap_or(0),
            p["total"].as_u64().unwrap_or(0)
        ),
        _ => String::new(),
    }
}

fn view_line(view_json: &str) -> String {
    let Ok(view) = serde_json::from_str::<serde_json::Value>(view_json) else {
        return String::new();
    };
    let Some(faces) = view["faces"].as_array() else {
        return String::new();
    };
    if faces.is_empty() {
        return "no faces in view".to_string();
    }

    let labels: Vec<String> = faces
        .iter()
        .map(|face| {
            let label = &face["label"];
            if label["kind"].as_str() == Some("known") {
                format!(
                    "{} (#{})",
                    label["name"].as_str().unwrap_or("?"),
                    label["roll_no"]
                )
            } else {
                "unknown".to_string()
            }
        })
        .collect();
    labels.join(", ")
}
