//! # Boot Example
//!
//! A small service booted through every phase:
//! - `Init` / `Register`: defaults and services without configuration
//! - `Config`: renders a config template against the environment
//! - `Prepare`: builds the main service from the configuration
//! - `Run`: an HTTP-like ticker plus a job that finishes after a few ticks
//! - `Exit`: flushes a counter
//!
//! The job finishing asks the ticker to stop; Ctrl-C (or SIGTERM) stops both.
//!
//! ## Run
//! ```bash
//! PG_USER=foo PG_PASSWORD=bar RUST_LOG=debug cargo run --example boot
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bootvisor::template;
use bootvisor::{Container, Lifecycle, LifecycleConfig, LogWriter, Signal, TaskError, TaskFn};
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"
dsn  = "{{ env "PG_USER" }}:{{ env "PG_PASSWORD" }}@localhost/app"
tick = 200
"#;

/// Main service built in `Prepare`.
struct Database {
    dsn: String,
    queries: AtomicU64,
}

impl Database {
    fn query(&self) -> u64 {
        self.queries.fetch_add(1, Ordering::Relaxed) + 1
    }
}

fn tick_ms(config: &str) -> u64 {
    config
        .lines()
        .find_map(|l| l.strip_prefix("tick = "))
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(500)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cfg = LifecycleConfig {
        handle_signals: true,
        ..LifecycleConfig::default()
    };
    let mut lifecycle = Lifecycle::new(cfg);
    lifecycle.subscribe(Arc::new(LogWriter));

    lifecycle
        .on_init(|app| {
            app.register_value("app.name", String::from("boot-demo"))?;
            Ok(())
        })
        .on_config(|app| {
            let rendered = template::render_env(CONFIG)?;
            app.register_value("config", rendered)?;
            Ok(())
        })
        .on_prepare(|app| {
            app.register("db", |app| {
                let config = app.get_string("config")?;
                let dsn = config
                    .lines()
                    .find_map(|l| l.strip_prefix("dsn  = "))
                    .map(|v| v.trim_matches('"').to_string())
                    .unwrap_or_default();
                Ok(Database {
                    dsn,
                    queries: AtomicU64::new(0),
                })
            })?;
            Ok(())
        })
        .on_exit(|app| {
            if app.is_built("db") {
                let db = app.resolve_as::<Database>("db")?;
                println!("[exit] {} queries against {}", db.queries.load(Ordering::Relaxed), db.dsn);
            }
            Ok(())
        });

    lifecycle.on_run(TaskFn::arc("ticker", |app: Arc<Container>, signal: Signal| async move {
        let name = app.get_string("app.name")?;
        let period = Duration::from_millis(tick_ms(&app.get_string("config")?));
        let db = app.resolve_as::<Database>("db")?;

        loop {
            tokio::select! {
                _ = signal.stopped() => break,
                _ = tokio::time::sleep(period) => {
                    println!("[{name}] tick, query #{}", db.query());
                }
            }
        }
        Ok::<(), TaskError>(())
    }));

    lifecycle.on_run(TaskFn::arc("job", |app: Arc<Container>, signal: Signal| async move {
        let db = app.resolve_as::<Database>("db")?;
        for _ in 0..5 {
            if signal.is_stop_requested() {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(300)).await;
            db.query();
        }
        println!("[job] done");
        Ok::<(), TaskError>(())
    }));

    std::process::exit(lifecycle.go(Container::shared()).await);
}
