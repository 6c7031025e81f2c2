use std::sync::{Arc, Mutex};

use bootvisor::{
    CallbackError, Container, ErrorPolicy, Lifecycle, LifecycleConfig, Phase, Signal, TaskError,
    TaskFn,
};

type Journal = Arc<Mutex<Vec<String>>>;

fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(j: &Journal) -> Vec<String> {
    j.lock().unwrap().clone()
}

/// Adds a callback to `phase` that records `label` and the container phase it saw.
fn record(lc: &mut Lifecycle, phase: Phase, j: &Journal, label: &'static str) {
    let j = Arc::clone(j);
    let f = move |app: &Container| -> Result<(), bootvisor::BoxError> {
        j.lock().unwrap().push(format!("{label}@{}", app.phase()));
        Ok(())
    };
    match phase {
        Phase::Init => lc.on_init(f),
        Phase::Register => lc.on_register(f),
        Phase::Config => lc.on_config(f),
        Phase::Prepare => lc.on_prepare(f),
        Phase::Exit => lc.on_exit(f),
        other => panic!("no callbacks in {other}"),
    };
}

fn propagate() -> LifecycleConfig {
    LifecycleConfig {
        callback_errors: ErrorPolicy::Propagate,
        ..LifecycleConfig::default()
    }
}

#[tokio::test]
async fn phases_run_in_order_and_callbacks_in_registration_order() {
    let j = journal();
    let mut lc = Lifecycle::default();

    // Registered out of phase order on purpose.
    record(&mut lc, Phase::Exit, &j, "exit");
    record(&mut lc, Phase::Prepare, &j, "prepare");
    record(&mut lc, Phase::Init, &j, "init-1");
    record(&mut lc, Phase::Config, &j, "config");
    record(&mut lc, Phase::Register, &j, "register");
    record(&mut lc, Phase::Init, &j, "init-2");

    let run_j = Arc::clone(&j);
    lc.on_run(TaskFn::arc("main", move |app: Arc<Container>, _s: Signal| {
        let j = Arc::clone(&run_j);
        async move {
            j.lock().unwrap().push(format!("main@{}", app.phase()));
            Ok::<(), TaskError>(())
        }
    }));

    let app = Container::shared();
    let report = lc.run(Arc::clone(&app)).await.unwrap();

    assert_eq!(report.exit_code(), 0);
    assert_eq!(
        entries(&j),
        vec![
            "init-1@init",
            "init-2@init",
            "register@register",
            "config@config",
            "prepare@prepare",
            "main@run",
            "exit@exit",
        ]
    );
    assert!(app.is_terminated());
    assert_eq!(report.container().phase(), Phase::Terminated);
}

#[tokio::test]
async fn services_registered_in_setup_are_visible_to_workers() {
    let mut lc = Lifecycle::default();
    lc.on_register(|app| {
        app.register("greeting", |_| Ok(String::from("Salut")))?;
        Ok(())
    });
    lc.on_prepare(|app| {
        app.register("banner", |app| Ok(format!("{} !", app.get_string("greeting")?)))?;
        Ok(())
    });
    lc.on_run(TaskFn::arc("check", |app: Arc<Container>, _s: Signal| async move {
        if app.get_string("banner")? != "Salut !" {
            return Err(TaskError::fail("wrong banner"));
        }
        Ok::<(), TaskError>(())
    }));

    let report = lc.run(Container::shared()).await.unwrap();
    assert_eq!(report.exit_code(), 0);
    assert!(report.container().is_built("greeting"));
}

#[tokio::test]
async fn ignored_callback_errors_are_recorded_but_do_not_fail() {
    let j = journal();
    let mut lc = Lifecycle::default();
    lc.on_config(|_| Err("missing dsn".into()));
    record(&mut lc, Phase::Config, &j, "config-2");
    record(&mut lc, Phase::Prepare, &j, "prepare");
    lc.on_run(TaskFn::arc("main", |_a: Arc<Container>, _s: Signal| async {
        Ok::<(), TaskError>(())
    }));

    let report = lc.run(Container::shared()).await.unwrap();

    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.halted_at(), None);
    assert_eq!(entries(&j), vec!["config-2@config", "prepare@prepare"]);

    let failures = report.callback_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].phase, Phase::Config);
    assert_eq!(failures[0].index, 0);
    assert_eq!(failures[0].error.to_string(), "callback failed: missing dsn");
    assert!(report.outcome("main").unwrap().is_success());
}

#[tokio::test]
async fn propagated_callback_error_skips_run_but_not_exit() {
    let j = journal();
    let mut lc = Lifecycle::new(propagate());
    record(&mut lc, Phase::Register, &j, "register");
    lc.on_config(|_| Err("bad config".into()));
    record(&mut lc, Phase::Config, &j, "config-2");
    record(&mut lc, Phase::Prepare, &j, "prepare");
    record(&mut lc, Phase::Exit, &j, "exit");

    let ran = Arc::new(Mutex::new(false));
    let r = Arc::clone(&ran);
    lc.on_run(TaskFn::arc("never", move |_a: Arc<Container>, _s: Signal| {
        *r.lock().unwrap() = true;
        async { Ok::<(), TaskError>(()) }
    }));

    let app = Container::shared();
    let report = lc.run(Arc::clone(&app)).await.unwrap();

    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.halted_at(), Some(Phase::Config));
    assert!(report.outcomes().is_empty());
    assert!(!*ran.lock().unwrap());
    assert_eq!(entries(&j), vec!["register@register", "exit@exit"]);
    assert!(app.is_terminated());
}

#[tokio::test]
async fn exit_callbacks_all_run_even_when_they_fail() {
    let j = journal();
    let mut lc = Lifecycle::new(propagate());
    lc.on_exit(|_| Err("flush failed".into()));
    record(&mut lc, Phase::Exit, &j, "exit-2");

    let report = lc.run(Container::shared()).await.unwrap();

    assert_eq!(entries(&j), vec!["exit-2@exit"]);
    assert_eq!(report.callback_failures().len(), 1);
    assert_eq!(report.callback_failures()[0].phase, Phase::Exit);
    // Setup completed, so nothing halted, but a propagated failure still fails the run.
    assert_eq!(report.halted_at(), None);
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn exit_runs_after_worker_failure() {
    let j = journal();
    let mut lc = Lifecycle::default();
    record(&mut lc, Phase::Exit, &j, "exit");
    lc.on_run(TaskFn::arc("broken", |_a: Arc<Container>, _s: Signal| async {
        Err::<(), TaskError>(TaskError::fail("boom"))
    }));

    let report = lc.run(Container::shared()).await.unwrap();
    assert_eq!(report.exit_code(), 1);
    assert_eq!(entries(&j), vec!["exit@exit"]);
}

#[tokio::test]
async fn panicking_callback_is_captured() {
    let mut lc = Lifecycle::default();
    lc.on_init(|_| panic!("init exploded"));

    let report = lc.run(Container::shared()).await.unwrap();

    let failures = report.callback_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].phase, Phase::Init);
    assert!(matches!(
        &failures[0].error,
        CallbackError::Panicked { message } if message == "init exploded"
    ));
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn go_returns_process_status() {
    let mut ok = Lifecycle::default();
    ok.on_run(TaskFn::arc("ok", |_a: Arc<Container>, _s: Signal| async {
        Ok::<(), TaskError>(())
    }));
    assert_eq!(ok.go(Container::shared()).await, 0);

    let mut failing = Lifecycle::default();
    failing.on_run(TaskFn::arc("ko", |_a: Arc<Container>, _s: Signal| async {
        Err::<(), TaskError>(TaskError::fail("no"))
    }));
    assert_eq!(failing.go(Container::shared()).await, 1);

    // A container can only be driven once.
    let app = Container::shared();
    assert_eq!(Lifecycle::default().go(Arc::clone(&app)).await, 0);
    assert_eq!(Lifecycle::default().go(app).await, 1);
}
