use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use bootvisor::{Container, ContainerError, Phase};

#[test]
fn resolving_unregistered_key_fails() {
    let app = Container::new();
    let err = app.resolve("db").unwrap_err();
    assert_eq!(err, ContainerError::UnknownService { key: "db".into() });
    assert_eq!(err.as_label(), "container_unknown_service");
}

#[test]
fn factory_runs_once_and_instance_is_shared() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = Container::new();

    let c = Arc::clone(&calls);
    app.register("greeting", move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(String::from("Salut"))
    })
    .unwrap();

    assert!(!app.is_built("greeting"));
    let first = app.resolve("greeting").unwrap();
    let second = app.resolve("greeting").unwrap();

    assert!(first.ptr_eq(&second));
    assert_eq!(app.get_string("greeting").unwrap(), "Salut");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(app.is_built("greeting"));
}

#[test]
fn registering_over_built_instance_fails() {
    let app = Container::new();
    app.register("port", |_| Ok(8080u16)).unwrap();
    app.resolve("port").unwrap();

    let err = app.register("port", |_| Ok(9090u16)).unwrap_err();
    assert_eq!(err, ContainerError::DuplicateService { key: "port".into() });
    assert_eq!(*app.resolve_as::<u16>("port").unwrap(), 8080);
}

#[test]
fn registering_key_while_it_builds_fails() {
    let app = Container::new();
    app.register("self", |app| {
        app.register("self", |_| Ok(1u8))?;
        Ok(0u8)
    })
    .unwrap();

    assert_eq!(
        app.resolve("self").unwrap_err(),
        ContainerError::DuplicateService { key: "self".into() }
    );
    assert!(!app.is_built("self"));
}

#[test]
fn typed_lookup_reports_both_types() {
    let app = Container::new();
    app.register("port", |_| Ok(8080u16)).unwrap();

    match app.get_string("port") {
        Err(ContainerError::TypeMismatch { key, expected, found }) => {
            assert_eq!(key, "port");
            assert_eq!(expected, "alloc::string::String");
            assert_eq!(found, "u16");
        }
        other => panic!("expected a type mismatch, got {other:?}"),
    }
}

#[test]
fn factories_can_depend_on_other_services() {
    let app = Container::new();
    app.register("host", |_| Ok(String::from("localhost"))).unwrap();
    app.register("port", |_| Ok(5432u16)).unwrap();
    app.register("dsn", |app| {
        let host = app.get_string("host")?;
        let port = app.resolve_as::<u16>("port")?;
        Ok(format!("{host}:{port}"))
    })
    .unwrap();

    assert_eq!(app.get_string("dsn").unwrap(), "localhost:5432");
    assert!(app.is_built("host"));
    assert!(app.is_built("port"));
}

#[test]
fn self_dependency_is_detected() {
    let app = Container::new();
    app.register("loop", |app| app.resolve_as::<u8>("loop").map(|v| *v))
        .unwrap();

    let err = app.resolve("loop").unwrap_err();
    assert_eq!(
        err,
        ContainerError::CircularDependency {
            key: "loop".into(),
            chain: vec!["loop".into(), "loop".into()],
        }
    );
    assert!(err.to_string().contains("loop -> loop"));
    assert!(!app.is_built("loop"));
}

#[test]
fn concurrent_first_resolution_builds_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = Container::shared();

    let c = Arc::clone(&calls);
    app.register("pool", move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        Ok(vec![0u8; 16])
    })
    .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let app = Arc::clone(&app);
            thread::spawn(move || app.resolve("pool").unwrap())
        })
        .collect();
    let services: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(services.windows(2).all(|w| w[0].ptr_eq(&w[1])));
}

#[test]
fn keys_are_sorted_and_fresh_container_is_in_init() {
    let app = Container::new();
    app.register("b", |_| Ok(())).unwrap();
    app.register("a", |_| Ok(())).unwrap();

    let keys: Vec<_> = app.keys().into_iter().collect();
    assert_eq!(keys, vec!["a", "b"]);
    assert!(app.contains("a"));
    assert!(!app.contains("c"));
    assert_eq!(app.phase(), Phase::Init);
    assert!(!app.is_terminated());
}
