use std::collections::HashMap;
use std::io::Write;

use bootvisor::template::{self, TemplateError};

const CONFIG: &str = r#"
type    = "master"
dsn     = "{{ env "PG_USER" }}:{{ env "PG_PASSWORD" }}"
"#;

const RENDERED: &str = r#"
type    = "master"
dsn     = "foo:bar"
"#;

fn pg_vars() -> HashMap<&'static str, String> {
    HashMap::from([("PG_USER", "foo".to_string()), ("PG_PASSWORD", "bar".to_string())])
}

#[test]
fn config_string_expands_env_actions() {
    let vars = pg_vars();
    let out = template::render(CONFIG, |name| vars.get(name).cloned()).unwrap();
    assert_eq!(out, RENDERED);
}

#[test]
fn unset_variable_renders_empty() {
    let out = template::render(r#"dsn = "{{ env "PG_USER" }}@db""#, |_| None).unwrap();
    assert_eq!(out, r#"dsn = "@db""#);
}

#[test]
fn text_without_actions_is_unchanged() {
    let text = "plain = true\n# { not an action }\n";
    assert_eq!(template::render(text, |_| None).unwrap(), text);
}

#[test]
fn malformed_actions_are_rejected() {
    let err = template::render("a = {{ env \"X\"", |_| None).unwrap_err();
    assert!(matches!(err, TemplateError::Unclosed { offset: 4 }), "{err:?}");
    assert_eq!(err.as_label(), "template_unclosed");

    let err = template::render("{{ secret \"X\" }}", |_| None).unwrap_err();
    assert!(matches!(&err, TemplateError::UnknownFunction { name, .. } if name == "secret"));

    let err = template::render("{{ env X }}", |_| None).unwrap_err();
    assert!(matches!(err, TemplateError::BadArgument { .. }), "{err:?}");

    let err = template::render("{{ env }}", |_| None).unwrap_err();
    assert!(matches!(err, TemplateError::BadArgument { .. }), "{err:?}");
}

#[test]
fn file_is_rendered_against_the_environment() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "name = \"{{{{ env \"BOOTVISOR_TEST_SURELY_UNSET\" }}}}\"\nport = 5432\n").unwrap();

    let out = template::render_file(file.path()).unwrap();
    assert_eq!(out, "name = \"\"\nport = 5432\n");
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = template::render_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, TemplateError::Io(_)));
    assert_eq!(err.as_label(), "template_io");
}
