//! # Panic capture for worker faults.
//!
//! `catch_unwind` only sees the panic payload; by the time it returns, the
//! stack that panicked is gone. A chained panic hook records the location and
//! a backtrace on the panicking thread, and the worker boundary takes that
//! record right after catching the unwind (same thread, same poll).
//!
//! The hook forwards to the previously installed hook, so the default
//! "thread panicked at" output is preserved.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, PanicHookInfo};
use std::sync::Once;

use crate::error::WorkerError;

static HOOK: Once = Once::new();

thread_local! {
    static LAST_PANIC: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Installs the capturing hook once per process.
pub(crate) fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
            let location = info
                .location()
                .map(|l| format!("at {}:{}:{}", l.file(), l.line(), l.column()))
                .unwrap_or_else(|| "at <unknown>".to_string());
            let trace = format!("{location}\n{}", Backtrace::force_capture());
            // `try_with`: the hook may run while thread locals are torn down.
            let _ = LAST_PANIC.try_with(|slot| *slot.borrow_mut() = Some(trace));
            previous(info);
        }));
    });
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Takes the record of the last panic hooked on this thread, if any.
///
/// Every `catch_unwind` that does not build a fault must call this, or the
/// record would be reported for an unrelated panic later on.
pub(crate) fn take_last() -> Option<String> {
    LAST_PANIC
        .try_with(|slot| slot.borrow_mut().take())
        .ok()
        .flatten()
}

/// Converts a caught panic into a [`WorkerError::Fault`].
///
/// Must be called on the thread that caught the unwind. A panic re-raised
/// with `resume_unwind` skips the hook; its backtrace is then captured here,
/// at the worker boundary.
pub(crate) fn into_fault(payload: Box<dyn Any + Send>) -> WorkerError {
    let backtrace = match take_last() {
        Some(trace) => trace,
        None if HOOK.is_completed() => {
            format!("at worker boundary\n{}", Backtrace::force_capture())
        }
        None => String::new(),
    };
    WorkerError::Fault {
        message: panic_message(payload.as_ref()),
        backtrace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_from_str_and_string_payloads() {
        let a: Box<dyn Any + Send> = Box::new("static boom");
        let b: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        let c: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(a.as_ref()), "static boom");
        assert_eq!(panic_message(b.as_ref()), "owned boom");
        assert_eq!(panic_message(c.as_ref()), "non-string panic payload");
    }

    #[test]
    fn hook_records_panic_site() {
        install_hook();
        let payload = std::panic::catch_unwind(|| panic!("captured")).unwrap_err();
        match into_fault(payload) {
            WorkerError::Fault { message, backtrace } => {
                assert_eq!(message, "captured");
                assert!(backtrace.contains("fault.rs"), "missing location: {backtrace}");
            }
            other => panic!("expected fault, got {other:?}"),
        }
    }

    #[test]
    fn resumed_panic_does_not_inherit_a_stale_record() {
        install_hook();
        let _ = std::panic::catch_unwind(|| panic!("unrelated"));
        assert!(take_last().is_some());
        assert!(take_last().is_none());

        let resumed = std::panic::catch_unwind(|| {
            std::panic::resume_unwind(Box::new("forwarded"));
        })
        .unwrap_err();
        match into_fault(resumed) {
            WorkerError::Fault { message, backtrace } => {
                assert_eq!(message, "forwarded");
                assert!(backtrace.starts_with("at worker boundary"), "{backtrace}");
            }
            other => panic!("expected fault, got {other:?}"),
        }
    }
}
