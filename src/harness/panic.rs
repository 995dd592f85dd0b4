#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Scoped interception of panics raised while a check runs.
//!
//! The process-wide panic hook is replaced once. It records the panic into
//! the innermost capture scope open on the current thread and stays silent;
//! with no scope open it defers to the hook that was installed before, so
//! panics elsewhere in the process look exactly as they would without us.

use std::{
    any::Any,
    backtrace::{Backtrace, BacktraceStatus},
    cell::RefCell,
    panic::{self, AssertUnwindSafe, PanicHookInfo},
    sync::Once,
};

use super::context::InputNotAllowed;

/// A panic observed inside a capture scope.
#[derive(Debug, Clone)]
pub struct PanicReport {
    /// The panic message.
    message:   String,
    /// `file:line:column` of the panic, if known.
    location:  Option<String>,
    /// Rendered backtrace, if one was captured.
    backtrace: Option<String>,
}

impl PanicReport {
    /// Returns the panic message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns where the panic happened.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Returns the rendered backtrace.
    pub fn backtrace(&self) -> Option<&str> {
        self.backtrace.as_deref()
    }

    /// Builds a report from the information the panic hook receives.
    fn from_hook(info: &PanicHookInfo<'_>, capture_backtrace: bool) -> Self {
        let backtrace = capture_backtrace
            .then(Backtrace::force_capture)
            .filter(|bt| bt.status() == BacktraceStatus::Captured)
            .map(|bt| bt.to_string());

        Self {
            message: payload_message(info.payload()),
            location: info
                .location()
                .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column())),
            backtrace,
        }
    }

    /// Builds a report from a bare unwind payload, used when the hook did not
    /// run (e.g. `resume_unwind`).
    fn from_payload(payload: &(dyn Any + Send)) -> Self {
        Self {
            message:   payload_message(payload),
            location:  None,
            backtrace: None,
        }
    }
}

/// Extracts the text of a panic payload.
fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

/// How a captured closure stopped early.
#[derive(Debug)]
pub(crate) enum Unwound {
    /// The closure read input although none was scripted.
    InputNotAllowed,
    /// The closure panicked.
    Panic(PanicReport),
}

/// State of one open capture scope.
struct ScopeState {
    /// Whether to capture a backtrace for panics in this scope.
    backtrace: bool,
    /// The panic recorded by the hook, if any.
    report:    Option<PanicReport>,
}

thread_local! {
    /// Capture scopes open on this thread, innermost last.
    static SCOPES: RefCell<Vec<ScopeState>> = const { RefCell::new(Vec::new()) };
}

/// Guards the one-time hook installation.
static INSTALL: Once = Once::new();

/// Installs the capturing panic hook, once per process.
fn install_hook() {
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let recorded = SCOPES
                .try_with(|scopes| {
                    let Ok(mut scopes) = scopes.try_borrow_mut() else {
                        return false;
                    };
                    match scopes.last_mut() {
                        Some(scope) => {
                            scope.report = Some(PanicReport::from_hook(info, scope.backtrace));
                            true
                        }
                        None => false,
                    }
                })
                .unwrap_or(false);

            if !recorded {
                previous(info);
            }
        }));
    });
}

/// An open capture scope; closes itself when dropped.
struct Scope {
    /// Whether the scope is still on the stack.
    open: bool,
}

impl Scope {
    /// Pushes a new innermost scope on this thread.
    fn open(backtrace: bool) -> Self {
        SCOPES.with(|scopes| {
            scopes.borrow_mut().push(ScopeState {
                backtrace,
                report: None,
            });
        });
        Self { open: true }
    }

    /// Pops the scope, returning the panic it recorded.
    fn close(mut self) -> Option<PanicReport> {
        self.open = false;
        SCOPES.with(|scopes| scopes.borrow_mut().pop().and_then(|state| state.report))
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        if self.open {
            let _ = SCOPES.try_with(|scopes| scopes.borrow_mut().pop());
        }
    }
}

/// Runs `f`, converting a panic into an [`Unwound`] value instead of letting
/// it propagate or print.
///
/// Scopes nest: a panic is attributed to the innermost open scope.
pub(crate) fn catch<R>(backtrace: bool, f: impl FnOnce() -> R) -> Result<R, Unwound> {
    install_hook();

    let scope = Scope::open(backtrace);
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    let recorded = scope.close();

    result.map_err(|payload| {
        if (*payload).is::<InputNotAllowed>() {
            Unwound::InputNotAllowed
        } else {
            Unwound::Panic(recorded.unwrap_or_else(|| PanicReport::from_payload(&*payload)))
        }
    })
}
