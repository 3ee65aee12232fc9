//! Runtime call tracing: the behavioral detection layer.
//!
//! One call observer can be active per thread. The engine installs a
//! [`BehavioralFlags`] observer for the duration of a scanned execution
//! through [`install`], whose returned guard restores the previous observer
//! on every exit path. Detection is purely lexical: the lowercased name of
//! each function entered is matched against keyword lists. A function named
//! `get_data` will raise the network flag without touching the network, and
//! a network call behind an innocently named wrapper is missed. This is an
//! advisory heuristic, not a capability check.

use std::cell::{Cell, RefCell};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use crate::sandbox::scanner::{ScanFinding, ScanLayer};

/// Observer notified on every function entry during a traced execution.
pub trait CallObserver {
    fn on_call(&self, name: &str);
}

thread_local! {
    static OBSERVER: RefCell<Option<Rc<dyn CallObserver>>> = const { RefCell::new(None) };
}

/// Scoped ownership of the per-thread observer slot.
///
/// Dropping the guard restores whatever observer was active before, so the
/// slot never leaks past the call that installed it, fault paths included.
pub struct ObserverGuard {
    prev: Option<Rc<dyn CallObserver>>,
}

/// Install an observer, displacing (and remembering) the current one.
pub fn install(observer: Rc<dyn CallObserver>) -> ObserverGuard {
    let prev = OBSERVER.with(|slot| slot.borrow_mut().replace(observer));
    ObserverGuard { prev }
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        let prev = self.prev.take();
        OBSERVER.with(|slot| {
            *slot.borrow_mut() = prev;
        });
    }
}

/// The observer currently occupying this thread's slot, if any.
pub fn current_observer() -> Option<Rc<dyn CallObserver>> {
    OBSERVER.with(|slot| slot.borrow().clone())
}

/// Notify the active observer of a function entry.
///
/// An observer must never disturb the traced program: a panicking callback
/// is caught and logged, and tracing simply continues.
pub fn notify_call(name: &str) {
    let observer = OBSERVER.with(|slot| slot.borrow().clone());
    if let Some(observer) = observer {
        let name = name.to_string();
        if catch_unwind(AssertUnwindSafe(|| observer.on_call(&name))).is_err() {
            tracing::warn!(callee = %name, "call observer panicked; tracing continues");
        }
    }
}

const FILE_KEYWORDS: &[&str] = &["open", "read", "write", "file", "path"];
const NETWORK_KEYWORDS: &[&str] = &["socket", "connect", "request", "urlopen", "get", "post"];
const INTROSPECTION_KEYWORDS: &[&str] = &["globals", "locals", "dir", "getattr", "setattr", "vars"];

/// Per-execution behavioral state. Built fresh for every traced run,
/// mutated only by the observer callback, read once afterwards.
#[derive(Debug, Default)]
pub struct BehavioralFlags {
    pub file_access: Cell<bool>,
    pub network_access: Cell<bool>,
    pub introspection: Cell<bool>,
}

impl BehavioralFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// One finding per raised flag.
    pub fn findings(&self) -> Vec<ScanFinding> {
        let mut findings = Vec::new();
        if self.file_access.get() {
            findings.push(ScanFinding::new(
                ScanLayer::Behavioral,
                "file access activity detected during execution",
            ));
        }
        if self.network_access.get() {
            findings.push(ScanFinding::new(
                ScanLayer::Behavioral,
                "network activity detected during execution",
            ));
        }
        if self.introspection.get() {
            findings.push(ScanFinding::new(
                ScanLayer::Behavioral,
                "runtime introspection detected during execution",
            ));
        }
        findings
    }
}

impl CallObserver for BehavioralFlags {
    fn on_call(&self, name: &str) {
        let lower = name.to_lowercase();
        if FILE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            self.file_access.set(true);
        }
        if NETWORK_KEYWORDS.iter().any(|k| lower.contains(k)) {
            self.network_access.set(true);
        }
        if INTROSPECTION_KEYWORDS.iter().any(|k| lower.contains(k)) {
            self.introspection.set(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder(RefCell<Vec<String>>);

    impl CallObserver for Recorder {
        fn on_call(&self, name: &str) {
            self.0.borrow_mut().push(name.to_string());
        }
    }

    #[test]
    fn guard_restores_previous_observer() {
        let outer: Rc<dyn CallObserver> = Rc::new(Recorder(RefCell::new(Vec::new())));
        let _outer_guard = install(Rc::clone(&outer));
        {
            let inner: Rc<dyn CallObserver> = Rc::new(Recorder(RefCell::new(Vec::new())));
            let _inner_guard = install(inner);
            assert!(current_observer().is_some());
        }
        let restored = current_observer().expect("outer observer restored");
        assert!(Rc::ptr_eq(&restored, &outer));
    }

    #[test]
    fn slot_empties_when_last_guard_drops() {
        {
            let observer: Rc<dyn CallObserver> = Rc::new(BehavioralFlags::new());
            let _guard = install(observer);
        }
        assert!(current_observer().is_none());
    }

    #[test]
    fn notify_without_observer_is_a_noop() {
        notify_call("anything");
    }

    #[test]
    fn panicking_observer_is_contained() {
        struct Exploder;
        impl CallObserver for Exploder {
            fn on_call(&self, _: &str) {
                panic!("observer bug");
            }
        }
        let _guard = install(Rc::new(Exploder));
        // Must not propagate the panic.
        notify_call("open_file");
    }

    #[test]
    fn keyword_categories_set_expected_flags() {
        let flags = BehavioralFlags::new();
        flags.on_call("read_config");
        flags.on_call("http_request");
        flags.on_call("getattr");
        assert!(flags.file_access.get());
        assert!(flags.network_access.get());
        assert!(flags.introspection.get());
    }

    #[test]
    fn get_data_raises_network_flag_by_name_alone() {
        // Lexical matching, so a harmless name still trips the heuristic.
        let flags = BehavioralFlags::new();
        flags.on_call("get_data");
        assert!(flags.network_access.get());
        assert!(!flags.file_access.get());
    }

    #[test]
    fn unrelated_names_raise_nothing() {
        let flags = BehavioralFlags::new();
        flags.on_call("calculate_total");
        flags.on_call("print");
        assert!(flags.findings().is_empty());
    }

    #[test]
    fn one_finding_per_raised_flag() {
        let flags = BehavioralFlags::new();
        flags.on_call("open_file");
        flags.on_call("write_report");
        let findings = flags.findings();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].layer, ScanLayer::Behavioral);
    }
}
