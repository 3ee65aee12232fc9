//! Defensive script-module loading.
//!
//! Loads script files as named modules: the file is parsed (through the
//! shared parse cache), executed with the full builtin table, and its
//! resulting namespace stored under the file stem. A load that fails
//! (missing file, syntax error, runtime fault) lands in the failed map and
//! the ledger instead of propagating.

use std::collections::BTreeMap;
use std::path::Path;

use crate::interp::{Bindings, BuiltinTable, Machine};
use crate::ledger::{ExecutionRecord, OperationKind};
use crate::sandbox::cache::global_cache;
use crate::sandbox::executor::Sandbox;
use crate::sandbox::io::CapturedOutput;

/// A successfully loaded script module.
#[derive(Debug)]
pub struct ScriptModule {
    pub name: String,
    /// Top-level bindings the module produced.
    pub namespace: Bindings,
    /// Output the module printed while loading.
    pub stdout: String,
}

/// Tracks loaded and failed modules for one sandbox.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    loaded: BTreeMap<String, ScriptModule>,
    failed: BTreeMap<String, String>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loaded(&self) -> &BTreeMap<String, ScriptModule> {
        &self.loaded
    }

    pub fn failed(&self) -> &BTreeMap<String, String> {
        &self.failed
    }
}

fn module_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl Sandbox {
    /// Load a single script module. Returns the module on success, `None`
    /// on any failure; the failure reason is kept in [`Sandbox::failed_modules`].
    pub fn load_module(&mut self, path: impl AsRef<Path>) -> Option<&ScriptModule> {
        let path = path.as_ref();
        let name = module_name(path);

        let program = match global_cache().get_or_parse(path) {
            Ok(program) => program,
            Err(e) => {
                let reason = e.to_string();
                self.log
                    .error(&format!("failed to load module {}: {}", name, reason));
                self.ledger.record(ExecutionRecord::failure(
                    OperationKind::ModuleLoad,
                    name.as_str(),
                    reason.clone(),
                ));
                self.modules.failed.insert(name, reason);
                return None;
            }
        };

        let table = BuiltinTable::full();
        let mut namespace = Bindings::new();
        let mut out = CapturedOutput::new();
        let limits = crate::interp::Limits {
            max_steps: self.config.max_steps,
            max_depth: self.config.max_call_depth,
        };
        let result = {
            let mut machine = Machine::new(&table, &mut out, None, limits);
            machine.run(&program, &mut namespace)
        };

        match result {
            Ok(()) => {
                self.log
                    .success(&format!("successfully loaded module: {}", name));
                self.ledger
                    .record(ExecutionRecord::success(OperationKind::ModuleLoad, name.as_str()));
                self.modules.failed.remove(&name);
                let module = ScriptModule {
                    name: name.clone(),
                    namespace,
                    stdout: out.into_string(),
                };
                self.modules.loaded.insert(name.clone(), module);
                self.modules.loaded.get(&name)
            }
            Err(fault) => {
                let reason = fault.to_string();
                self.log
                    .error(&format!("error while loading module {}: {}", name, reason));
                self.ledger.record(ExecutionRecord::failure(
                    OperationKind::ModuleLoad,
                    name.as_str(),
                    reason.clone(),
                ));
                self.modules.failed.insert(name, reason);
                None
            }
        }
    }

    /// Load several modules, continuing past failures. Returns how many
    /// loaded successfully.
    pub fn load_modules<P: AsRef<Path>>(&mut self, paths: &[P]) -> usize {
        self.log
            .info(&format!("loading {} modules...", paths.len()));
        let mut loaded = 0;
        for path in paths {
            if self.load_module(path).is_some() {
                loaded += 1;
            }
        }
        self.log.info(&format!(
            "loaded {}/{} modules successfully",
            loaded,
            paths.len()
        ));
        loaded
    }

    /// Modules loaded so far, by name.
    pub fn loaded_modules(&self) -> &BTreeMap<String, ScriptModule> {
        self.modules.loaded()
    }

    /// Failed module names with their failure reasons.
    pub fn failed_modules(&self) -> &BTreeMap<String, String> {
        self.modules.failed()
    }
}

/// Load modules under a throwaway quiet sandbox and hand back the loaded
/// set. Failures are silently dropped; use [`Sandbox::load_modules`] when
/// the ledger and failure reasons matter.
pub fn quick_load<P: AsRef<Path>>(paths: &[P]) -> BTreeMap<String, ScriptModule> {
    let mut sandbox = Sandbox::new(crate::sandbox::config::SandboxConfig::silent());
    sandbox.load_modules(paths);
    sandbox.modules.loaded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::Value;
    use crate::sandbox::config::SandboxConfig;

    fn quiet_sandbox() -> Sandbox {
        Sandbox::new(SandboxConfig::silent())
    }

    #[test]
    fn load_module_exposes_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mathlib.pys");
        std::fs::write(&path, "def double(x):\n    return x * 2\nbase = 21").unwrap();

        let mut sandbox = quiet_sandbox();
        let module = sandbox.load_module(&path).expect("module loads");
        assert_eq!(module.name, "mathlib");
        assert_eq!(module.namespace.get("base"), Some(&Value::Int(21)));
        assert!(module.namespace.contains_key("double"));
    }

    #[test]
    fn missing_module_lands_in_failed_map() {
        let mut sandbox = quiet_sandbox();
        assert!(sandbox.load_module("/no/such/module.pys").is_none());
        assert_eq!(sandbox.failed_modules().len(), 1);
        assert!(sandbox.failed_modules()["module"].contains("not found"));
        // Exactly one module-load record.
        assert_eq!(sandbox.ledger().len(), 1);
    }

    #[test]
    fn load_modules_continues_past_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.pys");
        std::fs::write(&good, "x = 1").unwrap();
        let bad = dir.path().join("bad.pys");
        std::fs::write(&bad, "x = undefined_name").unwrap();

        let mut sandbox = quiet_sandbox();
        let loaded = sandbox.load_modules(&[good, bad]);
        assert_eq!(loaded, 1);
        assert_eq!(sandbox.loaded_modules().len(), 1);
        assert_eq!(sandbox.failed_modules().len(), 1);
        assert_eq!(sandbox.ledger().len(), 2);
    }
}
