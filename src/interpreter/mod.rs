//! Embedded Python interpreter
//!
//! Design:
//! - One runtime per process, initialised on first start and never
//!   finalised (an embedded CPython cannot be re-initialised)
//! - Every crossing into the script is scoped: GIL taken, call scope
//!   installed, both released on every exit path
//! - Script errors are fetched (which clears them), logged with their
//!   traceback and turned into `BridgeError::Script`
//! - Teardown, or a failed start, removes every module imported since the
//!   start began and the search paths it added; the next session imports
//!   the script and its helpers afresh

pub mod bridge;
pub mod coerce;
pub mod scope;

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList, PyTuple};

use crate::config::BridgeConfig;
use crate::errors::{BridgeError, Result};
use crate::host::{LogLevel, PvrHost};
use crate::schema::AddonProps;
use scope::{CallScope, TransferTarget};

pub use bridge::PVRListDone;

/// Entries into and exits out of the script
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrossingStats {
    pub entered: u64,
    pub exited: u64,
}

impl CrossingStats {
    pub fn balanced(&self) -> bool {
        self.entered == self.exited
    }
}

#[derive(Debug, Default)]
struct Crossings {
    entered: AtomicU64,
    exited: AtomicU64,
}

impl Crossings {
    fn enter(&self) -> CrossingGuard<'_> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        CrossingGuard(self)
    }

    fn snapshot(&self) -> CrossingStats {
        CrossingStats {
            entered: self.entered.load(Ordering::SeqCst),
            exited: self.exited.load(Ordering::SeqCst),
        }
    }
}

struct CrossingGuard<'a>(&'a Crossings);

impl Drop for CrossingGuard<'_> {
    fn drop(&mut self) {
        self.0.exited.fetch_add(1, Ordering::SeqCst);
    }
}

/// Import state the script added on top of the runtime
///
/// Captured before the script is imported; undone on teardown so the next
/// session starts from the same modules and search path.
struct Footprint {
    modules: HashSet<String>,
    paths: Vec<String>,
}

impl Footprint {
    fn capture(py: Python<'_>) -> PyResult<Self> {
        Ok(Self {
            modules: module_names(py)?.into_iter().collect(),
            paths: Vec::new(),
        })
    }

    fn add_path(&mut self, py: Python<'_>, path: &str) -> PyResult<()> {
        let sys_path = sys_path(py)?;
        if !sys_path.contains(path)? {
            sys_path.append(path)?;
            self.paths.push(path.to_string());
        }
        Ok(())
    }

    /// Forget every module imported since the capture and drop the added
    /// search paths; returns the number of modules removed
    fn undo(&self, py: Python<'_>) -> PyResult<usize> {
        let modules = sys_modules(py)?;
        let mut removed = 0;
        for name in module_names(py)? {
            if !self.modules.contains(&name) {
                modules.del_item(name.as_str())?;
                removed += 1;
            }
        }

        let sys_path = sys_path(py)?;
        for path in &self.paths {
            let position = sys_path.index(path.as_str());
            if let Ok(position) = position {
                sys_path.del_item(position)?;
            }
        }
        Ok(removed)
    }
}

fn sys_modules(py: Python<'_>) -> PyResult<&PyDict> {
    Ok(py.import("sys")?.getattr("modules")?.downcast::<PyDict>()?)
}

fn sys_path(py: Python<'_>) -> PyResult<&PyList> {
    Ok(py.import("sys")?.getattr("path")?.downcast::<PyList>()?)
}

fn module_names(py: Python<'_>) -> PyResult<Vec<String>> {
    Ok(sys_modules(py)?
        .keys()
        .iter()
        .filter_map(|key| key.extract::<String>().ok())
        .collect())
}

/// The script instance and the import state it brought in
///
/// One interpreter per process at a time: teardown removes every module
/// imported after `start` began, whoever imported it.
pub struct Interpreter {
    instance: Py<PyAny>,
    module: String,
    footprint: Footprint,
    crossings: Crossings,
}

impl Interpreter {
    /// Bring the runtime up, import the script module and build the instance
    ///
    /// On failure everything imported so far is removed again, so a corrected
    /// script is re-imported by the next attempt.
    pub fn start(host: &Arc<dyn PvrHost>, props: &AddonProps, config: &BridgeConfig) -> Result<Self> {
        pyo3::prepare_freethreaded_python();

        let crossings = Crossings::default();
        let module_name = config.script.module.clone();
        let (instance, footprint) = {
            let _crossing = crossings.enter();
            let _scope = scope::enter(CallScope::new(host.clone(), None));
            Python::with_gil(|py| -> Result<(Py<PyAny>, Footprint)> {
                bridge::install(py)?;
                let mut footprint = Footprint::capture(py)?;

                match load(py, host, props, config, &mut footprint) {
                    Ok(instance) => Ok((instance, footprint)),
                    Err(err) => {
                        if let Err(undo_err) = footprint.undo(py) {
                            tracing::warn!(module = %module_name, "import state not restored: {}", undo_err);
                        }
                        Err(err)
                    }
                }
            })?
        };

        tracing::info!(module = %module_name, "script instance created");
        Ok(Self {
            instance,
            module: module_name,
            footprint,
            crossings,
        })
    }

    /// Run `f` against the script instance inside one scoped crossing
    ///
    /// `target` names the host list a request is filling; `None` for calls
    /// that must not transfer records.
    pub fn invoke<T, F>(
        &self,
        host: &Arc<dyn PvrHost>,
        target: Option<TransferTarget>,
        method: &str,
        f: F,
    ) -> Result<T>
    where
        F: for<'py> FnOnce(Python<'py>, &'py PyAny, &CallScope) -> Result<T>,
    {
        let span = tracing::debug_span!("script_call", method);
        let _entered = span.enter();

        let _crossing = self.crossings.enter();
        let guard = scope::enter(CallScope::new(host.clone(), target));

        Python::with_gil(|py| {
            let instance = self.instance.as_ref(py);
            match f(py, instance, guard.scope()) {
                Ok(value) => {
                    tracing::trace!(transferred = guard.scope().transferred(), "script call done");
                    Ok(value)
                }
                Err(BridgeError::Python(err)) => {
                    Err(BridgeError::Script(report(py, host.as_ref(), method, &err)))
                }
                Err(err @ BridgeError::MissingMethod(_)) => {
                    tracing::debug!("{}", err);
                    Err(err)
                }
                Err(err) => {
                    tracing::error!("{}: {}", method, err);
                    host.log(LogLevel::Error, &format!("{}: {}", method, err));
                    Err(err)
                }
            }
        })
    }

    pub fn stats(&self) -> CrossingStats {
        self.crossings.snapshot()
    }

    /// Give the script a chance to clean up, then release it
    ///
    /// Consumes the interpreter so teardown happens exactly once. Returns the
    /// final crossing counts alongside the script's own result.
    pub fn shutdown(self, host: &Arc<dyn PvrHost>) -> (Result<()>, CrossingStats) {
        let result = self.invoke(host, None, "ADDON_Destroy", |_py, instance, _scope| {
            if instance.hasattr("ADDON_Destroy")? {
                instance.call_method0("ADDON_Destroy")?;
            }
            Ok(())
        });

        (result, self.release())
    }

    /// Drop the instance and undo the script's imports without calling into it
    pub fn release(self) -> CrossingStats {
        let Self {
            instance,
            module,
            footprint,
            crossings,
        } = self;
        {
            let _crossing = crossings.enter();
            Python::with_gil(|py| {
                drop(instance);
                match footprint.undo(py) {
                    Ok(removed) => tracing::debug!(module = %module, removed, "script modules removed"),
                    Err(err) => tracing::warn!(module = %module, "import state not restored: {}", err),
                }
            });
        }

        tracing::info!(module = %module, "script instance released");
        crossings.snapshot()
    }
}

/// Extend the search path, import the script module and call its factory
fn load(
    py: Python<'_>,
    host: &Arc<dyn PvrHost>,
    props: &AddonProps,
    config: &BridgeConfig,
    footprint: &mut Footprint,
) -> Result<Py<PyAny>> {
    for path in config.search_paths(Path::new(&props.client_path)) {
        let entry = path.to_string_lossy();
        footprint.add_path(py, entry.as_ref())?;
        host.log(LogLevel::Info, &format!("Added '{}' to sys.path", entry));
    }

    let module_name = config.script.module.as_str();
    let module = py.import(module_name).map_err(|err| {
        let message = report(py, host.as_ref(), "import", &err);
        BridgeError::ModuleImport {
            module: module_name.to_string(),
            message,
        }
    })?;

    host.log(LogLevel::Info, "Handing over to Python");
    let factory = config.script.factory.as_str();
    let instance = module
        .getattr(factory)
        .and_then(|f| f.call0())
        .map_err(|err| {
            let message = report(py, host.as_ref(), factory, &err);
            BridgeError::Factory {
                module: module_name.to_string(),
                factory: factory.to_string(),
                message,
            }
        })?;
    Ok(instance.into_py(py))
}

/// Call `name` on the script instance; `MissingMethod` when it has none
pub fn call_method<'py, A>(instance: &'py PyAny, name: &str, args: A) -> Result<&'py PyAny>
where
    A: IntoPy<Py<PyTuple>>,
{
    if !instance.hasattr(name)? {
        return Err(BridgeError::MissingMethod(name.to_string()));
    }
    Ok(instance.call_method1(name, args)?)
}

/// Exception text plus formatted traceback
pub fn describe(py: Python<'_>, err: &PyErr) -> String {
    let mut text = err.to_string();
    if let Some(traceback) = err.traceback(py) {
        if let Ok(formatted) = traceback.format() {
            text.push('\n');
            text.push_str(formatted.trim_end());
        }
    }
    text
}

fn report(py: Python<'_>, host: &dyn PvrHost, context: &str, err: &PyErr) -> String {
    let text = describe(py, err);
    tracing::error!(context, "script error: {}", text);
    host.log(LogLevel::Error, &format!("{}: {}", context, text));
    text
}
