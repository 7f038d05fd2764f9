//! The `bridge` module scripts import
//!
//! Exposes the host log, one transfer function per streamed record kind,
//! the `PVRListDone` exception and the host's status enums as constant
//! namespaces. Registered straight into `sys.modules` so it can be installed
//! after the runtime is up and re-used by every later session.

use pyo3::create_exception;
use pyo3::exceptions::{PyException, PyRuntimeError, PyTypeError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyModule};

use super::coerce::extract_record;
use super::scope::{self, TransferError};
use crate::abi::types::{AddonStatus, PvrError, PVR_RECORDING_CHANNEL_TYPES, PVR_TIMER_STATES};
use crate::errors::BridgeError;
use crate::host::{Entry, LogLevel};
use crate::schema::{Channel, ChannelGroup, ChannelGroupMember, EpgTag, Record, Recording, Timer};

pub const MODULE_NAME: &str = "bridge";

create_exception!(
    bridge,
    PVRListDone,
    PyException,
    "Ends a generator-driven list early; args[0] is the PVR_ERROR code"
);

#[pyfunction]
#[pyo3(name = "XBMC_Log")]
fn xbmc_log(message: &str) {
    tracing::debug!(target: "pvr_python::script", "{}", message);
    if let Some(scope) = scope::current() {
        scope.host().log(LogLevel::Debug, message);
    }
}

fn to_pyerr(err: BridgeError) -> PyErr {
    match err {
        BridgeError::Python(err) => err,
        err @ BridgeError::Coercion { .. } => PyTypeError::new_err(err.to_string()),
        err => PyRuntimeError::new_err(err.to_string()),
    }
}

fn transfer<R: Record>(entry: &PyAny, wrap: fn(R) -> Entry) -> PyResult<()> {
    let scope = scope::current()
        .ok_or_else(|| PyRuntimeError::new_err(TransferError::NoRequest.to_string()))?;
    let record = extract_record::<R>(entry).map_err(to_pyerr)?;
    scope
        .transfer(&wrap(record))
        .map_err(|err| PyRuntimeError::new_err(err.to_string()))
}

#[pyfunction]
#[pyo3(name = "PVR_TransferChannelEntry")]
fn transfer_channel_entry(entry: &PyAny) -> PyResult<()> {
    transfer::<Channel>(entry, Entry::Channel)
}

#[pyfunction]
#[pyo3(name = "PVR_TransferChannelGroup")]
fn transfer_channel_group(entry: &PyAny) -> PyResult<()> {
    transfer::<ChannelGroup>(entry, Entry::ChannelGroup)
}

#[pyfunction]
#[pyo3(name = "PVR_TransferChannelGroupMember")]
fn transfer_channel_group_member(entry: &PyAny) -> PyResult<()> {
    transfer::<ChannelGroupMember>(entry, Entry::ChannelGroupMember)
}

#[pyfunction]
#[pyo3(name = "PVR_TransferTimerEntry")]
fn transfer_timer_entry(entry: &PyAny) -> PyResult<()> {
    transfer::<Timer>(entry, Entry::Timer)
}

#[pyfunction]
#[pyo3(name = "PVR_TransferRecordingEntry")]
fn transfer_recording_entry(entry: &PyAny) -> PyResult<()> {
    transfer::<Recording>(entry, Entry::Recording)
}

#[pyfunction]
#[pyo3(name = "PVR_TransferEpgEntry")]
fn transfer_epg_entry(entry: &PyAny) -> PyResult<()> {
    transfer::<EpgTag>(entry, Entry::Epg)
}

fn namespace<'py, I>(py: Python<'py>, values: I) -> PyResult<&'py PyAny>
where
    I: IntoIterator<Item = (&'static str, i64)>,
{
    let kwargs = PyDict::new(py);
    for (name, value) in values {
        kwargs.set_item(name, value)?;
    }
    py.import("types")?
        .getattr("SimpleNamespace")?
        .call((), Some(kwargs))
}

fn build(py: Python<'_>) -> PyResult<&PyModule> {
    let module = PyModule::new(py, MODULE_NAME)?;

    module.add_function(wrap_pyfunction!(xbmc_log, module)?)?;
    module.add_function(wrap_pyfunction!(transfer_channel_entry, module)?)?;
    module.add_function(wrap_pyfunction!(transfer_channel_group, module)?)?;
    module.add_function(wrap_pyfunction!(transfer_channel_group_member, module)?)?;
    module.add_function(wrap_pyfunction!(transfer_timer_entry, module)?)?;
    module.add_function(wrap_pyfunction!(transfer_recording_entry, module)?)?;
    module.add_function(wrap_pyfunction!(transfer_epg_entry, module)?)?;

    module.add("PVRListDone", py.get_type::<PVRListDone>())?;

    module.add(
        "PVR_ERROR",
        namespace(py, PvrError::ALL.iter().map(|e| (e.name(), *e as i64)))?,
    )?;
    module.add(
        "ADDON_STATUS",
        namespace(py, AddonStatus::ALL.iter().map(|s| (s.name(), *s as i64)))?,
    )?;
    module.add("PVR_TIMER_STATE", namespace(py, PVR_TIMER_STATES)?)?;
    module.add(
        "PVR_RECORDING_CHANNEL_TYPE",
        namespace(py, PVR_RECORDING_CHANNEL_TYPES)?,
    )?;

    Ok(module)
}

/// Make `import bridge` resolve; repeated calls return the installed module
pub fn install(py: Python<'_>) -> PyResult<&PyModule> {
    let modules: &PyDict = py.import("sys")?.getattr("modules")?.downcast()?;
    if let Some(existing) = modules.get_item(MODULE_NAME)? {
        if let Ok(module) = existing.downcast::<PyModule>() {
            if module.hasattr("PVR_TransferChannelEntry")? {
                return Ok(module);
            }
        }
    }

    let module = build(py)?;
    modules.set_item(MODULE_NAME, module)?;
    tracing::debug!("registered '{}' module", MODULE_NAME);
    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{PvrHost, TransferHandle};
    use crate::interpreter::scope::{enter, CallScope, TransferTarget};
    use crate::schema::RecordKind;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder {
        logs: Mutex<Vec<String>>,
        entries: Mutex<Vec<Entry>>,
    }

    impl PvrHost for Recorder {
        fn log(&self, _level: LogLevel, message: &str) {
            self.logs.lock().unwrap().push(message.to_string());
        }

        fn transfer(&self, _handle: TransferHandle, entry: &Entry) {
            self.entries.lock().unwrap().push(entry.clone());
        }
    }

    fn run(py: Python<'_>, code: &str) -> PyResult<()> {
        install(py)?;
        py.run(code, None, None)
    }

    #[test]
    fn test_install_is_idempotent() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let first = install(py).unwrap();
            let second = install(py).unwrap();
            assert!(first.is(second));
        });
    }

    #[test]
    fn test_constants_match_host_values() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            run(
                py,
                "import bridge\n\
                 assert bridge.PVR_ERROR.NO_ERROR == 0\n\
                 assert bridge.PVR_ERROR.FAILED == -9\n\
                 assert bridge.ADDON_STATUS.PERMANENT_FAILURE == 6\n\
                 assert bridge.PVR_TIMER_STATE.SCHEDULED == 1\n\
                 assert bridge.PVR_RECORDING_CHANNEL_TYPE.RADIO == 2\n\
                 assert issubclass(bridge.PVRListDone, Exception)\n",
            )
            .unwrap();
        });
    }

    #[test]
    fn test_transfer_reaches_host_inside_request() {
        pyo3::prepare_freethreaded_python();
        let recorder = Arc::new(Recorder::default());
        let target = TransferTarget {
            handle: TransferHandle::new(std::ptr::null_mut()),
            kind: RecordKind::ChannelGroup,
        };
        let _guard = enter(CallScope::new(recorder.clone(), Some(target)));

        Python::with_gil(|py| {
            run(
                py,
                "import bridge\n\
                 bridge.XBMC_Log('listing groups')\n\
                 bridge.PVR_TransferChannelGroup({'groupName': 'Kids', 'position': 2})\n",
            )
            .unwrap();
        });

        assert_eq!(*recorder.logs.lock().unwrap(), vec!["listing groups".to_string()]);
        assert_eq!(
            *recorder.entries.lock().unwrap(),
            vec![Entry::ChannelGroup(ChannelGroup {
                group_name: "Kids".into(),
                is_radio: false,
                position: 2,
            })]
        );
    }

    #[test]
    fn test_transfer_outside_request_raises() {
        pyo3::prepare_freethreaded_python();
        let recorder = Arc::new(Recorder::default());
        let _guard = enter(CallScope::new(recorder.clone(), None));

        Python::with_gil(|py| {
            let err = run(py, "import bridge\nbridge.PVR_TransferTimerEntry({'title': 'x'})\n")
                .unwrap_err();
            assert!(err.is_instance_of::<PyRuntimeError>(py));

            let err = run(py, "import bridge\nbridge.PVR_TransferTimerEntry({'title': 5})\n")
                .unwrap_err();
            assert!(err.is_instance_of::<PyTypeError>(py));
        });
        assert!(recorder.entries.lock().unwrap().is_empty());
    }
}
