//! PVR operations forwarded to the script
//!
//! Each operation is one scoped crossing into the script instance. Results
//! come back as host-level values; a failed call never escapes as anything
//! but the fixed failure answer for that operation.

use std::sync::Arc;

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyLong, PyString, PyTuple};

use crate::abi::types::{AddonStatus, PvrError};
use crate::config::BridgeConfig;
use crate::errors::{BridgeError, Result};
use crate::host::{Entry, LogLevel, PvrHost, TransferHandle};
use crate::interpreter::coerce::{extract_record, record_to_dict, type_name};
use crate::interpreter::scope::{CallScope, TransferTarget};
use crate::interpreter::{call_method, CrossingStats, Interpreter, PVRListDone};
use crate::schema::{
    AddonProps, Capabilities, Channel, ChannelGroup, ChannelGroupMember, DriveSpace, EpgTag,
    RecordKind, Recording, Timer,
};

/// Backend description strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendString {
    Name,
    ConnectionString,
    Version,
    Hostname,
}

impl BackendString {
    pub const fn method(self) -> &'static str {
        match self {
            Self::Name => "GetBackendName",
            Self::ConnectionString => "GetConnectionString",
            Self::Version => "GetBackendVersion",
            Self::Hostname => "GetBackendHostname",
        }
    }
}

/// Counted collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Amount {
    Channels,
    Timers,
    Recordings { deleted: bool },
}

impl Amount {
    pub const fn method(self) -> &'static str {
        match self {
            Self::Channels => "GetChannelsAmount",
            Self::Timers => "GetTimersAmount",
            Self::Recordings { .. } => "GetRecordingsAmount",
        }
    }

    fn args(self, py: Python<'_>) -> &PyTuple {
        let args: Py<PyTuple> = match self {
            Self::Recordings { deleted } => (deleted,).into_py(py),
            Self::Channels | Self::Timers => ().into_py(py),
        };
        args.into_ref(py)
    }
}

/// Host list requests; each streams one record kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListRequest {
    Channels { radio: bool },
    ChannelGroups { radio: bool },
    ChannelGroupMembers { group_name: String },
    Timers,
    Recordings { deleted: bool },
    Epg { channel_uid: i64, start: i64, end: i64 },
}

impl ListRequest {
    pub const fn method(&self) -> &'static str {
        match self {
            Self::Channels { .. } => "GetChannels",
            Self::ChannelGroups { .. } => "GetChannelGroups",
            Self::ChannelGroupMembers { .. } => "GetChannelGroupMembers",
            Self::Timers => "GetTimers",
            Self::Recordings { .. } => "GetRecordings",
            Self::Epg { .. } => "GetEPGForChannel",
        }
    }

    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::Channels { .. } => RecordKind::Channel,
            Self::ChannelGroups { .. } => RecordKind::ChannelGroup,
            Self::ChannelGroupMembers { .. } => RecordKind::ChannelGroupMember,
            Self::Timers => RecordKind::Timer,
            Self::Recordings { .. } => RecordKind::Recording,
            Self::Epg { .. } => RecordKind::EpgTag,
        }
    }

    fn args<'py>(&self, py: Python<'py>) -> &'py PyTuple {
        let args: Py<PyTuple> = match self {
            Self::Channels { radio } | Self::ChannelGroups { radio } => (*radio,).into_py(py),
            Self::ChannelGroupMembers { group_name } => (group_name.as_str(),).into_py(py),
            Self::Timers => ().into_py(py),
            Self::Recordings { deleted } => (*deleted,).into_py(py),
            Self::Epg {
                channel_uid,
                start,
                end,
            } => (*channel_uid, *start, *end).into_py(py),
        };
        args.into_ref(py)
    }
}

pub struct PvrClient {
    host: Arc<dyn PvrHost>,
    interpreter: Interpreter,
    status: AddonStatus,
}

impl PvrClient {
    /// Start the interpreter and hand the properties to the script's
    /// `ADDON_Create`
    ///
    /// Any failure here is fatal for the add-on; the caller reports
    /// `PERMANENT_FAILURE`.
    pub fn create(host: Arc<dyn PvrHost>, props: &AddonProps, config: &BridgeConfig) -> Result<Self> {
        host.log(LogLevel::Info, "Creating the Python PVR add-on");
        let interpreter = Interpreter::start(&host, props, config)?;

        let created = interpreter.invoke(&host, None, "ADDON_Create", |py, instance, _scope| {
            if !instance.hasattr("ADDON_Create")? {
                return Ok(AddonStatus::Ok);
            }
            let returned = instance.call_method1("ADDON_Create", (record_to_dict(py, props)?,))?;
            if returned.is_none() {
                return Ok(AddonStatus::Ok);
            }
            let code: i64 = returned.extract().map_err(|_| {
                BridgeError::unexpected_return(
                    "ADDON_Create",
                    format!("expected an ADDON_STATUS code, got {}", type_name(returned)),
                )
            })?;
            Ok(AddonStatus::from_code(code))
        });

        match created {
            Ok(status) => {
                tracing::info!(status = status.name(), "add-on created");
                host.log(LogLevel::Info, &format!("ADDON_Create returned {}", status.name()));
                Ok(Self {
                    host,
                    interpreter,
                    status,
                })
            }
            Err(err) => {
                interpreter.release();
                Err(err)
            }
        }
    }

    pub fn status(&self) -> AddonStatus {
        self.status
    }

    pub fn host(&self) -> &Arc<dyn PvrHost> {
        &self.host
    }

    pub fn stats(&self) -> CrossingStats {
        self.interpreter.stats()
    }

    /// `(status, capabilities)`; capabilities are only present on success
    pub fn capabilities(&self) -> (PvrError, Option<Capabilities>) {
        const METHOD: &str = "GetAddonCapabilities";
        let outcome = self.interpreter.invoke(&self.host, None, METHOD, |_py, instance, _scope| {
            let returned = call_method(instance, METHOD, ())?;
            let (status, payload) = if let Ok((code, payload)) = returned.extract::<(i64, &PyAny)>() {
                (PvrError::from_code(code), payload)
            } else if returned.is_instance_of::<PyDict>() {
                (PvrError::NoError, returned)
            } else {
                return Err(BridgeError::unexpected_return(
                    METHOD,
                    format!("expected (status, capabilities), got {}", type_name(returned)),
                ));
            };
            Ok((status, extract_record::<Capabilities>(payload)?))
        });

        match outcome {
            Ok((status, caps)) => (status, Some(caps)),
            Err(err) => (failure_status(&err), None),
        }
    }

    /// Backend description; empty on any failure
    pub fn backend_string(&self, which: BackendString) -> String {
        let method = which.method();
        self.interpreter
            .invoke(&self.host, None, method, |_py, instance, _scope| {
                let returned = call_method(instance, method, ())?;
                if !returned.is_instance_of::<PyString>() {
                    return Err(BridgeError::unexpected_return(
                        method,
                        format!("expected str, got {}", type_name(returned)),
                    ));
                }
                Ok(returned.extract::<String>()?)
            })
            .unwrap_or_default()
    }

    /// Collection size; `-1` on any failure
    pub fn amount(&self, which: Amount) -> i64 {
        let method = which.method();
        self.interpreter
            .invoke(&self.host, None, method, |py, instance, _scope| {
                let returned = call_method(instance, method, which.args(py))?;
                if !returned.is_instance_of::<PyLong>() {
                    return Err(BridgeError::unexpected_return(
                        method,
                        format!("expected int, got {}", type_name(returned)),
                    ));
                }
                Ok(returned.extract::<i64>()?)
            })
            .unwrap_or(-1)
    }

    /// Fill the host list behind `handle`
    ///
    /// The script either transfers records itself and returns a status (or
    /// `None`), or returns an iterable of records that is streamed here.
    /// Raising `PVRListDone(code)` ends the list with that code.
    pub fn list(&self, handle: TransferHandle, request: &ListRequest) -> PvrError {
        let method = request.method();
        let kind = request.kind();
        let target = TransferTarget { handle, kind };

        let outcome = self.interpreter.invoke(&self.host, Some(target), method, |py, instance, scope| {
            let returned = match call_method(instance, method, request.args(py)) {
                Ok(returned) => returned,
                Err(BridgeError::Python(err)) if is_list_done(py, &err) => {
                    return Ok(list_done_status(py, &err));
                }
                Err(err) => return Err(err),
            };
            stream(py, method, kind, returned, scope)
        });

        match outcome {
            Ok(status) => {
                tracing::debug!(method, status = status.name(), "list finished");
                status
            }
            Err(err) => failure_status(&err),
        }
    }

    /// `(status, drive space)`; script returns `(status, total, used)`
    pub fn drive_space(&self) -> (PvrError, Option<DriveSpace>) {
        const METHOD: &str = "GetDriveSpace";
        let outcome = self.interpreter.invoke(&self.host, None, METHOD, |_py, instance, _scope| {
            let returned = call_method(instance, METHOD, ())?;
            let (code, total, used) = returned.extract::<(i64, i64, i64)>().map_err(|_| {
                BridgeError::unexpected_return(
                    METHOD,
                    format!("expected (status, total, used), got {}", type_name(returned)),
                )
            })?;
            Ok((PvrError::from_code(code), DriveSpace { total, used }))
        });

        match outcome {
            Ok((status, space)) => (status, Some(space)),
            Err(err) => (failure_status(&err), None),
        }
    }

    /// Tear the script down; the client is gone afterwards
    pub fn destroy(self) -> CrossingStats {
        self.host.log(LogLevel::Info, "Destroying the Python PVR add-on");
        let (result, stats) = self.interpreter.shutdown(&self.host);
        if let Err(err) = result {
            tracing::warn!("script ADDON_Destroy failed: {}", err);
        }
        stats
    }
}

fn failure_status(err: &BridgeError) -> PvrError {
    match err {
        BridgeError::MissingMethod(_) => PvrError::NotImplemented,
        _ => PvrError::Failed,
    }
}

fn is_list_done(py: Python<'_>, err: &PyErr) -> bool {
    err.is_instance_of::<PVRListDone>(py)
        || err
            .get_type(py)
            .name()
            .map(|name| name == "PVRListDone")
            .unwrap_or(false)
}

fn list_done_status(py: Python<'_>, err: &PyErr) -> PvrError {
    let code = err
        .value(py)
        .getattr("args")
        .and_then(|args| args.get_item(0))
        .and_then(|code| code.extract::<i64>());
    match code {
        Ok(code) => PvrError::from_code(code),
        Err(_) => PvrError::NoError,
    }
}

fn to_entry(kind: RecordKind, obj: &PyAny) -> Result<Entry> {
    let entry = match kind {
        RecordKind::Channel => Entry::Channel(extract_record::<Channel>(obj)?),
        RecordKind::ChannelGroup => Entry::ChannelGroup(extract_record::<ChannelGroup>(obj)?),
        RecordKind::ChannelGroupMember => {
            Entry::ChannelGroupMember(extract_record::<ChannelGroupMember>(obj)?)
        }
        RecordKind::Timer => Entry::Timer(extract_record::<Timer>(obj)?),
        RecordKind::Recording => Entry::Recording(extract_record::<Recording>(obj)?),
        RecordKind::EpgTag => Entry::Epg(extract_record::<EpgTag>(obj)?),
        other => {
            return Err(BridgeError::Script(format!("{} records are not streamed", other)));
        }
    };
    Ok(entry)
}

fn stream(
    py: Python<'_>,
    method: &str,
    kind: RecordKind,
    returned: &PyAny,
    scope: &CallScope,
) -> Result<PvrError> {
    if returned.is_none() {
        return Ok(PvrError::NoError);
    }
    if returned.is_instance_of::<PyLong>() {
        return Ok(PvrError::from_code(returned.extract()?));
    }
    if returned.is_instance_of::<PyString>() || returned.is_instance_of::<PyDict>() {
        return Err(BridgeError::unexpected_return(
            method,
            format!("expected a status code or an iterable of records, got {}", type_name(returned)),
        ));
    }

    let records = returned.iter().map_err(|_| {
        BridgeError::unexpected_return(
            method,
            format!("expected a status code or an iterable of records, got {}", type_name(returned)),
        )
    })?;

    for item in records {
        match item {
            Ok(record) => {
                let entry = to_entry(kind, record)?;
                scope
                    .transfer(&entry)
                    .map_err(|err| BridgeError::unexpected_return(method, err.to_string()))?;
            }
            Err(err) if is_list_done(py, &err) => return Ok(list_done_status(py, &err)),
            Err(err) => return Err(err.into()),
        }
    }
    Ok(PvrError::NoError)
}
