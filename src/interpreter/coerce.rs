//! Script value ↔ record field coercion, driven by the schema tables

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyFloat, PyLong, PyString};

use crate::errors::{BridgeError, Result};
use crate::schema::{FieldKind, FieldSpec, Record, Value};

/// Look a key up on a record: `dict` key first, attribute otherwise.
/// `None` counts as missing.
pub fn lookup<'py>(obj: &'py PyAny, key: &str) -> PyResult<Option<&'py PyAny>> {
    let found = match obj.downcast::<PyDict>() {
        Ok(dict) => dict.get_item(key)?,
        Err(_) if obj.hasattr(key)? => Some(obj.getattr(key)?),
        Err(_) => None,
    };
    Ok(found.filter(|value| !value.is_none()))
}

/// Coerce one script value; `Ok(None)` when its type does not fit `kind`
pub fn coerce(value: &PyAny, kind: FieldKind) -> PyResult<Option<Value>> {
    let coerced = match kind {
        FieldKind::Bool => Some(Value::Bool(value.is_true()?)),
        FieldKind::Int if value.is_instance_of::<PyLong>() => Some(Value::Int(value.extract()?)),
        FieldKind::Int => None,
        FieldKind::Str if value.is_instance_of::<PyString>() => Some(Value::Str(value.extract()?)),
        FieldKind::Str => None,
        FieldKind::Time => time_value(value)?.map(Value::Int),
    };
    Ok(coerced)
}

fn time_value(value: &PyAny) -> PyResult<Option<i64>> {
    if value.is_instance_of::<PyLong>() {
        return Ok(Some(value.extract()?));
    }
    if value.is_instance_of::<PyFloat>() {
        return Ok(Some(value.extract::<f64>()? as i64));
    }
    if value.hasattr("timestamp")? {
        let seconds: f64 = value.call_method0("timestamp")?.extract()?;
        return Ok(Some(seconds as i64));
    }
    Ok(None)
}

/// Coerce a value for a field of `R`, naming the field on mismatch
pub fn coerce_field<R: Record>(value: &PyAny, spec: &'static FieldSpec) -> Result<Value> {
    match coerce(value, spec.kind)? {
        Some(v) => Ok(v),
        None => Err(BridgeError::Coercion {
            kind: R::KIND,
            field: spec.key,
            expected: spec.kind.name(),
            found: type_name(value),
        }),
    }
}

/// Build a record from a script object, starting from the record's defaults
pub fn extract_record<R: Record>(obj: &PyAny) -> Result<R> {
    let mut record = R::default();
    for spec in R::FIELDS {
        if let Some(raw) = lookup(obj, spec.key)? {
            let value = coerce_field::<R>(raw, spec)?;
            let stored = record.set(spec.key, value);
            debug_assert!(stored, "{} table disagrees with its struct on '{}'", R::KIND, spec.key);
        }
    }
    Ok(record)
}

/// Script-side view of a record
pub fn record_to_dict<'py, R: Record>(py: Python<'py>, record: &R) -> PyResult<&'py PyDict> {
    let dict = PyDict::new(py);
    for (key, value) in record.values() {
        match value {
            Value::Int(v) => dict.set_item(key, v)?,
            Value::Bool(b) => dict.set_item(key, b)?,
            Value::Str(s) => dict.set_item(key, s)?,
        }
    }
    Ok(dict)
}

pub fn type_name(value: &PyAny) -> String {
    value
        .get_type()
        .name()
        .map(str::to_string)
        .unwrap_or_else(|_| "<unknown>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Channel, EpgTag, RecordKind, Recording, Timer, CHANNEL_INVALID_UID};

    fn with_py<R>(f: impl FnOnce(Python<'_>) -> R) -> R {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(f)
    }

    fn eval<'py>(py: Python<'py>, code: &str) -> &'py PyAny {
        py.eval(code, None, None).unwrap()
    }

    #[test]
    fn test_dict_record_with_missing_keys_uses_defaults() {
        with_py(|py| {
            let obj = eval(py, "{'uniqueId': 7, 'channelName': 'ABC ME', 'isRadio': 0, 'iconPath': None}");
            let channel: Channel = extract_record(obj).unwrap();
            assert_eq!(channel.unique_id, 7);
            assert_eq!(channel.channel_name, "ABC ME");
            assert!(!channel.is_radio);
            assert_eq!(channel.icon_path, "");
            assert_eq!(channel.sub_channel_number, 0);
        });
    }

    #[test]
    fn test_attribute_record() {
        with_py(|py| {
            let module = PyModule::from_code(
                py,
                "class Rec:\n    def __init__(self):\n        self.title = 'News'\n        self.duration = 1800\n        self.isDeleted = True\n",
                "rec.py",
                "rec_attr_test",
            )
            .unwrap();
            let obj = module.getattr("Rec").unwrap().call0().unwrap();
            let rec: Recording = extract_record(obj).unwrap();
            assert_eq!(rec.title, "News");
            assert_eq!(rec.duration, 1800);
            assert!(rec.is_deleted);
            assert_eq!(rec.channel_uid, CHANNEL_INVALID_UID);
        });
    }

    #[test]
    fn test_time_accepts_int_float_and_datetime() {
        with_py(|py| {
            let obj = eval(
                py,
                "{'startTime': 100, 'endTime': 200.9, 'firstDay': __import__('datetime').datetime.fromtimestamp(300)}",
            );
            let timer: Timer = extract_record(obj).unwrap();
            assert_eq!(timer.start_time, 100);
            assert_eq!(timer.end_time, 200);
            assert_eq!(timer.first_day, 300);
        });
    }

    #[test]
    fn test_wrong_type_names_field() {
        with_py(|py| {
            let obj = eval(py, "{'title': 42}");
            let err = extract_record::<EpgTag>(obj).unwrap_err();
            match err {
                BridgeError::Coercion { kind, field, found, .. } => {
                    assert_eq!(kind, RecordKind::EpgTag);
                    assert_eq!(field, "title");
                    assert_eq!(found, "int");
                }
                other => panic!("unexpected error: {other}"),
            }
        });
    }

    #[test]
    fn test_dict_view_matches_record() {
        with_py(|py| {
            let channel = Channel {
                unique_id: 3,
                channel_name: "ABC Kids".into(),
                is_hidden: true,
                ..Channel::default()
            };
            let dict = record_to_dict(py, &channel).unwrap();
            assert_eq!(dict.len(), Channel::FIELDS.len());
            let back: Channel = extract_record(dict).unwrap();
            assert_eq!(back, channel);
        });
    }
}
