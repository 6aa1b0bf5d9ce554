//! Python bindings.
//!
//! The Python side keeps the HTTP fetch and the SQL writes; it hands the
//! core raw payloads or whole feed documents and gets plain dicts back.

use anyhow::{bail, Context};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use serde_json::{json, Map, Value};

use crate::config::PipelineConfig;
use crate::decoder::decode;
use crate::feed::{parse_feed, StaticFeed};
use crate::model::{parse_timestamp, ApiKey, DeviceMapping, ProtocolVariant};
use crate::pipeline::{process_device, RunContext};
use crate::storage::{record_columns, MemorySink};

fn to_py_err(e: anyhow::Error) -> PyErr {
    PyValueError::new_err(format!("{:#}", e))
}

/// Convert a JSON value into the equivalent Python object.
fn json_to_py(py: Python<'_>, value: &Value) -> PyResult<PyObject> {
    let object = match value {
        Value::Null => py.None(),
        Value::Bool(b) => b.to_object(py),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_object(py)
            } else if let Some(u) = n.as_u64() {
                u.to_object(py)
            } else {
                n.as_f64().unwrap_or(f64::NAN).to_object(py)
            }
        }
        Value::String(s) => s.to_object(py),
        Value::Array(items) => {
            let list = PyList::empty(py);
            for item in items {
                list.append(json_to_py(py, item)?)?;
            }
            list.into()
        }
        Value::Object(map) => {
            let dict = PyDict::new(py);
            for (key, item) in map {
                dict.set_item(key, json_to_py(py, item)?)?;
            }
            dict.into()
        }
    };
    Ok(object)
}

fn decode_to_json(payload: &str, variant: &str) -> anyhow::Result<Value> {
    let variant = ProtocolVariant::parse(variant)?;
    let telemetry = decode(payload.trim(), variant)
        .with_context(|| format!("failed to decode {} payload", variant))?;
    Ok(serde_json::to_value(&telemetry)?)
}

fn ingest_to_json(
    device_id: &str,
    variant: &str,
    watermark: Option<&str>,
    feed_json: &str,
    field_id: u32,
) -> anyhow::Result<Value> {
    let variant = ProtocolVariant::parse(variant)?;
    let device_id = device_id.trim();
    if device_id.is_empty() {
        bail!("device_id must not be blank");
    }

    let mapping = DeviceMapping {
        device_id: device_id.to_string(),
        client_id: 0,
        channel_id: 0,
        field_id,
        api_key: ApiKey::default(),
        protocol_variant: variant,
        target_sink: variant.default_table().to_string(),
    };

    let page = parse_feed(feed_json, &mapping.field_key()).context("invalid feed document")?;
    let (skipped_blank, skipped_invalid) = (page.skipped_blank, page.skipped_invalid);

    let sink = MemorySink::new();
    if let Some(watermark) = watermark {
        let at = parse_timestamp(watermark).context("invalid watermark")?;
        sink.seed_watermark(&mapping, at);
    }

    let ctx = RunContext::new();
    let feed = StaticFeed::from(page);
    let report = process_device(&ctx, &mapping, &feed, &sink, &PipelineConfig::default());

    let rows: Vec<Value> = sink
        .records(&mapping)
        .iter()
        .map(|record| -> anyhow::Result<Value> {
            let mut row = Map::new();
            for (column, value) in record_columns(record)? {
                row.insert(column.to_string(), serde_json::to_value(value)?);
            }
            Ok(Value::Object(row))
        })
        .collect::<Result<_, _>>()?;

    Ok(json!({
        "run_id": ctx.run_id,
        "device_id": mapping.device_id,
        "table": mapping.target_sink,
        "outcome": report.outcome.as_str(),
        "watermark": report.watermark_after.map(|w| w.to_rfc3339()),
        "skipped_blank": skipped_blank,
        "skipped_invalid": skipped_invalid,
        "frames_fetched": report.frames_fetched,
        "frames_admitted": report.frames_admitted,
        "frames_stale": report.frames_stale,
        "frames_duplicate": report.frames_duplicate,
        "failures": serde_json::to_value(&report.failures)?,
        "rows": rows,
    }))
}

/// Decode a single payload.
///
/// # Arguments
/// * `payload` - Raw payload as reported by the feed
/// * `variant` - "P1" or "P2" (or the logic ids "1" / "2")
///
/// # Returns
/// Dict of decoded fields tagged with `variant`
#[pyfunction]
fn decode_payload(py: Python<'_>, payload: &str, variant: &str) -> PyResult<PyObject> {
    crate::init_logger(log::LevelFilter::Info);
    let value = decode_to_json(payload, variant).map_err(to_py_err)?;
    json_to_py(py, &value)
}

/// Filter and decode one device's feed document.
///
/// Rows newer than `watermark` are returned ready for insertion into the
/// variant's transaction table. The returned `watermark` is valid once the
/// caller has stored every row.
///
/// # Arguments
/// * `device_id` - Device the feed belongs to
/// * `variant` - "P1" or "P2"
/// * `watermark` - Latest stored `CreatedAt`, or None for a new device
/// * `feed_json` - Feed document as returned by the feed service
/// * `field_id` - Feed field carrying the payload
#[pyfunction]
#[pyo3(signature = (device_id, variant, watermark, feed_json, field_id))]
fn ingest_feed(
    py: Python<'_>,
    device_id: &str,
    variant: &str,
    watermark: Option<&str>,
    feed_json: &str,
    field_id: u32,
) -> PyResult<PyObject> {
    crate::init_logger(log::LevelFilter::Info);
    let value =
        ingest_to_json(device_id, variant, watermark, feed_json, field_id).map_err(to_py_err)?;
    json_to_py(py, &value)
}

/// Python module definition
#[pymodule]
fn genvolt_core(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(decode_payload, m)?)?;
    m.add_function(wrap_pyfunction!(ingest_feed, m)?)?;
    Ok(())
}
