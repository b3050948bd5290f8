use crate::domain::clock::Clock;
use crate::domain::ports::{Entity, Schema};
use crate::utils::error::{MarketError, Result};
use serde::Serialize;
use serde_json::{Map, Value};

pub fn encode<T: Serialize>(record: &T) -> Result<String> {
    Ok(serde_json::to_string(record)?)
}

pub fn encode_pretty<T: Serialize>(record: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(record)?)
}

/// 解碼單筆紀錄：接受舊版（法文欄位）格式，缺少的欄位補上預設值，
/// 缺少的時間戳記取自 `clock`
pub fn decode<T: Entity>(text: &str, clock: &impl Clock) -> Result<T> {
    decode_at(text, clock, None)
}

pub fn decode_value<T: Entity>(value: Value, clock: &impl Clock) -> Result<T> {
    decode_value_at(value, clock, None)
}

fn decode_at<T: Entity>(text: &str, clock: &impl Clock, line: Option<usize>) -> Result<T> {
    let value: Value = serde_json::from_str(text).map_err(|e| decode_error::<T>(line, e))?;
    decode_value_at(value, clock, line)
}

fn decode_value_at<T: Entity>(value: Value, clock: &impl Clock, line: Option<usize>) -> Result<T> {
    let Value::Object(mut object) = value else {
        return Err(decode_error::<T>(line, "expected a JSON object"));
    };

    normalize_object(&mut object, T::SCHEMA, clock.now().timestamp_millis());

    serde_json::from_value(Value::Object(object)).map_err(|e| decode_error::<T>(line, e))
}

/// JSON Lines：每行一筆，空白行略過
pub fn decode_lines<T: Entity>(text: &str, clock: &impl Clock) -> Result<Vec<T>> {
    let mut records = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        records.push(decode_at(line, clock, Some(index + 1))?);
    }
    tracing::debug!("Decoded {} {} records", records.len(), T::kind());
    Ok(records)
}

pub fn encode_lines<T: Serialize>(records: &[T]) -> Result<String> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}

/// 讀入任意（舊版或不完整的）JSON Lines，輸出標準格式
pub fn normalize_lines<T: Entity>(text: &str, clock: &impl Clock) -> Result<String> {
    let records = decode_lines::<T>(text, clock)?;
    encode_lines(&records)
}

/// Rewrites `object` in place into the canonical shape described by `schema`.
pub fn normalize_object(object: &mut Map<String, Value>, schema: &Schema, now_millis: i64) {
    for (legacy, canonical) in schema.legacy_keys {
        if let Some(value) = object.remove(*legacy) {
            if !object.contains_key(*canonical) {
                object.insert(canonical.to_string(), value);
            } else {
                tracing::warn!(
                    "Ignoring legacy {}.{}: {} is also present",
                    schema.kind,
                    legacy,
                    canonical
                );
            }
        }
    }

    for (embedded, id_key) in schema.embedded_refs {
        let Some(value) = object.remove(*embedded) else {
            continue;
        };
        if object.contains_key(*id_key) {
            continue;
        }
        match value {
            Value::Object(inner) => {
                if let Some(id) = inner.get("id").cloned() {
                    object.insert(id_key.to_string(), id);
                }
            }
            Value::String(id) => {
                object.insert(id_key.to_string(), Value::String(id));
            }
            _ => {}
        }
    }

    for key in schema.blank_as_absent {
        let blank = matches!(object.get(*key), Some(Value::String(s)) if s.trim().is_empty())
            || matches!(object.get(*key), Some(Value::Null));
        if blank {
            object.remove(*key);
        }
    }

    for (key, nested) in schema.nested {
        if let Some(Value::Object(inner)) = object.get_mut(*key) {
            normalize_object(inner, nested, now_millis);
        }
    }

    for key in schema.timestamps {
        if matches!(object.get(*key), None | Some(Value::Null)) {
            object.insert(key.to_string(), Value::from(now_millis));
        }
    }
}

fn decode_error<T: Entity>(line: Option<usize>, e: impl std::fmt::Display) -> MarketError {
    MarketError::DecodeError {
        kind: T::kind().to_string(),
        line,
        message: e.to_string(),
    }
}
