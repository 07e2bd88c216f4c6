//! Декодирование сырых значений по правилам каталога

use crate::catalog::{DecodeRule, MetricDescriptor, Unit};
use crate::snmp::RawValue;

use super::types::{MeasuredValue, Measurement, MissingReason};

/// Декодирует значение одного OID. Ошибка не валит раунд:
/// OID просто попадает в список пропущенных.
pub fn decode(descriptor: &MetricDescriptor, raw: &RawValue) -> Result<Measurement, MissingReason> {
    if raw.is_absent() {
        let detail = match raw {
            RawValue::ErrorStatus(status) => format!("error-status {status}"),
            other => other.type_name().to_string(),
        };
        return Err(MissingReason::NotSupported { detail });
    }

    let value = match descriptor.rule {
        DecodeRule::Text => MeasuredValue::Text(text(raw)?),
        DecodeRule::Scaled { divisor, min, max, .. } => {
            let v = integer(raw)?;
            if v < min || v > max {
                return Err(MissingReason::OutOfRange { raw: v });
            }
            MeasuredValue::Number(round1(v as f64 / f64::from(divisor)))
        }
        DecodeRule::Timeticks(unit) => {
            let seconds = ticks(raw)? as f64 / 100.0;
            let value = match unit {
                Unit::Minutes => seconds / 60.0,
                _ => seconds,
            };
            MeasuredValue::Number(round1(value))
        }
        DecodeRule::State(kind) => {
            let code = integer(raw)?;
            MeasuredValue::State(
                kind.decode(code)
                    .ok_or(MissingReason::UnknownEnumValue { code })?,
            )
        }
    };

    Ok(Measurement {
        key: descriptor.key,
        value,
        unit: descriptor.unit(),
    })
}

fn unexpected(raw: &RawValue) -> MissingReason {
    MissingReason::UnexpectedType {
        got: raw.type_name().to_string(),
    }
}

fn text(raw: &RawValue) -> Result<String, MissingReason> {
    match raw {
        RawValue::OctetString(bytes) => Ok(String::from_utf8_lossy(bytes)
            .trim_end_matches('\0')
            .trim()
            .to_string()),
        other => Err(unexpected(other)),
    }
}

fn integer(raw: &RawValue) -> Result<i64, MissingReason> {
    match raw {
        RawValue::Integer(v) => Ok(*v),
        RawValue::Unsigned(v) => i64::try_from(*v).map_err(|_| MissingReason::OutOfRange { raw: i64::MAX }),
        other => Err(unexpected(other)),
    }
}

fn ticks(raw: &RawValue) -> Result<u64, MissingReason> {
    match raw {
        RawValue::Timeticks(t) => Ok(u64::from(*t)),
        // некоторые прошивки отдают Gauge32 вместо TimeTicks
        RawValue::Unsigned(v) => Ok(*v),
        RawValue::Integer(v) => u64::try_from(*v).map_err(|_| MissingReason::OutOfRange { raw: *v }),
        other => Err(unexpected(other)),
    }
}

/// Округление до одного знака
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
