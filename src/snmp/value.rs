use snmp2::Value;

/// Значение varbind, отвязанное от буфера сессии.
///
/// `snmp2::Value` заимствует буфер ответа, а сессия живёт внутри
/// блокирующей задачи, поэтому наружу отдаётся владеющая копия.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Integer(i64),
    OctetString(Vec<u8>),
    Timeticks(u32),
    /// Counter32, Gauge32/Unsigned32, Counter64
    Unsigned(u64),
    ObjectId(String),
    Null,
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    /// Ненулевой error-status ответа, относится ко всему запросу
    ErrorStatus(u32),
    /// Тип, который декодер не ожидает
    Other(String),
}

impl RawValue {
    pub fn text(s: &str) -> Self {
        RawValue::OctetString(s.as_bytes().to_vec())
    }

    /// OID отсутствует на агенте
    pub fn is_absent(&self) -> bool {
        matches!(
            self,
            RawValue::NoSuchObject
                | RawValue::NoSuchInstance
                | RawValue::EndOfMibView
                | RawValue::ErrorStatus(_)
        )
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            RawValue::Integer(_) => "INTEGER",
            RawValue::OctetString(_) => "OCTET STRING",
            RawValue::Timeticks(_) => "TimeTicks",
            RawValue::Unsigned(_) => "Unsigned",
            RawValue::ObjectId(_) => "OBJECT IDENTIFIER",
            RawValue::Null => "NULL",
            RawValue::NoSuchObject => "noSuchObject",
            RawValue::NoSuchInstance => "noSuchInstance",
            RawValue::EndOfMibView => "endOfMibView",
            RawValue::ErrorStatus(_) => "error-status",
            RawValue::Other(_) => "other",
        }
    }
}

impl From<&Value<'_>> for RawValue {
    fn from(value: &Value<'_>) -> Self {
        match value {
            Value::Integer(v) => RawValue::Integer(*v),
            Value::OctetString(bytes) => RawValue::OctetString(bytes.to_vec()),
            Value::Timeticks(v) => RawValue::Timeticks(*v),
            Value::Counter32(v) | Value::Unsigned32(v) => RawValue::Unsigned(u64::from(*v)),
            Value::Counter64(v) => RawValue::Unsigned(*v),
            Value::ObjectIdentifier(oid) => RawValue::ObjectId(oid.to_string()),
            Value::Null => RawValue::Null,
            Value::NoSuchObject => RawValue::NoSuchObject,
            Value::NoSuchInstance => RawValue::NoSuchInstance,
            Value::EndOfMibView => RawValue::EndOfMibView,
            other => RawValue::Other(format!("{other:?}")),
        }
    }
}
