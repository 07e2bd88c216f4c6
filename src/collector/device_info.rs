use serde::Serialize;

use super::types::Snapshot;
use crate::catalog::MetricKey;

/// Паспорт ИБП из ветки upsIdent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    pub model: Option<String>,
    pub name: Option<String>,
    pub firmware: Option<String>,
    pub serial: Option<String>,
    pub manufacture_date: Option<String>,
}

impl DeviceIdentity {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let text = |key: MetricKey| {
            snapshot
                .text(key)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            model: text(MetricKey::Model),
            name: text(MetricKey::Name),
            firmware: text(MetricKey::Firmware),
            serial: text(MetricKey::Serial),
            manufacture_date: text(MetricKey::ManufactureDate),
        }
    }

    /// Имя для отображения: имя, заданное на устройстве, иначе модель
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.model.as_ref().map(|m| format!("APC {m}")))
            .unwrap_or_else(|| "APC UPS".to_string())
    }
}
