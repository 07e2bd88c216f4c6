//! Закрытые перечисления состояний из PowerNet MIB.
//! Код, которого нет в перечислении, не приводится к "unknown" молча:
//! `from_code` возвращает `None`, и декодер помечает OID как пропущенный.

use std::fmt;

use serde::Serialize;

macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident = $code:literal => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn from_code(code: i64) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub const fn code(self) -> i64 {
                match self {
                    $($name::$variant => $code),+
                }
            }

            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

code_enum! {
    /// upsBasicBatteryStatus
    BatteryStatus {
        Unknown = 1 => "unknown",
        Normal = 2 => "normal",
        Low = 3 => "low",
        InFaultCondition = 4 => "in_fault_condition",
    }
}

code_enum! {
    /// upsAdvBatteryReplaceIndicator
    BatteryReplace {
        NotNeeded = 1 => "not_needed",
        Needed = 2 => "needed",
    }
}

code_enum! {
    /// upsBasicOutputStatus
    OutputStatus {
        Unknown = 1 => "unknown",
        Online = 2 => "online",
        OnBattery = 3 => "on_battery",
        SmartBoost = 4 => "smart_boost",
        TimedSleeping = 5 => "timed_sleeping",
        SoftwareBypass = 6 => "software_bypass",
        Off = 7 => "off",
        Rebooting = 8 => "rebooting",
        SwitchedBypass = 9 => "switched_bypass",
        HardwareFailureBypass = 10 => "hardware_failure_bypass",
        SleepingUntilPowerReturn = 11 => "sleeping_until_power_return",
        SmartTrim = 12 => "smart_trim",
        EcoMode = 13 => "eco_mode",
        HotStandby = 14 => "hot_standby",
        BatteryTest = 15 => "battery_test",
    }
}

code_enum! {
    /// upsAdvInputLineFailCause
    TransferCause {
        NoTransfer = 1 => "no_transfer",
        HighLineVoltage = 2 => "high_line_voltage",
        Brownout = 3 => "brownout",
        Blackout = 4 => "blackout",
        SmallMomentarySag = 5 => "small_momentary_sag",
        DeepMomentarySag = 6 => "deep_momentary_sag",
        SmallMomentarySpike = 7 => "small_momentary_spike",
        LargeMomentarySpike = 8 => "large_momentary_spike",
        SelfTest = 9 => "self_test",
        RateOfVoltageChange = 10 => "rate_of_voltage_change",
    }
}

code_enum! {
    /// upsAdvTestDiagnosticsResults
    SelfTestResult {
        Ok = 1 => "ok",
        Failed = 2 => "failed",
        Invalid = 3 => "invalid",
        InProgress = 4 => "in_progress",
    }
}

/// Какое перечисление применять к целому значению OID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    BatteryStatus,
    BatteryReplace,
    OutputStatus,
    TransferCause,
    SelfTestResult,
}

impl StateKind {
    pub fn decode(self, code: i64) -> Option<StateValue> {
        match self {
            StateKind::BatteryStatus => BatteryStatus::from_code(code).map(StateValue::Battery),
            StateKind::BatteryReplace => BatteryReplace::from_code(code).map(StateValue::Replace),
            StateKind::OutputStatus => OutputStatus::from_code(code).map(StateValue::Output),
            StateKind::TransferCause => TransferCause::from_code(code).map(StateValue::Transfer),
            StateKind::SelfTestResult => SelfTestResult::from_code(code).map(StateValue::SelfTest),
        }
    }
}

/// Декодированное состояние
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum StateValue {
    Battery(BatteryStatus),
    Replace(BatteryReplace),
    Output(OutputStatus),
    Transfer(TransferCause),
    SelfTest(SelfTestResult),
}

impl StateValue {
    pub const fn as_str(self) -> &'static str {
        match self {
            StateValue::Battery(s) => s.as_str(),
            StateValue::Replace(s) => s.as_str(),
            StateValue::Output(s) => s.as_str(),
            StateValue::Transfer(s) => s.as_str(),
            StateValue::SelfTest(s) => s.as_str(),
        }
    }

    pub const fn code(self) -> i64 {
        match self {
            StateValue::Battery(s) => s.code(),
            StateValue::Replace(s) => s.code(),
            StateValue::Output(s) => s.code(),
            StateValue::Transfer(s) => s.code(),
            StateValue::SelfTest(s) => s.code(),
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
