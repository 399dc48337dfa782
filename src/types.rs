use serde::Deserialize;
use serde_json::{Map, Value};

/// One entry of the `/devices` index.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceSummary {
    pub id: String,
    pub name: String,
}

/// A thermostat as last fetched from `/deviceData/{id}`.
///
/// `data` holds the vendor payload verbatim with `id` and `name` merged in.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub data: Map<String, Value>,
}

impl Device {
    pub(crate) fn from_detail(summary: DeviceSummary, mut data: Map<String, Value>) -> Self {
        data.insert("name".to_string(), Value::String(summary.name.clone()));
        data.insert("id".to_string(), Value::String(summary.id.clone()));
        Self {
            id: summary.id,
            name: summary.name,
            data,
        }
    }

    pub fn field(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.data.get(field).and_then(|v| v.as_f64())
    }

    pub fn flag(&self, field: &str) -> Option<bool> {
        self.data.get(field).and_then(|v| v.as_bool())
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(|v| v.as_str())
    }

    pub fn hvac_mode(&self) -> Option<HvacMode> {
        self.data
            .get("mode")
            .and_then(|v| v.as_u64())
            .and_then(HvacMode::from_skyport_value)
    }

    pub fn indoor_temperature(&self) -> Option<f64> {
        self.number("tempIndoor")
    }

    pub fn outdoor_temperature(&self) -> Option<f64> {
        self.number("tempOutdoor")
    }

    pub fn indoor_humidity(&self) -> Option<f64> {
        self.number("humIndoor")
    }

    pub fn heat_setpoint(&self) -> Option<f64> {
        self.number("hspHome")
    }

    pub fn cool_setpoint(&self) -> Option<f64> {
        self.number("cspHome")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvacMode {
    Off,
    Heat,
    Cool,
    Auto,
    AuxHeat,
}

impl HvacMode {
    pub fn as_skyport_value(&self) -> u8 {
        match self {
            HvacMode::Off => 0,
            HvacMode::Heat => 1,
            HvacMode::Cool => 2,
            HvacMode::Auto => 3,
            HvacMode::AuxHeat => 4,
        }
    }

    pub fn from_skyport_value(v: u64) -> Option<Self> {
        match v {
            0 => Some(HvacMode::Off),
            1 => Some(HvacMode::Heat),
            2 => Some(HvacMode::Cool),
            3 => Some(HvacMode::Auto),
            4 => Some(HvacMode::AuxHeat),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanMode {
    Auto,
    On,
    Schedule,
}

impl FanMode {
    pub fn as_skyport_value(&self) -> u8 {
        match self {
            FanMode::Auto => 0,
            FanMode::On => 1,
            FanMode::Schedule => 2,
        }
    }

    pub fn from_skyport_value(v: u64) -> Option<Self> {
        match v {
            0 => Some(FanMode::Auto),
            1 => Some(FanMode::On),
            2 => Some(FanMode::Schedule),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanSpeed {
    Low,
    Medium,
    High,
}

impl FanSpeed {
    pub fn as_skyport_value(&self) -> u8 {
        match self {
            FanSpeed::Low => 0,
            FanSpeed::Medium => 1,
            FanSpeed::High => 2,
        }
    }

    pub fn from_skyport_value(v: u64) -> Option<Self> {
        match v {
            0 => Some(FanSpeed::Low),
            1 => Some(FanSpeed::Medium),
            2 => Some(FanSpeed::High),
            _ => None,
        }
    }
}

/// Fan run time per hour while a fan schedule is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanInterval {
    Continuous,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    FortyFiveMinutes,
}

impl FanInterval {
    pub fn as_skyport_value(&self) -> u8 {
        match self {
            FanInterval::Continuous => 0,
            FanInterval::FiveMinutes => 1,
            FanInterval::FifteenMinutes => 2,
            FanInterval::ThirtyMinutes => 3,
            FanInterval::FortyFiveMinutes => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub fn as_skyport_str(&self) -> &'static str {
        match self {
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
            Weekday::Sat => "Sat",
            Weekday::Sun => "Sun",
        }
    }
}

/// Addresses one of the six daily schedule parts, e.g. `schedMonPart1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulePart {
    pub day: Weekday,
    pub part: u8,
}

impl SchedulePart {
    pub fn new(day: Weekday, part: u8) -> Self {
        Self { day, part }
    }

    pub fn prefix(&self) -> String {
        format!("sched{}Part{}", self.day.as_skyport_str(), self.part)
    }
}

/// Settings for one schedule part. Times count 15 minute slots from midnight.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEntry {
    pub start: u8,
    pub enabled: bool,
    pub label: String,
    pub heat_setpoint: f64,
    pub cool_setpoint: f64,
}

/// Changes observed while merging fresh device data into the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    DeviceDiscovered {
        id: String,
        name: String,
    },
    FieldChanged {
        device_id: String,
        field: String,
        old: Value,
        new: Value,
    },
}
