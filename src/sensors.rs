use crate::protocol::round1;
use crate::types::Device;
use crate::{Error, Result};

use self::Scale::*;
use self::SensorKind::*;

/// Demand and status fields are reported in half-percent steps.
pub const PERCENT_MULTIPLIER: f64 = 2.0;

const OZONE_PPB_TO_UGM3: f64 = 1.96;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Temperature,
    Humidity,
    Demand,
    Power,
    FrequencyPercent,
    ActualStatus,
    Particle,
    Score,
    Ozone,
    Voc,
}

impl SensorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "temperature",
            SensorKind::Humidity => "humidity",
            SensorKind::Demand => "demand",
            SensorKind::Power => "power",
            SensorKind::FrequencyPercent => "frequency_percent",
            SensorKind::ActualStatus => "actual_status",
            SensorKind::Particle => "particle",
            SensorKind::Score => "score",
            SensorKind::Ozone => "ozone",
            SensorKind::Voc => "VOC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    pub name: String,
    pub value: f64,
    pub kind: SensorKind,
}

enum Scale {
    Raw,
    Halved,
    OzoneUgm3,
}

const BASE_SENSORS: &[(&str, &str, SensorKind, Scale)] = &[
    ("Outdoor", "tempOutdoor", Temperature, Raw),
    ("Outdoor", "humOutdoor", Humidity, Raw),
    ("Outdoor fan", "ctOutdoorFanRequestedDemandPercentage", Demand, Halved),
    ("Outdoor heat pump", "ctOutdoorHeatRequestedDemand", Demand, Halved),
    ("Outdoor cooling", "ctOutdoorCoolRequestedDemand", Demand, Halved),
    ("Outdoor", "ctOutdoorPower", Power, Raw),
    ("Outdoor", "ctOutdoorFrequencyInPercent", FrequencyPercent, Halved),
    ("Indoor", "tempIndoor", Temperature, Raw),
    ("Indoor", "humIndoor", Humidity, Raw),
    ("Indoor fan", "ctIFCFanRequestedDemandPercent", Demand, Halved),
    ("Indoor fan", "ctIFCCurrentFanActualStatus", ActualStatus, Halved),
    ("Indoor cooling", "ctIFCCoolRequestedDemandPercent", Demand, Halved),
    ("Indoor cooling", "ctIFCCurrentCoolActualStatus", ActualStatus, Halved),
    ("Indoor furnace", "ctIFCHeatRequestedDemandPercent", Demand, Halved),
    ("Indoor furnace", "ctIFCCurrentHeatActualStatus", ActualStatus, Halved),
    ("Indoor humidifier", "ctIFCHumRequestedDemandPercent", Demand, Halved),
    ("Indoor dehumidifier", "ctIFCDehumRequestedDemandPercent", Demand, Halved),
    ("Indoor", "ctIndoorPower", Power, Raw),
];

const OUTDOOR_AIR_QUALITY: &[(&str, &str, SensorKind, Scale)] = &[
    ("Outdoor", "aqOutdoorParticles", Particle, Raw),
    ("Outdoor", "aqOutdoorValue", Score, Raw),
    ("Outdoor", "aqOutdoorOzone", Ozone, OzoneUgm3),
];

const INDOOR_AIR_QUALITY: &[(&str, &str, SensorKind, Scale)] = &[
    ("Indoor", "aqIndoorParticlesValue", Particle, Raw),
    ("Indoor", "aqIndoorValue", Score, Raw),
    ("Indoor", "aqIndoorVOCValue", Voc, Raw),
];

/// Flattens a device's readings into named sensors.
pub fn sensors_for(device: &Device) -> Result<Vec<Sensor>> {
    let mut sensors = Vec::new();
    push_all(device, BASE_SENSORS, &mut sensors)?;
    if require_flag(device, "aqOutdoorAvailable")? {
        push_all(device, OUTDOOR_AIR_QUALITY, &mut sensors)?;
    }
    if require_flag(device, "aqIndoorAvailable")? {
        push_all(device, INDOOR_AIR_QUALITY, &mut sensors)?;
    }
    Ok(sensors)
}

fn push_all(
    device: &Device,
    table: &[(&str, &str, SensorKind, Scale)],
    out: &mut Vec<Sensor>,
) -> Result<()> {
    for (suffix, field, kind, scale) in table {
        let raw = device.number(field).ok_or_else(|| missing(device, field))?;
        let value = match scale {
            Raw => raw,
            Halved => round1(raw / PERCENT_MULTIPLIER),
            OzoneUgm3 => (raw * OZONE_PPB_TO_UGM3).round(),
        };
        out.push(Sensor {
            name: format!("{} {suffix}", device.name),
            value,
            kind: *kind,
        });
    }
    Ok(())
}

fn require_flag(device: &Device, field: &str) -> Result<bool> {
    device.flag(field).ok_or_else(|| missing(device, field))
}

fn missing(device: &Device, field: &str) -> Error {
    Error::MissingField {
        device_id: device.id.clone(),
        field: field.to_string(),
    }
}
