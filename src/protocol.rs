use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::types::*;

pub const DEFAULT_BASE_URL: &str = "https://api.daikinskyport.com";

pub const LOGIN_PATH: &str = "/users/auth/login";
pub const REFRESH_PATH: &str = "/users/auth/token";
pub const DEVICES_PATH: &str = "/devices";

pub const DEVICE_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

const AUTH_EXPIRED_ERROR: &str = "authorization_expired";

pub fn device_data_path(device_id: &str) -> String {
    format!("/deviceData/{device_id}")
}

/// Setpoints go over the wire with one decimal of precision.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub fn is_auth_expired(status: u16, body: &str) -> bool {
    if status != 401 {
        return false;
    }
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(|e| e == AUTH_EXPIRED_ERROR))
        .unwrap_or(false)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

pub fn login_body(email: &str, password: &str) -> Value {
    json!({ "email": email, "password": password })
}

pub fn refresh_body(email: &str, refresh_token: &str) -> Value {
    json!({ "email": email, "refreshToken": refresh_token })
}

pub fn hvac_mode_data(mode: HvacMode) -> Value {
    json!({ "mode": mode.as_skyport_value() })
}

pub fn fan_mode_data(mode: FanMode) -> Value {
    json!({ "fanCirculate": mode.as_skyport_value() })
}

pub fn fan_speed_data(speed: FanSpeed) -> Value {
    json!({ "fanCirculateSpeed": speed.as_skyport_value() })
}

pub fn fan_clean_data(active: bool) -> Value {
    json!({ "oneCleanFanActive": active })
}

pub fn temp_hold_data(heat: f64, cool: f64, duration: u64) -> Value {
    json!({
        "hspHome": round1(heat),
        "cspHome": round1(cool),
        "schedOverride": 1,
        "schedOverrideDuration": duration
    })
}

pub fn permanent_hold_data(heat: f64, cool: f64) -> Value {
    json!({
        "hspHome": round1(heat),
        "cspHome": round1(cool),
        "schedOverride": 0,
        "schedEnabled": false
    })
}

pub fn away_data(away: bool, heat: f64, cool: f64) -> Value {
    json!({
        "geofencingAway": away,
        "hspAway": round1(heat),
        "cspAway": round1(cool)
    })
}

pub fn resume_program_data() -> Value {
    json!({
        "schedEnabled": true,
        "schedOverride": 0,
        "geofencingAway": false
    })
}

pub fn fan_schedule_data(start: u8, stop: u8, interval: FanInterval, speed: FanSpeed) -> Value {
    json!({
        "fanCirculateStart": start,
        "fanCirculateStop": stop,
        "fanCirculateDuration": interval.as_skyport_value(),
        "fanCirculateSpeed": speed.as_skyport_value()
    })
}

pub fn night_mode_data(start: u8, stop: u8, enabled: bool) -> Value {
    json!({
        "nightModeStart": start,
        "nightModeStop": stop,
        "nightModeEnabled": enabled
    })
}

pub fn humidity_data(low: u64, high: u64) -> Value {
    json!({
        "humSP": low,
        "dehumSP": high
    })
}

pub fn schedule_data(part: SchedulePart, entry: &ScheduleEntry) -> Value {
    let prefix = part.prefix();
    let mut data = Map::new();
    data.insert(format!("{prefix}Time"), json!(entry.start));
    data.insert(format!("{prefix}Enabled"), json!(entry.enabled));
    data.insert(format!("{prefix}Label"), json!(entry.label));
    data.insert(format!("{prefix}hsp"), json!(round1(entry.heat_setpoint)));
    data.insert(format!("{prefix}csp"), json!(round1(entry.cool_setpoint)));
    Value::Object(data)
}
