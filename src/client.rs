use std::path::PathBuf;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, error, trace, warn};

use crate::config::{ConfigStore, Credentials, FileConfig, MemoryConfig, DEFAULT_CONFIG_FILE};
use crate::diff::device_events;
use crate::logger::{MessageLogMode, MessageLogger};
use crate::protocol::{
    self, device_data_path, LoginResponse, RefreshResponse, DEFAULT_BASE_URL, DEVICES_PATH,
    DEVICE_CONTENT_TYPE, LOGIN_PATH, REFRESH_PATH,
};
use crate::sensors::{sensors_for, Sensor};
use crate::types::*;
use crate::{Error, Result};

type EventCallback = Box<dyn Fn(&Event) + Send + Sync>;
type SnapshotCallback = Box<dyn Fn(&[Device]) + Send + Sync>;

/// Token refreshes allowed per operation. `list_devices` shares one budget
/// across the index and every detail fetch.
const MAX_AUTH_RETRIES: usize = 1;

pub struct SessionBuilder {
    base_url: String,
    email: Option<String>,
    password: Option<String>,
    config_file: Option<PathBuf>,
    config: Option<Credentials>,
    event_callbacks: Vec<EventCallback>,
    snapshot_callbacks: Vec<SnapshotCallback>,
    log_mode: Option<MessageLogMode>,
    log_path: Option<String>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            email: None,
            password: None,
            config_file: None,
            config: None,
            event_callbacks: Vec::new(),
            snapshot_callbacks: Vec::new(),
            log_mode: None,
            log_path: None,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Account credentials. Without a config file or in-memory config these are
    /// written to `daikinskyport.conf` in the working directory.
    pub fn credentials(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self.password = Some(password.into());
        self
    }

    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Use a caller-held credential document; tokens are kept in memory only.
    pub fn config(mut self, credentials: Credentials) -> Self {
        self.config = Some(credentials);
        self
    }

    pub fn on_event(mut self, f: impl Fn(&Event) + Send + Sync + 'static) -> Self {
        self.event_callbacks.push(Box::new(f));
        self
    }

    pub fn on_snapshot(mut self, f: impl Fn(&[Device]) + Send + Sync + 'static) -> Self {
        self.snapshot_callbacks.push(Box::new(f));
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<DeviceSession> {
        let store: Box<dyn ConfigStore> = match (self.config, self.config_file) {
            (Some(credentials), _) => Box::new(MemoryConfig::new(credentials)),
            (None, Some(path)) => Box::new(FileConfig::new(path)),
            (None, None) => {
                let (Some(email), Some(password)) = (&self.email, &self.password) else {
                    error!("no user email or password was supplied");
                    return Err(Error::MissingCredentials("email and password"));
                };
                Box::new(seed_config_file(DEFAULT_CONFIG_FILE, email, password)?)
            }
        };

        let mut credentials = store.load()?;
        if let Some(email) = self.email {
            credentials.email = Some(email);
        }
        if let Some(password) = self.password {
            credentials.password = Some(password);
        }
        if credentials.email.is_none() {
            error!("email missing from config");
            return Err(Error::MissingCredentials("email"));
        }
        if credentials.refresh_token.is_none() && credentials.password.is_none() {
            error!("password missing from config and no refresh token is held");
            return Err(Error::MissingCredentials("password"));
        }

        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(MessageLogger::new(mode, &path)?),
            _ => None,
        };

        Ok(DeviceSession {
            http: reqwest::Client::builder().build()?,
            base_url: self.base_url,
            credentials,
            store,
            authenticated: false,
            devices: Vec::new(),
            event_callbacks: self.event_callbacks,
            snapshot_callbacks: self.snapshot_callbacks,
            logger,
        })
    }
}

/// Writes `{EMAIL, PASSWORD}` to `path` so later token writes have a home.
fn seed_config_file(path: impl Into<PathBuf>, email: &str, password: &str) -> Result<FileConfig> {
    let mut store = FileConfig::new(path);
    store
        .save(&Credentials::new(email, password))
        .inspect_err(|e| warn!("could not write {}: {e}", store.path().display()))?;
    Ok(store)
}

enum Reply {
    Success(Value),
    Expired,
}

/// An authenticated connection to the Skyport cloud plus the cached thermostats.
///
/// All operations take `&mut self`; share a session across tasks only behind
/// the caller's own lock.
pub struct DeviceSession {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    store: Box<dyn ConfigStore>,
    authenticated: bool,
    devices: Vec<Device>,
    event_callbacks: Vec<EventCallback>,
    snapshot_callbacks: Vec<SnapshotCallback>,
    logger: Option<MessageLogger>,
}

impl DeviceSession {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Logs in when no refresh token is held, then fetches every device.
    pub async fn connect(&mut self) -> Result<()> {
        if self.credentials.refresh_token.is_none() {
            self.request_tokens().await?;
        }
        self.update().await
    }

    /// True while the last device request succeeded with the current access token.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn device(&self, index: usize) -> Option<&Device> {
        self.devices.get(index)
    }

    pub fn sensors(&self, index: usize) -> Result<Vec<Sensor>> {
        sensors_for(self.find_device(index)?)
    }

    // -- Authentication --

    /// Full login with email and password. Stores and persists both tokens.
    pub async fn request_tokens(&mut self) -> Result<()> {
        let email = self.email()?.to_string();
        let password = self
            .credentials
            .password
            .clone()
            .ok_or(Error::MissingCredentials("password"))?;

        let resp: LoginResponse = self
            .post_auth(LOGIN_PATH, &protocol::login_body(&email, &password))
            .await
            .inspect_err(|e| warn!("could not request tokens: {e}"))?;

        self.credentials.access_token = Some(resp.access_token);
        let Some(refresh_token) = resp.refresh_token else {
            error!("auth did not return a refresh token");
            return Err(Error::Protocol("login response has no refresh token".to_string()));
        };
        self.credentials.refresh_token = Some(refresh_token);
        debug!("obtained new tokens");
        self.persist_tokens();
        Ok(())
    }

    /// Exchanges the refresh token for a new access token. When that fails a full
    /// login is attempted so later calls can succeed, but this call still errors.
    pub async fn refresh_tokens(&mut self) -> Result<()> {
        let email = self.email()?.to_string();
        let refreshed = match self.credentials.refresh_token.clone() {
            Some(token) => {
                self.post_auth::<RefreshResponse>(
                    REFRESH_PATH,
                    &protocol::refresh_body(&email, &token),
                )
                .await
            }
            None => Err(Error::MissingCredentials("refresh token")),
        };

        match refreshed {
            Ok(resp) => {
                self.credentials.access_token = Some(resp.access_token);
                debug!("access token refreshed");
                self.persist_tokens();
                Ok(())
            }
            Err(e) => {
                warn!("token refresh failed, logging in again: {e}");
                if let Err(e) = self.request_tokens().await {
                    warn!("login after failed refresh also failed: {e}");
                }
                Err(Error::AuthFailed)
            }
        }
    }

    // -- Device data --

    /// Refreshes the whole device cache.
    pub async fn update(&mut self) -> Result<()> {
        self.list_devices().await.map(|_| ())
    }

    /// Fetches the device index and each device's detail, upserting by id.
    /// Devices missing from the index stay cached. At most one token refresh
    /// happens for the whole fetch.
    pub async fn list_devices(&mut self) -> Result<&[Device]> {
        let mut budget = MAX_AUTH_RETRIES;
        let index = self
            .authorized_with_budget(Method::GET, DEVICES_PATH, None, &mut budget)
            .await?;
        let summaries: Vec<DeviceSummary> = serde_json::from_value(index)?;
        debug!(count = summaries.len(), "fetched device index");

        for summary in summaries {
            let detail = self.fetch_detail(&summary.id, &mut budget).await?;
            self.upsert(Device::from_detail(summary, detail));
        }

        for cb in &self.snapshot_callbacks {
            cb(&self.devices);
        }
        Ok(&self.devices)
    }

    pub async fn get_device_detail(&mut self, device_id: &str) -> Result<Map<String, Value>> {
        let mut budget = MAX_AUTH_RETRIES;
        self.fetch_detail(device_id, &mut budget).await
    }

    async fn fetch_detail(
        &mut self,
        device_id: &str,
        budget: &mut usize,
    ) -> Result<Map<String, Value>> {
        match self
            .authorized_with_budget(Method::GET, &device_data_path(device_id), None, budget)
            .await?
        {
            Value::Object(data) => Ok(data),
            other => Err(Error::Protocol(format!(
                "device {device_id} data is not an object: {other}"
            ))),
        }
    }

    fn upsert(&mut self, device: Device) {
        let position = self.devices.iter().position(|d| d.id == device.id);
        let events = device_events(position.map(|i| &self.devices[i]), &device);

        match position {
            Some(i) => self.devices[i] = device,
            None => self.devices.push(device),
        }

        for event in &events {
            for cb in &self.event_callbacks {
                cb(event);
            }
        }
    }

    // -- Command methods --

    /// PUTs `data` to the device at cache position `index`.
    pub async fn make_request(&mut self, index: usize, data: Value, action: &str) -> Result<Value> {
        let device_id = self.find_device(index)?.id.clone();
        debug!(device = %device_id, body = %data, "{action}");

        if let Some(ref mut logger) = self.logger {
            logger.log_command(action, &device_id, &data);
        }

        self.authorized(Method::PUT, &device_data_path(&device_id), Some(&data))
            .await
            .inspect_err(|e| warn!("error while attempting to {action}: {e}"))
    }

    pub async fn set_hvac_mode(&mut self, index: usize, mode: HvacMode) -> Result<Value> {
        let data = protocol::hvac_mode_data(mode);
        self.make_request(index, data, "set HVAC mode").await
    }

    pub async fn set_fan_mode(&mut self, index: usize, mode: FanMode) -> Result<Value> {
        let data = protocol::fan_mode_data(mode);
        self.make_request(index, data, "set fan mode").await
    }

    pub async fn set_fan_speed(&mut self, index: usize, speed: FanSpeed) -> Result<Value> {
        let data = protocol::fan_speed_data(speed);
        self.make_request(index, data, "set fan speed").await
    }

    /// Runs the fan at high speed to clear out the air.
    pub async fn set_fan_clean(&mut self, index: usize, active: bool) -> Result<Value> {
        let data = protocol::fan_clean_data(active);
        self.make_request(index, data, "set fan clean mode").await
    }

    /// Temporary hold. Omitted values default to the device's current
    /// `hspHome`, `cspHome` and `schedOverrideDuration`.
    pub async fn set_temp_hold(
        &mut self,
        index: usize,
        heat: Option<f64>,
        cool: Option<f64>,
        duration: Option<u64>,
    ) -> Result<Value> {
        let heat = self.number_or_cached(index, heat, "hspHome")?;
        let cool = self.number_or_cached(index, cool, "cspHome")?;
        let duration = self.integer_or_cached(index, duration, "schedOverrideDuration")?;
        let data = protocol::temp_hold_data(heat, cool, duration);
        self.make_request(index, data, "set hold temp").await
    }

    /// Holds the given setpoints and disables the schedule.
    pub async fn set_permanent_hold(
        &mut self,
        index: usize,
        heat: Option<f64>,
        cool: Option<f64>,
    ) -> Result<Value> {
        let heat = self.number_or_cached(index, heat, "hspHome")?;
        let cool = self.number_or_cached(index, cool, "cspHome")?;
        let data = protocol::permanent_hold_data(heat, cool);
        self.make_request(index, data, "set permanent hold").await
    }

    pub async fn set_away(
        &mut self,
        index: usize,
        away: bool,
        heat: Option<f64>,
        cool: Option<f64>,
    ) -> Result<Value> {
        let heat = self.number_or_cached(index, heat, "hspAway")?;
        let cool = self.number_or_cached(index, cool, "cspAway")?;
        let data = protocol::away_data(away, heat, cool);
        self.make_request(index, data, "set away mode").await
    }

    pub async fn resume_program(&mut self, index: usize) -> Result<Value> {
        let data = protocol::resume_program_data();
        self.make_request(index, data, "resume program").await
    }

    /// `start` and `stop` count 15 minute slots from midnight.
    pub async fn set_fan_schedule(
        &mut self,
        index: usize,
        start: u8,
        stop: u8,
        interval: FanInterval,
        speed: FanSpeed,
    ) -> Result<Value> {
        let data = protocol::fan_schedule_data(start, stop, interval, speed);
        self.make_request(index, data, "set fan schedule").await
    }

    pub async fn set_night_mode(
        &mut self,
        index: usize,
        start: u8,
        stop: u8,
        enabled: bool,
    ) -> Result<Value> {
        let data = protocol::night_mode_data(start, stop, enabled);
        self.make_request(index, data, "set night mode").await
    }

    pub async fn set_humidity(
        &mut self,
        index: usize,
        low: Option<u64>,
        high: Option<u64>,
    ) -> Result<Value> {
        let low = self.integer_or_cached(index, low, "humSP")?;
        let high = self.integer_or_cached(index, high, "dehumSP")?;
        let data = protocol::humidity_data(low, high);
        self.make_request(index, data, "set humidity level").await
    }

    pub async fn set_thermostat_schedule(
        &mut self,
        index: usize,
        part: SchedulePart,
        entry: &ScheduleEntry,
    ) -> Result<Value> {
        let data = protocol::schedule_data(part, entry);
        self.make_request(index, data, "set thermostat schedule").await
    }

    // -- Helpers --

    fn email(&self) -> Result<&str> {
        self.credentials
            .email
            .as_deref()
            .ok_or(Error::MissingCredentials("email"))
    }

    fn find_device(&self, index: usize) -> Result<&Device> {
        self.devices.get(index).ok_or(Error::InvalidDevice(index))
    }

    fn cached_field(&self, index: usize, field: &str) -> Result<&Value> {
        let device = self.find_device(index)?;
        device.field(field).ok_or_else(|| Error::MissingField {
            device_id: device.id.clone(),
            field: field.to_string(),
        })
    }

    fn number_or_cached(&self, index: usize, value: Option<f64>, field: &str) -> Result<f64> {
        if let Some(v) = value {
            return Ok(v);
        }
        let cached = self.cached_field(index, field)?;
        cached.as_f64().ok_or_else(|| {
            Error::Protocol(format!("{field} is not a number: {cached}"))
        })
    }

    fn integer_or_cached(&self, index: usize, value: Option<u64>, field: &str) -> Result<u64> {
        if let Some(v) = value {
            return Ok(v);
        }
        let cached = self.cached_field(index, field)?;
        cached
            .as_u64()
            .or_else(|| cached.as_f64().map(|f| f.round() as u64))
            .ok_or_else(|| Error::Protocol(format!("{field} is not a number: {cached}")))
    }

    fn persist_tokens(&mut self) {
        if let Err(e) = self.store.save(&self.credentials.tokens_only()) {
            warn!("failed to persist tokens: {e}");
        }
    }

    async fn post_auth<T: DeserializeOwned>(&mut self, path: &str, body: &Value) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "auth request");

        if let Some(ref mut logger) = self.logger {
            logger.log_request("POST", path, None);
        }

        let resp = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .inspect_err(|e| {
                warn!("error connecting to Daikin Skyport, possible connectivity outage: {e}")
            })?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "auth request to {path} rejected");
            return Err(Error::Api {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Sends one authorized request, refreshing tokens and retrying at most once
    /// when the access token has expired. The retry reuses the same arguments.
    async fn authorized(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        let mut budget = MAX_AUTH_RETRIES;
        self.authorized_with_budget(method, path, body, &mut budget).await
    }

    /// Each refresh spends one unit of `budget`; an expired reply with nothing
    /// left is `Error::AuthExpired`.
    async fn authorized_with_budget(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        budget: &mut usize,
    ) -> Result<Value> {
        loop {
            match self.send_once(method.clone(), path, body).await? {
                Reply::Success(value) => return Ok(value),
                Reply::Expired if *budget > 0 => {
                    *budget -= 1;
                    debug!("authorization expired for {path}, refreshing tokens");
                    self.refresh_tokens().await?;
                }
                Reply::Expired => {
                    warn!("authorization still expired after refresh: {path}");
                    return Err(Error::AuthExpired);
                }
            }
        }
    }

    async fn send_once(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Reply> {
        let url = format!("{}{path}", self.base_url);
        trace!(method = %method, url = %url, "sending");

        if let Some(ref mut logger) = self.logger {
            logger.log_request(method.as_str(), path, body);
        }

        let token = self.credentials.access_token.as_deref().unwrap_or_default();
        let mut req = self
            .http
            .request(method, &url)
            .header(CONTENT_TYPE, DEVICE_CONTENT_TYPE)
            .bearer_auth(token);
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => {
                self.authenticated = false;
                warn!("error connecting to Daikin Skyport, possible connectivity outage: {e}");
                return Err(e.into());
            }
        };

        let status = resp.status();
        let text = resp.text().await?;

        if status.is_success() {
            self.authenticated = true;
            let value = if text.trim().is_empty() {
                Value::Null
            } else {
                serde_json::from_str(&text)?
            };
            trace!(status = status.as_u16(), body = %value, "response");
            if let Some(ref mut logger) = self.logger {
                logger.log_response(path, status.as_u16(), &value);
            }
            return Ok(Reply::Success(value));
        }

        self.authenticated = false;
        if protocol::is_auth_expired(status.as_u16(), &text) {
            return Ok(Reply::Expired);
        }
        warn!(status = status.as_u16(), body = %text, "request to {path} failed");
        Err(Error::Api {
            status: status.as_u16(),
            body: text,
        })
    }
}
