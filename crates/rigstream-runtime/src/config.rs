//! Runtime configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file is a valid
//! configuration that reproduces the legacy constants. Durations are written
//! in human form (`"40ms"`, `"2s"`).

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use rigstream_core::{RigError, RigResult, Vec3};
use rigstream_map::{
    GazeConfig, JawCalibration, ResponseCurve, GAZE_DISTANCE, JAW_LEFT_DEGREES, JAW_RIGHT_DEGREES,
};
use rigstream_track::{GrabConfig, GrabMode, SelectionStrategy};
use rigstream_transport::{
    BodyTrackerConfig, HandProtocol, UdpConfig, WebSocketConfig, DEFAULT_RECV_TIMEOUT,
    FACE_RECV_BUFFER, FACE_UDP_PORT, HAND_SERVICE_URL, HAND_UDP_PORT,
};
use rigstream_wire::{
    ChannelLayout, TrackingStateDecoder, UserPosition, VersionPolicy, BODY_LOCAL_PORT,
    BODY_SERVER_PORT,
};

use crate::LogFormat;

fn de_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(&s).map_err(serde::de::Error::custom)
}

fn default_true() -> bool { true }
fn default_false() -> bool { false }
fn default_tick_interval() -> Duration { Duration::from_millis(40) }
fn default_recv_timeout() -> Duration { DEFAULT_RECV_TIMEOUT }

fn default_face_bind() -> SocketAddr { SocketAddr::from(([0, 0, 0, 0], FACE_UDP_PORT)) }
fn default_recv_buffer() -> usize { FACE_RECV_BUFFER }
fn default_layout() -> String { ChannelLayout::Studio2014.key().to_string() }
fn default_gaze_distance() -> f32 { GAZE_DISTANCE }
fn default_jaw_left() -> f32 { JAW_LEFT_DEGREES }
fn default_jaw_right() -> f32 { JAW_RIGHT_DEGREES }

fn default_hand_bind() -> SocketAddr { SocketAddr::from(([0, 0, 0, 0], HAND_UDP_PORT)) }
fn default_hand_url() -> String { HAND_SERVICE_URL.to_string() }
fn default_connect_timeout() -> Duration { Duration::from_secs(5) }

fn default_body_local_port() -> u16 { BODY_LOCAL_PORT }
fn default_body_server_port() -> u16 { BODY_SERVER_PORT }
fn default_broadcast() -> Ipv4Addr { Ipv4Addr::BROADCAST }
fn default_user_position() -> String { UserPosition::ClosestToCenter.as_str().to_string() }
fn default_discovery_interval() -> Duration { Duration::from_secs(1) }

fn default_edit_on() -> Duration { Duration::from_millis(500) }
fn default_edit_off() -> Duration { Duration::from_secs(1) }
fn default_stability_threshold() -> f32 { 10.0 }
fn default_max_fingers() -> usize { 2 }
fn default_drop_radius() -> f32 { 50.0 }
fn default_fast_movement_speed() -> f32 { 1000.0 }
fn default_fast_movement_lookback() -> Duration { Duration::from_millis(100) }
fn default_carriage_total_lookback() -> Duration { Duration::from_millis(400) }
fn default_carriage_change_lookback() -> Duration { Duration::from_millis(200) }
fn default_carriage_min_back_speed() -> f32 { 100.0 }

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// Period of the assembly cycle
    #[serde(default = "default_tick_interval", deserialize_with = "de_duration")]
    pub tick_interval: Duration,
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default)]
    pub face: FaceSourceConfig,
    #[serde(default)]
    pub hand: HandSourceConfig,
    #[serde(default)]
    pub body: BodySourceConfig,
    #[serde(default)]
    pub grab: GrabSection,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            log_format: LogFormat::default(),
            face: FaceSourceConfig::default(),
            hand: HandSourceConfig::default(),
            body: BodySourceConfig::default(),
            grab: GrabSection::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> RigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| RigError::Config(format!("reading {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> RigResult<Self> {
        let config: RuntimeConfig =
            toml::from_str(content).map_err(|e| RigError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot be used
    pub fn validate(&self) -> RigResult<()> {
        if self.tick_interval.is_zero() {
            return Err(RigError::Config("tick_interval must be positive".into()));
        }
        self.face.layout()?;
        self.body.user_position()?;
        if let ResponseCurve::SignedLog { base } = self.face.response_curve {
            if base.is_nan() || base <= 1.0 {
                return Err(RigError::Config(format!(
                    "response curve log base must be above 1, got {}",
                    base
                )));
            }
        }
        Ok(())
    }
}

/// Config-file spelling of `VersionPolicy`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionPolicyName {
    #[default]
    Lenient,
    Strict,
}

impl From<VersionPolicyName> for VersionPolicy {
    fn from(name: VersionPolicyName) -> Self {
        match name {
            VersionPolicyName::Lenient => VersionPolicy::Lenient,
            VersionPolicyName::Strict => VersionPolicy::Strict,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FaceSourceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_face_bind")]
    pub bind: SocketAddr,
    #[serde(default = "default_recv_timeout", deserialize_with = "de_duration")]
    pub recv_timeout: Duration,
    /// SO_RCVBUF in bytes
    #[serde(default = "default_recv_buffer")]
    pub recv_buffer: usize,
    /// Channel layout key, `studio-2014` or `studio-2014-custom`
    #[serde(default = "default_layout")]
    pub layout: String,
    #[serde(default)]
    pub version_policy: VersionPolicyName,
    #[serde(default)]
    pub response_curve: ResponseCurve,
    #[serde(default = "default_gaze_distance")]
    pub gaze_distance: f32,
    #[serde(default)]
    pub eye_origin: [f32; 3],
    #[serde(default = "default_jaw_left")]
    pub jaw_left_degrees: f32,
    #[serde(default = "default_jaw_right")]
    pub jaw_right_degrees: f32,
}

impl Default for FaceSourceConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            bind: default_face_bind(),
            recv_timeout: default_recv_timeout(),
            recv_buffer: default_recv_buffer(),
            layout: default_layout(),
            version_policy: VersionPolicyName::default(),
            response_curve: ResponseCurve::default(),
            gaze_distance: default_gaze_distance(),
            eye_origin: [0.0; 3],
            jaw_left_degrees: default_jaw_left(),
            jaw_right_degrees: default_jaw_right(),
        }
    }
}

impl FaceSourceConfig {
    pub fn layout(&self) -> RigResult<ChannelLayout> {
        ChannelLayout::from_key(&self.layout)
            .ok_or_else(|| RigError::Config(format!("unknown channel layout '{}'", self.layout)))
    }

    pub fn decoder(&self) -> RigResult<TrackingStateDecoder> {
        Ok(TrackingStateDecoder::new(self.layout()?).with_policy(self.version_policy.into()))
    }

    pub fn udp_config(&self) -> UdpConfig {
        UdpConfig {
            recv_buffer_size: Some(self.recv_buffer),
            ..UdpConfig::face_tracker().with_bind_addr(self.bind)
        }
    }

    pub fn gaze(&self) -> GazeConfig {
        GazeConfig {
            distance: self.gaze_distance,
            eye_origin: Vec3::from_array(self.eye_origin),
        }
    }

    pub fn jaw(&self) -> JawCalibration {
        JawCalibration {
            left_degrees: self.jaw_left_degrees,
            right_degrees: self.jaw_right_degrees,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandTransportKind {
    /// Datagrams from a forwarder
    #[default]
    Udp,
    /// Direct connection to the tracker service
    Websocket,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandProtocolName {
    #[default]
    V1,
    V2,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyName {
    #[default]
    FirstAvailable,
    NearestToPrevious,
}

impl From<StrategyName> for SelectionStrategy {
    fn from(name: StrategyName) -> Self {
        match name {
            StrategyName::FirstAvailable => SelectionStrategy::FirstAvailable,
            StrategyName::NearestToPrevious => SelectionStrategy::NearestToPrevious,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandSourceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub transport: HandTransportKind,
    #[serde(default = "default_hand_bind")]
    pub bind: SocketAddr,
    #[serde(default = "default_hand_url")]
    pub url: String,
    #[serde(default)]
    pub protocol: HandProtocolName,
    #[serde(default = "default_connect_timeout", deserialize_with = "de_duration")]
    pub connect_timeout: Duration,
    #[serde(default = "default_recv_timeout", deserialize_with = "de_duration")]
    pub recv_timeout: Duration,
    #[serde(default)]
    pub strategy: StrategyName,
}

impl Default for HandSourceConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            transport: HandTransportKind::default(),
            bind: default_hand_bind(),
            url: default_hand_url(),
            protocol: HandProtocolName::default(),
            connect_timeout: default_connect_timeout(),
            recv_timeout: default_recv_timeout(),
            strategy: StrategyName::default(),
        }
    }
}

impl HandSourceConfig {
    pub fn udp_config(&self) -> UdpConfig {
        UdpConfig::hand_tracker().with_bind_addr(self.bind)
    }

    pub fn websocket_config(&self) -> WebSocketConfig {
        WebSocketConfig {
            url: self.url.clone(),
            protocol: match self.protocol {
                HandProtocolName::V1 => HandProtocol::V1,
                HandProtocolName::V2 => HandProtocol::V2,
            },
            connect_timeout: self.connect_timeout,
        }
    }

    pub fn strategy(&self) -> SelectionStrategy {
        self.strategy.into()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BodySourceConfig {
    #[serde(default = "default_false")]
    pub enabled: bool,
    #[serde(default = "default_body_local_port")]
    pub local_port: u16,
    #[serde(default = "default_body_server_port")]
    pub server_port: u16,
    #[serde(default = "default_broadcast")]
    pub broadcast: Ipv4Addr,
    /// `CLOSEST_TO_CENTER`, `FIRST_LEFT_FROM_CENTER` or `FIRST_RIGHT_FROM_CENTER`
    #[serde(default = "default_user_position")]
    pub user_position: String,
    /// Pause between discovery broadcasts until the server answers
    #[serde(default = "default_discovery_interval", deserialize_with = "de_duration")]
    pub discovery_interval: Duration,
    #[serde(default = "default_recv_timeout", deserialize_with = "de_duration")]
    pub recv_timeout: Duration,
}

impl Default for BodySourceConfig {
    fn default() -> Self {
        Self {
            enabled: default_false(),
            local_port: default_body_local_port(),
            server_port: default_body_server_port(),
            broadcast: default_broadcast(),
            user_position: default_user_position(),
            discovery_interval: default_discovery_interval(),
            recv_timeout: default_recv_timeout(),
        }
    }
}

impl BodySourceConfig {
    pub fn user_position(&self) -> RigResult<UserPosition> {
        UserPosition::parse(&self.user_position).ok_or_else(|| {
            RigError::Config(format!("unknown user position '{}'", self.user_position))
        })
    }

    pub fn tracker_config(&self) -> BodyTrackerConfig {
        BodyTrackerConfig {
            listen: UdpConfig::body_listener()
                .with_bind_addr(SocketAddr::from(([0, 0, 0, 0], self.local_port))),
            discovery_addr: SocketAddr::new(IpAddr::V4(self.broadcast), self.server_port),
            recv_timeout: self.recv_timeout,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrabModeName {
    #[default]
    Timed,
    Finger,
}

/// Grab thresholds; distances in mm
#[derive(Debug, Clone, Deserialize)]
pub struct GrabSection {
    #[serde(default)]
    pub mode: GrabModeName,
    #[serde(default = "default_edit_on", deserialize_with = "de_duration")]
    pub edit_on: Duration,
    #[serde(default = "default_edit_off", deserialize_with = "de_duration")]
    pub edit_off: Duration,
    #[serde(default = "default_stability_threshold")]
    pub stability_threshold: f32,
    #[serde(default = "default_max_fingers")]
    pub max_fingers: usize,
    #[serde(default = "default_drop_radius")]
    pub drop_radius: f32,
    /// mm/s
    #[serde(default = "default_fast_movement_speed")]
    pub fast_movement_speed: f32,
    #[serde(default = "default_fast_movement_lookback", deserialize_with = "de_duration")]
    pub fast_movement_lookback: Duration,
    #[serde(default = "default_carriage_total_lookback", deserialize_with = "de_duration")]
    pub carriage_total_lookback: Duration,
    #[serde(default = "default_carriage_change_lookback", deserialize_with = "de_duration")]
    pub carriage_change_lookback: Duration,
    /// mm/s
    #[serde(default = "default_carriage_min_back_speed")]
    pub carriage_min_back_speed: f32,
}

impl Default for GrabSection {
    fn default() -> Self {
        Self {
            mode: GrabModeName::default(),
            edit_on: default_edit_on(),
            edit_off: default_edit_off(),
            stability_threshold: default_stability_threshold(),
            max_fingers: default_max_fingers(),
            drop_radius: default_drop_radius(),
            fast_movement_speed: default_fast_movement_speed(),
            fast_movement_lookback: default_fast_movement_lookback(),
            carriage_total_lookback: default_carriage_total_lookback(),
            carriage_change_lookback: default_carriage_change_lookback(),
            carriage_min_back_speed: default_carriage_min_back_speed(),
        }
    }
}

impl GrabSection {
    pub fn to_grab_config(&self) -> GrabConfig {
        GrabConfig {
            mode: match self.mode {
                GrabModeName::Timed => GrabMode::Timed,
                GrabModeName::Finger => GrabMode::Finger,
            },
            edit_on_secs: self.edit_on.as_secs_f64(),
            edit_off_secs: self.edit_off.as_secs_f64(),
            stability_threshold: self.stability_threshold,
            max_fingers: self.max_fingers,
            drop_radius: self.drop_radius,
            fast_movement_speed: self.fast_movement_speed,
            fast_movement_lookback: self.fast_movement_lookback.as_secs_f64(),
            carriage_total_lookback: self.carriage_total_lookback.as_secs_f64(),
            carriage_change_lookback: self.carriage_change_lookback.as_secs_f64(),
            carriage_min_back_speed: self.carriage_min_back_speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_matches_legacy_constants() {
        let config = RuntimeConfig::from_toml_str("").unwrap();
        assert_eq!(config.tick_interval, Duration::from_millis(40));
        assert!(config.face.enabled);
        assert_eq!(config.face.bind.port(), 33433);
        assert_eq!(config.face.recv_timeout, Duration::from_millis(100));
        assert_eq!(config.face.udp_config().recv_buffer_size, Some(1500));
        assert_eq!(config.face.layout().unwrap(), ChannelLayout::Studio2014);
        assert_eq!(config.face.response_curve, ResponseCurve::Linear);
        assert_eq!(config.face.gaze().distance, 6.0);
        assert_eq!(config.hand.bind.port(), 6437);
        assert_eq!(config.hand.strategy(), SelectionStrategy::FirstAvailable);
        assert!(!config.body.enabled);
        assert_eq!(config.body.user_position().unwrap(), UserPosition::ClosestToCenter);
        assert_eq!(config.grab.to_grab_config(), GrabConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            tick_interval = "25ms"
            log_format = "json"

            [face]
            bind = "127.0.0.1:40000"
            layout = "studio-2014-custom"
            version_policy = "strict"
            response_curve = { kind = "signed-log", base = 3.5 }
            eye_origin = [0.1, 0.2, 0.3]

            [hand]
            transport = "websocket"
            protocol = "v2"
            strategy = "nearest-to-previous"

            [body]
            enabled = true
            user_position = "FIRST_LEFT_FROM_CENTER"
            discovery_interval = "2s"

            [grab]
            mode = "finger"
            edit_on = "750ms"
            max_fingers = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.tick_interval, Duration::from_millis(25));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.face.bind, "127.0.0.1:40000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.face.layout().unwrap(), ChannelLayout::Studio2014Custom);
        assert_eq!(config.face.decoder().unwrap().layout(), ChannelLayout::Studio2014Custom);
        assert_eq!(config.face.response_curve, ResponseCurve::signed_log());
        assert_eq!(config.face.gaze().eye_origin, Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(config.hand.transport, HandTransportKind::Websocket);
        assert!(config.hand.websocket_config().endpoint().ends_with("/v6.json"));
        assert_eq!(config.hand.strategy(), SelectionStrategy::NearestToPrevious);
        assert_eq!(config.body.user_position().unwrap(), UserPosition::FirstLeftFromCenter);
        assert_eq!(config.body.discovery_interval, Duration::from_secs(2));
        assert_eq!(config.body.tracker_config().discovery_addr.port(), 10750);

        let grab = config.grab.to_grab_config();
        assert_eq!(grab.mode, GrabMode::Finger);
        assert_eq!(grab.edit_on_secs, 0.75);
        assert_eq!(grab.max_fingers, 1);
        assert_eq!(grab.edit_off_secs, 1.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(RuntimeConfig::from_toml_str("tick_interval = \"soon\"").is_err());
        assert!(RuntimeConfig::from_toml_str("tick_interval = \"0s\"").is_err());
        assert!(RuntimeConfig::from_toml_str("[face]\nlayout = \"studio-1999\"").is_err());
        assert!(RuntimeConfig::from_toml_str("[body]\nuser_position = \"BEHIND\"").is_err());
        let err = RuntimeConfig::from_toml_str(
            "[face]\nresponse_curve = { kind = \"signed-log\", base = 1.0 }",
        )
        .unwrap_err();
        assert!(matches!(err, RigError::Config(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = RuntimeConfig::load("/nonexistent/rigstream.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rigstream.toml"));
    }
}
