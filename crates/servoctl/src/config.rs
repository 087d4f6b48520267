use config_rs::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use servoctl_core::{esc::EscConfig, servo::ServoRange};

///Which `Board` to drive.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub enum Backend {
    #[default]
    Sim,
    Rpi,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServoChannelConfig {
    pub pin: u8,
    pub range: ServoRange,
}

impl Default for ServoChannelConfig {
    fn default() -> Self {
        Self { pin: 18, range: ServoRange::default() }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EscChannelConfig {
    pub pwm_pin: u8,
    //gpio switching the relay that replaces the ESC power button
    pub power_pin: u8,
    pub throttle: EscConfig,
}

impl Default for EscChannelConfig {
    fn default() -> Self {
        Self {
            pwm_pin: 13,
            power_pin: 23,
            throttle: EscConfig::default(),
        }
    }
}

///Test routines run by the commands.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SequenceConfig {
    pub sweep_angles: Vec<f64>,
    pub sweep_delay_ms: u64,
    //keep sweeping until interrupted
    pub sweep_repeat: bool,
    pub prompt_sentinel: i64,
    pub prompt_settle_ms: u64,
    //calibrate before the throttle test, otherwise do a normal start
    pub calibrate: bool,
    pub throttle_vector: Vec<f64>,
    pub throttle_delay_ms: u64,
    pub relay_period_ms: u64,
    //0 toggles until interrupted
    pub relay_cycles: u32,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            sweep_angles: vec![90.0, 0.0, 180.0],
            sweep_delay_ms: 1000,
            sweep_repeat: false,
            prompt_sentinel: -1,
            prompt_settle_ms: 1000,
            calibrate: true,
            throttle_vector: vec![1.0, 2.0, 3.0, 0.0, -1.0, -2.0, -3.0, 0.0],
            throttle_delay_ms: 2000,
            relay_period_ms: 2000,
            relay_cycles: 0,
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct ServoCtlConfig {
    pub backend: Backend,
    pub servo: ServoChannelConfig,
    pub esc: EscChannelConfig,
    pub sequence: SequenceConfig,
}

impl ServoCtlConfig {
    ///Loads the optional config file, then applies `SERVOCTL__*` environment overrides
    ///(e.g. `SERVOCTL__ESC__PWM_PIN=12`).
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        let builder = builder.add_source(
            Environment::with_prefix("SERVOCTL")
                .separator("__")
                .try_parsing(true),
        );
        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build().and_then(|config| config.try_deserialize::<ServoCtlConfig>())
    }
}
