//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（vocero.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::ops::RangeInclusive;
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["vocero", "vocero.local"];

/// 片段上限的允许范围
pub const MAX_CHARS_RANGE: RangeInclusive<usize> = 100..=500;

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `VOCERO_`，层级分隔符 `__`）
/// 2. 配置文件（vocero.toml 或 vocero.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `VOCERO_TTS__API_KEY=...`
/// - `VOCERO_FRAGMENT__MAX_CHARS=300`
/// - `VOCERO_RETRY__MAX_ATTEMPTS=5`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("tts.base_url", "https://api.elevenlabs.io")?
        .set_default("tts.api_key", "")?
        .set_default("tts.model_id", "eleven_multilingual_v2")?
        .set_default("tts.timeout_secs", 120)?
        .set_default("voice.stability", 0.52)?
        .set_default("voice.similarity", 0.82)?
        .set_default("voice.style", 0.0)?
        .set_default("voice.speaker_boost", true)?
        .set_default("fragment.max_chars", 220)?
        .set_default("retry.max_attempts", 3)?
        .set_default("retry.delay_ms", 1000)?
        .set_default("synthesis.concurrency", 1)?
        .set_default("output.dir", "output")?
        .set_default("output.archive_prefix", "audios_generados")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: VOCERO_TTS__API_KEY=xxx
    builder = builder.add_source(
        Environment::with_prefix("VOCERO")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

fn check_unit_range(name: &str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ValidationError(format!(
            "{} must be within 0.0..=1.0, got {}",
            name, value
        )));
    }
    Ok(())
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.tts.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS base URL cannot be empty".to_string(),
        ));
    }

    if !MAX_CHARS_RANGE.contains(&config.fragment.max_chars) {
        return Err(ConfigError::ValidationError(format!(
            "fragment.max_chars must be within {}..={}, got {}",
            MAX_CHARS_RANGE.start(),
            MAX_CHARS_RANGE.end(),
            config.fragment.max_chars
        )));
    }

    check_unit_range("voice.stability", config.voice.stability)?;
    check_unit_range("voice.similarity", config.voice.similarity)?;
    check_unit_range("voice.style", config.voice.style)?;

    if config.retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "retry.max_attempts must be at least 1".to_string(),
        ));
    }

    if config.synthesis.concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "synthesis.concurrency must be at least 1".to_string(),
        ));
    }

    if config.output.archive_prefix.contains(['/', '\\']) {
        return Err(ConfigError::ValidationError(
            "output.archive_prefix cannot contain path separators".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("TTS URL: {}", config.tts.base_url);
    tracing::info!("TTS API Key: {}", config.tts.redacted_api_key());
    tracing::info!("TTS Model: {}", config.tts.model_id);
    tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
    tracing::info!(
        "Voice: {} (stability={}, similarity={}, style={}, speaker_boost={})",
        config.voice.name.as_deref().unwrap_or("<first available>"),
        config.voice.stability,
        config.voice.similarity,
        config.voice.style,
        config.voice.speaker_boost
    );
    tracing::info!("Max Chars Per Fragment: {}", config.fragment.max_chars);
    tracing::info!(
        "Retry: {} attempts, {}ms delay",
        config.retry.max_attempts,
        config.retry.delay_ms
    );
    tracing::info!("Concurrency: {}", config.synthesis.concurrency);
    tracing::info!("Output Directory: {:?}", config.output.dir);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_max_chars_out_of_range() {
        for max_chars in [0, 99, 501] {
            let mut config = AppConfig::default();
            config.fragment.max_chars = max_chars;
            assert!(validate_config(&config).is_err(), "{} accepted", max_chars);
        }
        let mut config = AppConfig::default();
        config.fragment.max_chars = 500;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_voice_params() {
        let mut config = AppConfig::default();
        config.voice.similarity = 1.5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_attempts() {
        let mut config = AppConfig::default();
        config.retry.max_attempts = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_concurrency() {
        let mut config = AppConfig::default();
        config.synthesis.concurrency = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_tts_url() {
        let mut config = AppConfig::default();
        config.tts.base_url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[fragment]\nmax_chars = 300\n\n[voice]\nname = \"Rachel\"\nstability = 0.4\n\n[retry]\nmax_attempts = 5"
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.fragment.max_chars, 300);
        assert_eq!(config.voice.name.as_deref(), Some("Rachel"));
        assert!((config.voice.stability - 0.4).abs() < 1e-6);
        assert!((config.voice.similarity - 0.82).abs() < 1e-6);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.tts.model_id, "eleven_multilingual_v2");
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[fragment]\nmax_chars = 50").unwrap();

        let result = load_config_from_path(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
