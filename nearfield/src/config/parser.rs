//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::geo::GeoPoint;
use crate::repository::{MAX_CENTER_PRECISION, MAX_PAGE_LIMIT, MAX_RADIUS_M};

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [api] section
    if let Some(section) = ini.section(Some("api")) {
        if let Some(v) = section.get("base_url") {
            let v = v.trim().trim_end_matches('/');
            if !v.starts_with("http://") && !v.starts_with("https://") {
                return Err(invalid(
                    "api",
                    "base_url",
                    v,
                    "must start with http:// or https://",
                ));
            }
            config.api.base_url = v.to_string();
        }
        if let Some(v) = section.get("timeout_secs") {
            config.api.timeout_secs = parse_positive(v, "api", "timeout_secs")?;
        }
        if let Some(v) = section.get("token") {
            let v = v.trim();
            if !v.is_empty() {
                config.api.token = Some(v.to_string());
            }
        }
    }

    // [query] section
    if let Some(section) = ini.section(Some("query")) {
        if let Some(v) = section.get("default_radius_m") {
            let radius: u32 = parse_positive(v, "query", "default_radius_m")?;
            if radius > MAX_RADIUS_M {
                return Err(invalid(
                    "query",
                    "default_radius_m",
                    v,
                    &format!("must be at most {}", MAX_RADIUS_M),
                ));
            }
            config.query.default_radius_m = radius;
        }
        if let Some(v) = section.get("page_limit") {
            let limit: u32 = parse_positive(v, "query", "page_limit")?;
            if limit > MAX_PAGE_LIMIT {
                return Err(invalid(
                    "query",
                    "page_limit",
                    v,
                    &format!("must be at most {}", MAX_PAGE_LIMIT),
                ));
            }
            config.query.page_limit = limit;
        }
        if let Some(v) = section.get("center_precision") {
            let precision: u8 = parse_value(v, "query", "center_precision", "must be an integer")?;
            if precision > MAX_CENTER_PRECISION {
                return Err(invalid(
                    "query",
                    "center_precision",
                    v,
                    &format!("must be between 0 and {}", MAX_CENTER_PRECISION),
                ));
            }
            config.query.center_precision = precision;
        }
    }

    // [scheduler] section
    if let Some(section) = ini.section(Some("scheduler")) {
        if let Some(v) = section.get("recency_window_secs") {
            config.scheduler.recency_window_secs = parse_value(
                v,
                "scheduler",
                "recency_window_secs",
                "must be a non-negative integer (seconds)",
            )?;
        }
    }

    // [position] section
    if let Some(section) = ini.section(Some("position")) {
        if let Some(v) = section.get("accuracy") {
            config.position.accuracy = v
                .parse()
                .map_err(|reason: String| invalid("position", "accuracy", v, &reason))?;
        }
        if let Some(v) = section.get("timeout_secs") {
            config.position.timeout_secs = parse_positive(v, "position", "timeout_secs")?;
        }
        config.position.fallback = parse_fallback(section, config.position.fallback)?;
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

/// Overlay `fallback_lat` / `fallback_lon` onto the default coordinate.
fn parse_fallback(section: &Properties, default: GeoPoint) -> Result<GeoPoint, ConfigFileError> {
    let lat = match section.get("fallback_lat") {
        Some(v) => parse_value(v, "position", "fallback_lat", "must be a number")?,
        None => default.latitude(),
    };
    let lon = match section.get("fallback_lon") {
        Some(v) => parse_value(v, "position", "fallback_lon", "must be a number")?,
        None => default.longitude(),
    };

    GeoPoint::new(lat, lon).map_err(|e| ConfigFileError::InvalidValue {
        section: "position".to_string(),
        key: "fallback_lat/fallback_lon".to_string(),
        value: format!("{},{}", lat, lon),
        reason: e.to_string(),
    })
}

fn parse_value<T: FromStr>(
    value: &str,
    section: &str,
    key: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_positive<T>(value: &str, section: &str, key: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + Default + PartialEq,
{
    let parsed: T = parse_value(value, section, key, "must be a positive integer")?;
    if parsed == T::default() {
        return Err(invalid(section, key, value, "must be greater than zero"));
    }
    Ok(parsed)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::DesiredAccuracy;
    use tempfile::TempDir;

    fn load(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, content).unwrap();
        ConfigFile::load_from(&config_path)
    }

    #[test]
    fn test_partial_config() {
        let config = load(
            r#"
[api]
base_url = https://ar.example.com/api/v1/
token = secret

[scheduler]
recency_window_secs = 15
"#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://ar.example.com/api/v1");
        assert_eq!(config.api.token.as_deref(), Some("secret"));
        assert_eq!(config.scheduler.recency_window_secs, 15);
        // Untouched sections keep defaults
        assert_eq!(config.query.page_limit, crate::repository::DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn test_invalid_base_url() {
        let err = load("[api]\nbase_url = ftp://nope\n").unwrap_err();
        assert!(err.to_string().contains("api.base_url"));
    }

    #[test]
    fn test_radius_above_maximum() {
        let err = load("[query]\ndefault_radius_m = 9000\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigFileError::InvalidValue { ref key, .. } if key == "default_radius_m"
        ));
    }

    #[test]
    fn test_zero_page_limit_rejected() {
        let err = load("[query]\npage_limit = 0\n").unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn test_position_section() {
        let config = load(
            r#"
[position]
accuracy = balanced
timeout_secs = 5
fallback_lat = 40.7580
fallback_lon = -73.9855
"#,
        )
        .unwrap();

        assert_eq!(config.position.accuracy, DesiredAccuracy::Balanced);
        assert_eq!(config.position.timeout_secs, 5);
        assert_eq!(config.position.fallback.latitude(), 40.7580);
        assert_eq!(config.position.fallback.longitude(), -73.9855);
    }

    #[test]
    fn test_invalid_accuracy() {
        let err = load("[position]\naccuracy = perfect\n").unwrap_err();
        assert!(err.to_string().contains("high, balanced or low"));
    }

    #[test]
    fn test_out_of_range_fallback() {
        let err = load("[position]\nfallback_lat = 95.0\n").unwrap_err();
        assert!(err.to_string().contains("fallback_lat"));
    }

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("~/test/path");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path, home.join("test/path"));
        }

        let path = expand_tilde("/absolute/path");
        assert_eq!(path, PathBuf::from("/absolute/path"));
    }
}
