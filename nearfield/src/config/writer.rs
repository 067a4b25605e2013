//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let token = config.api.token.as_deref().unwrap_or("");

    format!(
        r#"[api]
; Root of the artifact API (GET <base_url>/artifacts/near)
base_url = {}
; Timeout in seconds for HTTP requests (default: 10)
timeout_secs = {}
; Bearer token sent with every request (leave empty for anonymous access)
token = {}

[query]
; Radius in meters used when none is given (default: 1000, max: 5000)
default_radius_m = {}
; Artifacts per page (default: 50, max: 100)
page_limit = {}
; Decimal places kept when keying a query center (default: 4, about 11 m)
center_precision = {}

[scheduler]
; Seconds a successful result answers an identical viewport settle.
; 0 means every settle fetches fresh data.
recency_window_secs = {}

[position]
; Requested accuracy: high, balanced or low
accuracy = {}
; Seconds to wait for a location reading before using the fallback
timeout_secs = {}
; Coordinate used when no reading arrives (default: Seattle Space Needle)
fallback_lat = {}
fallback_lon = {}

[logging]
; Log file path (default: ~/.nearfield/nearfield.log)
file = {}
"#,
        config.api.base_url,
        config.api.timeout_secs,
        token,
        config.query.default_radius_m,
        config.query.page_limit,
        config.query.center_precision,
        config.scheduler.recency_window_secs,
        config.position.accuracy.as_str(),
        config.position.timeout_secs,
        config.position.fallback.latitude(),
        config.position.fallback.longitude(),
        path_to_string(&config.logging.file),
    )
}

/// Render a path, abbreviating the home directory as `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
