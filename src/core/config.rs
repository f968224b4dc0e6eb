use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

/// Settings the host page publishes as `window.appSettings`.
///
/// Read once at startup; every field has a default so a bare page still
/// boots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    /// Absolute origin of the backend. Empty means the page's own origin.
    pub api_base: String,
    pub date_time_format: String,
    pub date_format: String,
    pub utc_offset_minutes: i32,
    pub toast_duration_ms: u32,
    /// Zero disables the watchdog.
    pub request_timeout_ms: u32,
    pub log_level: String,
    /// Named route templates overriding the built-in table.
    pub routes: HashMap<String, String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            date_time_format: "%Y-%m-%d %H:%M".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            utc_offset_minutes: 0,
            toast_duration_ms: 4000,
            request_timeout_ms: 15_000,
            log_level: "info".to_string(),
            routes: HashMap::new(),
        }
    }
}

/// Reads `window.appSettings`, falling back to defaults, and fills in the
/// API origin from `window.location` when the page did not set one.
pub fn load_app_settings() -> AppSettings {
    let Some(window) = web_sys::window() else {
        return AppSettings::default();
    };

    let raw = js_sys::Reflect::get(&window, &JsValue::from_str("appSettings")).unwrap_or(JsValue::UNDEFINED);
    let mut settings = if raw.is_undefined() || raw.is_null() {
        AppSettings::default()
    } else {
        match serde_wasm_bindgen::from_value::<AppSettings>(raw) {
            Ok(settings) => settings,
            Err(e) => {
                web_sys::console::error_1(&format!("Ignoring malformed appSettings: {}", e).into());
                AppSettings::default()
            }
        }
    };

    if settings.api_base.is_empty() {
        if let Ok(origin) = window.location().origin() {
            settings.api_base = origin;
        }
    }
    settings
}
