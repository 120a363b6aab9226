//! Logging and tracing initialization.

use crate::config::LoggingConfig;

/// Windowing and GL crates that log every frame at `info`/`debug`.
const NOISY_GUI_TARGETS: &[&str] = &["eframe", "egui_glow", "egui_winit", "winit", "wgpu_core"];

/// Build the `EnvFilter` directive string for a configured level.
///
/// The GUI stack is capped at `warn` unless the level already names a
/// target explicitly.
pub fn filter_directives(config: &LoggingConfig) -> String {
    let level = config.level.trim();
    if level.contains('=') {
        return level.to_string();
    }

    let mut directives = vec![level.to_string()];
    directives.extend(NOISY_GUI_TARGETS.iter().map(|target| format!("{target}=warn")));
    directives.join(",")
}

/// Initialize the tracing subscriber with the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level. Returns `false`
/// when a global subscriber was already installed.
pub fn init_logging(config: &LoggingConfig) -> bool {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));

    let installed = if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).is_ok()
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber).is_ok()
    };

    if installed {
        tracing::debug!(level = %config.level, json = config.json, "Logging initialized");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_level_caps_gui_targets() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            json: false,
        };
        let directives = filter_directives(&config);
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("eframe=warn"));
        assert!(directives.contains("winit=warn"));
    }

    #[test]
    fn test_explicit_directives_pass_through() {
        let config = LoggingConfig {
            level: "vidcrop_render_engine=trace,warn".to_string(),
            json: false,
        };
        assert_eq!(filter_directives(&config), "vidcrop_render_engine=trace,warn");
    }
}
