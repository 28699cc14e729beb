//! Studio configuration.
//!
//! Values come from command-line flags or the environment:
//!
//! | Flag                     | Environment                    | Default                 |
//! |--------------------------|--------------------------------|-------------------------|
//! | `--api-url`              | `TEMPLATE_API_URL`             | `http://localhost:3001` |
//! | `--export-scale`         | `TEMPLATE_EXPORT_SCALE`        | `2`                     |
//! | `--request-timeout-secs` | `TEMPLATE_REQUEST_TIMEOUT_SECS`| `10`                    |

use std::time::Duration;

use clap::Args;
use template_renderer::ExportConfig;

use crate::remote::DEFAULT_API_URL;

/// Configuration shared by every studio command.
#[derive(Debug, Clone, PartialEq, Args)]
pub struct StudioConfig {
    /// Base URL of the remote template store.
    #[arg(long, env = "TEMPLATE_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Device pixel ratio used when rasterizing pages.
    #[arg(long, env = "TEMPLATE_EXPORT_SCALE", default_value_t = 2.0, global = true)]
    pub export_scale: f32,

    /// Timeout for remote requests, in seconds.
    #[arg(long, env = "TEMPLATE_REQUEST_TIMEOUT_SECS", default_value_t = 10, global = true)]
    pub request_timeout_secs: u64,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            export_scale: 2.0,
            request_timeout_secs: 10,
        }
    }
}

impl StudioConfig {
    /// Export settings for this configuration.
    ///
    /// Non-positive or non-finite scales fall back to the default.
    #[must_use]
    pub fn export_config(&self) -> ExportConfig {
        let defaults = ExportConfig::default();
        let scale = if self.export_scale.is_finite() && self.export_scale > 0.0 {
            self.export_scale
        } else {
            tracing::warn!(scale = self.export_scale, "Ignoring invalid export scale");
            defaults.scale
        };
        ExportConfig { scale, ..defaults }
    }

    /// Timeout for remote requests.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
