//! Instrumentation switch.
//!
//! Whether the attachment points wrap a source or hand it back untouched is
//! decided once per process. The default comes from the `trace` cargo
//! feature; the `TIMED_QUERY_INSTRUMENTATION` environment variable can
//! override it at startup. The value is cached on first use and never
//! changes while the process runs.

use std::sync::OnceLock;
use strum_macros::{Display, EnumString};
use tracing::{debug, warn};

/// Environment variable consulted by [`Instrumentation::from_env`].
pub const INSTRUMENTATION_ENV: &str = "TIMED_QUERY_INSTRUMENTATION";

/// Whether timing wrappers are attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Instrumentation {
    #[strum(to_string = "enabled", serialize = "on", serialize = "true", serialize = "1")]
    Enabled,
    #[strum(to_string = "disabled", serialize = "off", serialize = "false", serialize = "0")]
    Disabled,
}

static CURRENT: OnceLock<Instrumentation> = OnceLock::new();

impl Instrumentation {
    /// The build-time default: enabled when compiled with the `trace` feature.
    pub const fn compiled_default() -> Self {
        if cfg!(feature = "trace") {
            Instrumentation::Enabled
        } else {
            Instrumentation::Disabled
        }
    }

    /// Resolve from [`INSTRUMENTATION_ENV`], falling back to
    /// [`Instrumentation::compiled_default`].
    pub fn from_env() -> Self {
        Self::resolve(std::env::var(INSTRUMENTATION_ENV).ok().as_deref())
    }

    /// Resolve an optional override. Unrecognised values are logged and
    /// ignored.
    pub fn resolve(value: Option<&str>) -> Self {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::compiled_default();
        };
        match raw.parse::<Instrumentation>() {
            Ok(instrumentation) => instrumentation,
            Err(_) => {
                warn!(
                    event = "Config",
                    variable = INSTRUMENTATION_ENV,
                    value = raw,
                    "Unrecognised instrumentation setting, using the compiled default"
                );
                Self::compiled_default()
            }
        }
    }

    /// Process-wide setting, resolved from the environment on first call.
    pub fn current() -> Self {
        *CURRENT.get_or_init(|| {
            let instrumentation = Self::from_env();
            debug!(event = "Config", instrumentation = %instrumentation);
            instrumentation
        })
    }

    /// True for [`Instrumentation::Enabled`].
    pub fn is_enabled(self) -> bool {
        self == Instrumentation::Enabled
    }
}

impl Default for Instrumentation {
    fn default() -> Self {
        Self::compiled_default()
    }
}
