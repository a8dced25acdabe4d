use std::fmt::Display;

/// Message meant for the person using the map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// Blocking message: the requested action did not happen.
    Alert(String),
    /// The action went through with degraded results.
    Warning(String),
}

impl Notice {
    pub fn location_not_found() -> Self {
        Self::Alert("Location not found! Please check the address and try again.".to_owned())
    }

    pub fn geocoding_failed() -> Self {
        Self::Alert(
            "Unsuccessful request to Nominatim. The location could not be geocoded.".to_owned(),
        )
    }

    pub fn fetch_failed(subtype: &str) -> Self {
        Self::Warning(format!(
            "Unsuccessful request to Overpass API ({subtype}). Data could not be downloaded."
        ))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Alert(msg) | Self::Warning(msg) => msg,
        }
    }
}

impl Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Alert(msg) => write!(f, "[alert] {msg}"),
            Self::Warning(msg) => write!(f, "[warning] {msg}"),
        }
    }
}

pub trait Notifier {
    fn notify(&self, notice: Notice);
}

/// Forwards notices to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Alert(msg) => log::error!("{msg}"),
            Notice::Warning(msg) => log::warn!("{msg}"),
        }
    }
}
