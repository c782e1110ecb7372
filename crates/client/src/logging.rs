//! Logging-Setup via tracing-subscriber
//!
//! Der Client selbst protokolliert nur ueber `tracing`. Anwendungen ohne
//! eigenes Setup koennen hier einen Subscriber installieren.
//!
//! Konfigurierbar per Umgebungsvariable (hat Vorrang vor den Argumenten):
//! - `TS3QUERY_LOG_LEVEL`: einfacher Level (trace/debug/info/warn/error) oder EnvFilter-Syntax
//! - `TS3QUERY_LOG_FORMAT`: Format (text/json), Standard: text
//!
//! Ein einfacher Level gilt nur fuer die Crates dieses Clients, alle anderen
//! Targets bleiben auf `warn`. Wire-Verkehr erscheint auf `trace`,
//! Verbindungsaufbau und -abbau auf `info`.

use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "TS3QUERY_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "TS3QUERY_LOG_FORMAT";

/// Targets, auf die sich ein einfacher Level bezieht
const EIGENE_TARGETS: [&str; 2] = ["ts3query_client", "ts3query_protocol"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Unbekannte Werte fallen auf `Text` zurueck
    pub fn parsen(format: &str) -> Self {
        match format {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Initialisiert das Logging-System.
///
/// Gibt `false` zurueck, wenn bereits ein globaler Subscriber gesetzt war.
pub fn logging_initialisieren(level: &str, format: &str) -> bool {
    let level = log_level_aus_env().unwrap_or_else(|| level.to_string());
    let format = log_format_aus_env().unwrap_or_else(|| format.to_string());
    let filter = filter_erstellen(&level);

    let ergebnis = match LogFormat::parsen(&format) {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => fmt().with_env_filter(filter).with_target(true).try_init(),
    };
    ergebnis.is_ok()
}

/// Baut den Filter; ungueltige Direktiven fallen auf `info` zurueck
pub fn filter_erstellen(level: &str) -> EnvFilter {
    if log_level_gueltig(level) {
        let direktiven = EIGENE_TARGETS
            .iter()
            .map(|target| format!("{target}={level}"))
            .fold(String::from("warn"), |acc, d| acc + "," + &d);
        return EnvFilter::new(direktiven);
    }
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn log_level_aus_env() -> Option<String> {
    std::env::var(ENV_LOG_LEVEL).ok().filter(|l| !l.is_empty())
}

fn log_format_aus_env() -> Option<String> {
    std::env::var(ENV_LOG_FORMAT).ok().filter(|f| !f.is_empty())
}

fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}
