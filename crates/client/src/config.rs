//! Verbindungs-Konfiguration
//!
//! Kann direkt konstruiert, aus TOML geladen oder aus einer URI der Form
//! `serverquery://host:10011/?timeout=5&blocking=0&tls=1` gelesen werden.
//! Host und Port sind Pflicht, alle anderen Felder haben Standardwerte.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::error::{ClientError, ClientResult};

/// Standard-Port der ServerQuery-Schnittstelle
pub const STANDARD_PORT_SERVERQUERY: u16 = 10011;
/// Standard-Port des Dateitransfers
pub const STANDARD_PORT_FILETRANSFER: u16 = 30033;

fn standard_timeout() -> u64 {
    10
}

fn standard_blocking() -> bool {
    true
}

/// Art des zugrundeliegenden Sockets
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportArt {
    #[default]
    Tcp,
    Udp,
}

/// Konfiguration einer einzelnen Verbindung
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbindungsKonfig {
    /// Hostname, IPv4- oder IPv6-Adresse (ohne Klammern)
    pub host: String,
    pub port: u16,
    /// Socket-Zeitlimit in Sekunden
    #[serde(default = "standard_timeout")]
    pub timeout: u64,
    /// `false` aktiviert den nicht-blockierenden Modus (noetig fuer `wait()`)
    #[serde(default = "standard_blocking")]
    pub blocking: bool,
    /// TLS ueber TCP aushandeln
    #[serde(default)]
    pub tls: bool,
    /// Zusaetzliche CA-Zertifikate (PEM) fuer selbstsignierte Server
    #[serde(default)]
    pub tls_ca_datei: Option<String>,
    #[serde(default)]
    pub transport: TransportArt,
    /// Zusaetzlich akzeptierte Protokollkennung (neben `TS3` und `TeaSpeak`)
    #[serde(default)]
    pub protokoll_kennung: Option<String>,
    /// Zusaetzlicher Praefix fuer zu verwerfende Begruessungszeilen
    #[serde(default)]
    pub motd_praefix: Option<String>,
}

impl VerbindungsKonfig {
    /// Erstellt eine Konfiguration mit Standardwerten
    pub fn neu(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: standard_timeout(),
            blocking: standard_blocking(),
            tls: false,
            tls_ca_datei: None,
            transport: TransportArt::Tcp,
            protokoll_kennung: None,
            motd_praefix: None,
        }
    }

    /// Prueft die Pflichtfelder
    pub fn validieren(&self) -> ClientResult<()> {
        if self.host.trim().is_empty() {
            return Err(ClientError::Konfiguration("Host fehlt".into()));
        }
        if self.port == 0 {
            return Err(ClientError::Konfiguration("Port fehlt".into()));
        }
        if self.timeout == 0 {
            return Err(ClientError::Konfiguration(
                "Zeitlimit muss mindestens 1 Sekunde betragen".into(),
            ));
        }
        if self.tls && self.transport == TransportArt::Udp {
            return Err(ClientError::Konfiguration(
                "TLS ist nur ueber TCP moeglich".into(),
            ));
        }
        Ok(())
    }

    /// Socket-Adresse; IPv6-Literale werden geklammert
    pub fn adresse(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn timeout_dauer(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Parst eine TOML-Konfiguration
    pub fn from_toml_str(inhalt: &str) -> ClientResult<Self> {
        let konfig: Self = toml::from_str(inhalt)
            .map_err(|e| ClientError::Konfiguration(format!("Ungueltiges TOML: {e}")))?;
        konfig.validieren()?;
        Ok(konfig)
    }

    /// Laedt die Konfiguration aus einer TOML-Datei
    pub fn laden(pfad: &str) -> ClientResult<Self> {
        let inhalt = std::fs::read_to_string(pfad).map_err(|e| {
            ClientError::Konfiguration(format!("Konfigurationsdatei '{pfad}' nicht lesbar: {e}"))
        })?;
        Self::from_toml_str(&inhalt)
    }

    /// Parst eine URI (`serverquery://` oder `filetransfer://`)
    ///
    /// Unterstuetzte Query-Parameter: `timeout`, `blocking`, `tls`, `tls_ca`,
    /// `udp`, `proto_ident`, `motd_prefix`. Unbekannte Parameter werden ignoriert.
    pub fn from_uri(uri: &str) -> ClientResult<Self> {
        let url = Url::parse(uri)
            .map_err(|e| ClientError::Konfiguration(format!("Ungueltige URI '{uri}': {e}")))?;

        let standard_port = match url.scheme() {
            "serverquery" => STANDARD_PORT_SERVERQUERY,
            "filetransfer" => STANDARD_PORT_FILETRANSFER,
            other => {
                return Err(ClientError::Konfiguration(format!(
                    "Unbekanntes URI-Schema '{other}'"
                )))
            }
        };

        let host = match url.host() {
            Some(Host::Ipv6(adresse)) => adresse.to_string(),
            Some(Host::Ipv4(adresse)) => adresse.to_string(),
            Some(Host::Domain(name)) => name.trim_matches(['[', ']']).to_string(),
            None => return Err(ClientError::Konfiguration(format!("Host fehlt in '{uri}'"))),
        };

        let mut konfig = Self::neu(host, url.port().unwrap_or(standard_port));

        for (schluessel, wert) in url.query_pairs() {
            match schluessel.as_ref() {
                "timeout" => {
                    konfig.timeout = wert.parse().map_err(|_| {
                        ClientError::Konfiguration(format!("Ungueltiges Zeitlimit: {wert}"))
                    })?;
                }
                "blocking" => konfig.blocking = ist_gesetzt(&wert),
                "tls" => konfig.tls = ist_gesetzt(&wert),
                "tls_ca" => konfig.tls_ca_datei = Some(wert.into_owned()),
                "udp" if ist_gesetzt(&wert) => konfig.transport = TransportArt::Udp,
                "proto_ident" => konfig.protokoll_kennung = Some(wert.into_owned()),
                "motd_prefix" => konfig.motd_praefix = Some(wert.into_owned()),
                andere => tracing::debug!(parameter = andere, "URI-Parameter ignoriert"),
            }
        }

        konfig.validieren()?;
        Ok(konfig)
    }
}

fn ist_gesetzt(wert: &str) -> bool {
    matches!(wert, "1" | "true" | "yes" | "on")
}

/// Serialisierbarer Zustand einer Verbindung fuer spaeteres Wiederverbinden
///
/// Enthaelt nur die Konfiguration; offene Sockets werden nie serialisiert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KonfigSnapshot {
    pub konfig: VerbindungsKonfig,
    pub erstellt: DateTime<Utc>,
}

impl KonfigSnapshot {
    pub fn neu(konfig: VerbindungsKonfig) -> Self {
        Self {
            konfig,
            erstellt: Utc::now(),
        }
    }

    pub fn to_json(&self) -> ClientResult<String> {
        serde_json::to_string(self)
            .map_err(|e| ClientError::Konfiguration(format!("Snapshot nicht serialisierbar: {e}")))
    }

    pub fn from_json(json: &str) -> ClientResult<Self> {
        let snapshot: Self = serde_json::from_str(json)
            .map_err(|e| ClientError::Konfiguration(format!("Ungueltiger Snapshot: {e}")))?;
        snapshot.konfig.validieren()?;
        Ok(snapshot)
    }
}
