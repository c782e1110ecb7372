//! Fehlertypen fuer den ServerQuery-Client
//!
//! Die Varianten bilden die Fehler-Taxonomie ab: Transport, Protokoll,
//! ServerQuery (vom Server gemeldet), Signal, Dateitransfer, Konfiguration.

use thiserror::Error;
use ts3query_protocol::ProtocolError;

/// Result-Alias fuer alle Client-Operationen
pub type ClientResult<T> = Result<T, ClientError>;

/// Fehler-ID des Servers fuer fehlende Berechtigungen
pub const FEHLER_BERECHTIGUNG: u32 = 0xa08;
/// Fehler-ID fuer gesperrte bzw. unbekannte Befehle
pub const FEHLER_BEFEHL_UNBEKANNT: u32 = 0x100;

/// Oberkategorie eines Fehlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FehlerKategorie {
    Transport,
    Protokoll,
    ServerQuery,
    Signal,
    Transfer,
    Konfiguration,
}

/// Fehler auf dem Signal-Bus
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("Ungueltiger Signalname: '{0}'")]
    UngueltigerName(String),

    #[error("Handler fuer '{signal}' fehlgeschlagen: {quelle}")]
    Handler {
        signal: String,
        #[source]
        quelle: anyhow::Error,
    },
}

/// Alle moeglichen Fehler im Client-Crate
#[derive(Debug, Error)]
pub enum ClientError {
    // --- Transport ---
    #[error("Verbindung zu '{adresse}' fehlgeschlagen: {grund}")]
    Verbindung {
        adresse: String,
        errno: Option<i32>,
        grund: String,
    },

    #[error("Verbindung zu '{0}' verloren")]
    Getrennt(String),

    #[error("Zeitlimit ueberschritten: {0}")]
    Zeitlimit(String),

    #[error("TLS-Fehler: {0}")]
    Tls(String),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    // --- Protokoll ---
    #[error("Protokollfehler: {0}")]
    Protokoll(#[from] ProtocolError),

    #[error("Adapterfehler: {0}")]
    Adapter(String),

    // --- Server ---
    #[error("{msg} (Fehler-ID {id:#x})")]
    ServerQuery {
        id: u32,
        msg: String,
        return_code: Option<String>,
    },

    // --- Signal ---
    #[error("Signal-Fehler: {0}")]
    Signal(#[from] SignalError),

    // --- Dateitransfer ---
    #[error("Dateitransfer-Fehler: {0}")]
    Transfer(String),

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),
}

impl ClientError {
    pub fn kategorie(&self) -> FehlerKategorie {
        match self {
            Self::Verbindung { .. }
            | Self::Getrennt(_)
            | Self::Zeitlimit(_)
            | Self::Tls(_)
            | Self::Io(_) => FehlerKategorie::Transport,
            Self::Protokoll(_) | Self::Adapter(_) => FehlerKategorie::Protokoll,
            Self::ServerQuery { .. } => FehlerKategorie::ServerQuery,
            Self::Signal(_) => FehlerKategorie::Signal,
            Self::Transfer(_) => FehlerKategorie::Transfer,
            Self::Konfiguration(_) => FehlerKategorie::Konfiguration,
        }
    }

    /// Numerischer Fehler-Code (Server-ID bzw. Protokoll-Code), falls vorhanden
    pub fn fehler_code(&self) -> Option<u32> {
        match self {
            Self::ServerQuery { id, .. } => Some(*id),
            Self::Protokoll(e) => Some(e.fehler_code()),
            Self::Verbindung { errno, .. } => errno.and_then(|e| u32::try_from(e).ok()),
            _ => None,
        }
    }

    /// Transportfehler machen die aktuelle Verbindung unbrauchbar
    pub fn ist_transport_fehler(&self) -> bool {
        self.kategorie() == FehlerKategorie::Transport
    }

    /// Gibt true zurueck wenn ein erneuter Versuch sinnvoll sein koennte
    pub fn ist_wiederholbar(&self) -> bool {
        matches!(
            self,
            Self::Zeitlimit(_) | Self::Verbindung { .. } | Self::Getrennt(_) | Self::ServerQuery { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serverquery_fehler_anzeige() {
        let e = ClientError::ServerQuery {
            id: 0x200,
            msg: "invalid clientID".into(),
            return_code: None,
        };
        assert_eq!(e.to_string(), "invalid clientID (Fehler-ID 0x200)");
        assert_eq!(e.fehler_code(), Some(0x200));
        assert_eq!(e.kategorie(), FehlerKategorie::ServerQuery);
    }

    #[test]
    fn protokollfehler_wird_konvertiert() {
        let e: ClientError = ProtocolError::LeereAntwort.into();
        assert_eq!(e.kategorie(), FehlerKategorie::Protokoll);
        assert!(!e.ist_transport_fehler());
    }

    #[test]
    fn transport_kategorie() {
        let e = ClientError::Getrennt("127.0.0.1:10011".into());
        assert!(e.ist_transport_fehler());
        assert!(e.ist_wiederholbar());
        assert!(!ClientError::Transfer("kurz".into()).ist_wiederholbar());
    }

    #[test]
    fn verbindungsfehler_mit_errno() {
        let e = ClientError::Verbindung {
            adresse: "[::1]:10011".into(),
            errno: Some(111),
            grund: "Connection refused".into(),
        };
        assert_eq!(e.fehler_code(), Some(111));
        assert!(e.to_string().contains("[::1]:10011"));
    }
}
