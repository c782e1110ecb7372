//! Signal-Bus – benannte Ereignisse zwischen Transport, Adapter und Anwendung
//!
//! Handler werden pro Signalname in Registrierungsreihenfolge gespeichert und
//! synchron aufgerufen. Vor dem Aufruf wird die Handler-Liste kopiert, damit
//! Handler sich selbst oder andere waehrend der Emission abmelden koennen.
//!
//! ## Signalnamen
//! - Transport: `<typ>DataRead`, `<typ>DataSend`, `<typ>Disconnected`, `<typ>WaitTimeout`
//! - ServerQuery: `serverqueryConnected`, `serverqueryCommandStarted`, `serverqueryCommandFinished`
//! - Ereignisse: `notifyEvent` und `notify<Typ>`
//! - Dateitransfer: `filetransferConnected`, `filetransferHandshake`,
//!   `filetransfer{Upload,Download}{Started,Progress,Finished}`

use std::collections::VecDeque;
use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use ts3query_protocol::{Event, Reply};
use uuid::Uuid;

use crate::error::SignalError;

// ---------------------------------------------------------------------------
// Signalnamen
// ---------------------------------------------------------------------------

pub const SERVERQUERY_CONNECTED: &str = "serverqueryConnected";
pub const SERVERQUERY_COMMAND_STARTED: &str = "serverqueryCommandStarted";
pub const SERVERQUERY_COMMAND_FINISHED: &str = "serverqueryCommandFinished";
pub const NOTIFY_EVENT: &str = "notifyEvent";

pub const FILETRANSFER_CONNECTED: &str = "filetransferConnected";
pub const FILETRANSFER_HANDSHAKE: &str = "filetransferHandshake";
pub const FILETRANSFER_UPLOAD_STARTED: &str = "filetransferUploadStarted";
pub const FILETRANSFER_UPLOAD_PROGRESS: &str = "filetransferUploadProgress";
pub const FILETRANSFER_UPLOAD_FINISHED: &str = "filetransferUploadFinished";
pub const FILETRANSFER_DOWNLOAD_STARTED: &str = "filetransferDownloadStarted";
pub const FILETRANSFER_DOWNLOAD_PROGRESS: &str = "filetransferDownloadProgress";
pub const FILETRANSFER_DOWNLOAD_FINISHED: &str = "filetransferDownloadFinished";

/// Suffixe der Transport-Signale, vorangestellt wird der Adaptertyp
pub const DATA_READ: &str = "DataRead";
pub const DATA_SEND: &str = "DataSend";
pub const DISCONNECTED: &str = "Disconnected";
pub const WAIT_TIMEOUT: &str = "WaitTimeout";

/// Setzt Adaptertyp und Suffix zusammen, z.B. `serverqueryDataRead`
pub fn transport_signal(typ: &str, suffix: &str) -> String {
    format!("{typ}{suffix}")
}

// ---------------------------------------------------------------------------
// Nutzdaten
// ---------------------------------------------------------------------------

/// Ausgangs-Warteschlange fuer Zeilen, die ein Handler senden moechte
///
/// Wird mit `<typ>WaitTimeout` ausgeliefert. Der Transport sendet alle
/// eingereihten Zeilen direkt nach der Emission (z.B. Keep-Alive).
#[derive(Debug, Clone, Default)]
pub struct Ausgang {
    zeilen: Arc<Mutex<VecDeque<String>>>,
}

impl Ausgang {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Reiht eine Befehlszeile (ohne Zeilenende) zum Senden ein
    pub fn senden(&self, zeile: impl Into<String>) {
        self.zeilen.lock().push_back(zeile.into());
    }

    pub fn ist_leer(&self) -> bool {
        self.zeilen.lock().is_empty()
    }

    /// Entnimmt alle eingereihten Zeilen in Reihenfolge
    pub(crate) fn entnehmen(&self) -> Vec<String> {
        self.zeilen.lock().drain(..).collect()
    }
}

/// Fortschritt eines Dateitransfers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferFortschritt {
    pub ftkey: String,
    /// Bisher uebertragene Bytes
    pub position: u64,
    /// Erwartete Gesamtgroesse
    pub groesse: u64,
}

/// Nutzdaten eines Signals
#[derive(Debug, Clone)]
pub enum SignalDaten {
    Leer,
    /// Gelesene bzw. gesendete Rohdaten
    Daten(Bytes),
    /// Kumulierte Wartezeit im nicht-blockierenden Modus
    Zeitlimit { sekunden: u64, ausgang: Ausgang },
    /// Gesendete Befehlszeile
    Befehl(String),
    Antwort { befehl: String, antwort: Arc<Reply> },
    Ereignis(Arc<Event>),
    Transfer(TransferFortschritt),
}

// ---------------------------------------------------------------------------
// SignalBus
// ---------------------------------------------------------------------------

/// Signatur eines Handlers
pub type Handler = Arc<dyn Fn(&SignalDaten) -> anyhow::Result<()> + Send + Sync>;

/// Thread-sicherer Signal-Bus
///
/// Clone teilt den inneren Zustand. Fuer Tests wird pro Fall ein eigener Bus
/// erzeugt, Anwendungen koennen [`SignalBus::global`] nutzen.
#[derive(Clone, Default)]
pub struct SignalBus {
    handler: Arc<DashMap<String, Vec<(Uuid, Handler)>>>,
}

impl std::fmt::Debug for SignalBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalBus")
            .field("signale", &self.signal_names())
            .finish()
    }
}

impl SignalBus {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Prozessweiter Standard-Bus
    pub fn global() -> &'static SignalBus {
        static GLOBAL: OnceLock<SignalBus> = OnceLock::new();
        GLOBAL.get_or_init(SignalBus::neu)
    }

    /// Registriert einen Handler und gibt seine ID zurueck
    pub fn subscribe<F>(&self, name: &str, handler: F) -> Result<Uuid, SignalError>
    where
        F: Fn(&SignalDaten) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        if !name_gueltig(name) {
            return Err(SignalError::UngueltigerName(name.to_string()));
        }
        let id = Uuid::new_v4();
        self.handler
            .entry(name.to_string())
            .or_default()
            .push((id, Arc::new(handler)));
        tracing::trace!(signal = name, %id, "Handler registriert");
        Ok(id)
    }

    /// Entfernt einen Handler; `false` wenn er nicht registriert war
    pub fn unsubscribe(&self, name: &str, id: Uuid) -> bool {
        let entfernt = match self.handler.get_mut(name) {
            Some(mut liste) => {
                let vorher = liste.len();
                liste.retain(|(h_id, _)| *h_id != id);
                liste.len() != vorher
            }
            None => false,
        };
        self.handler.remove_if(name, |_, liste| liste.is_empty());
        entfernt
    }

    /// Ruft alle Handler eines Signals in Registrierungsreihenfolge auf
    ///
    /// Der erste fehlschlagende Handler bricht die Emission ab.
    pub fn emit(&self, name: &str, daten: &SignalDaten) -> Result<(), SignalError> {
        // Kopie ziehen, damit kein DashMap-Lock waehrend der Handler gehalten wird
        let handler: Vec<Handler> = match self.handler.get(name) {
            Some(liste) => liste.iter().map(|(_, h)| Arc::clone(h)).collect(),
            None => return Ok(()),
        };

        for h in handler {
            h(daten).map_err(|quelle| SignalError::Handler {
                signal: name.to_string(),
                quelle,
            })?;
        }
        Ok(())
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.handler.get(name).map_or(0, |liste| liste.len())
    }

    pub fn has_handlers(&self, name: &str) -> bool {
        self.subscriber_count(name) > 0
    }

    /// Alle Signale mit mindestens einem Handler, sortiert
    pub fn signal_names(&self) -> Vec<String> {
        let mut namen: Vec<String> = self
            .handler
            .iter()
            .filter(|eintrag| !eintrag.value().is_empty())
            .map(|eintrag| eintrag.key().clone())
            .collect();
        namen.sort();
        namen
    }

    pub fn clear(&self) {
        self.handler.clear();
    }
}

fn name_gueltig(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric())
}
