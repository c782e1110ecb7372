//! Asynchrone Server-Benachrichtigungen (`notify...`)
//!
//! Ereignisse nutzen dieselbe Grammatik wie eine Antwortzeile, tragen aber
//! keine eigene Fehlerzeile. Der Typ ergibt sich aus dem Text nach `notify`.

use crate::error::{ProtocolError, ProtocolResult};
use crate::reply::zeile_parsen;
use crate::value::Zeile;
use crate::{EREIGNIS, TRENNER_LISTE, TRENNER_ZELLE};

/// Ein dekodiertes Server-Ereignis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    typ: String,
    zeilen: Vec<Zeile>,
    nachricht: String,
}

impl Event {
    /// Parst eine Ereigniszeile wie `notifycliententerview cfid=0 ctid=1 ...`
    pub fn parse(zeile: &str) -> ProtocolResult<Self> {
        if !zeile.starts_with(EREIGNIS) {
            return Err(ProtocolError::UngueltigesEreignis(zeile.to_string()));
        }

        let (kopf, daten) = zeile
            .split_once(TRENNER_ZELLE)
            .ok_or_else(|| ProtocolError::LeeresEreignis(zeile.to_string()))?;
        if daten.trim().is_empty() {
            return Err(ProtocolError::LeeresEreignis(zeile.to_string()));
        }

        let zeilen = daten
            .split(TRENNER_LISTE)
            .map(|z| zeile_parsen(z, true))
            .collect();

        Ok(Self {
            typ: kopf[EREIGNIS.len()..].to_string(),
            zeilen,
            nachricht: daten.to_string(),
        })
    }

    /// Ereignistyp ohne `notify`-Praefix, z.B. `cliententerview`
    pub fn typ(&self) -> &str {
        &self.typ
    }

    /// Typspezifischer Signalname, z.B. `notifyCliententerview`
    pub fn signal_name(&self) -> String {
        let mut chars = self.typ.chars();
        match chars.next() {
            Some(erster) => format!("{EREIGNIS}{}{}", erster.to_uppercase(), chars.as_str()),
            None => EREIGNIS.to_string(),
        }
    }

    /// Nutzdaten (erste Zeile)
    pub fn data(&self) -> &Zeile {
        // parse() erzeugt immer mindestens eine Zeile
        &self.zeilen[0]
    }

    /// Alle Zeilen, falls der Server mehrere Datensaetze buendelt
    pub fn rows(&self) -> &[Zeile] {
        &self.zeilen
    }

    /// Escapte Rohnachricht ohne Kopf
    pub fn message(&self) -> &str {
        &self.nachricht
    }
}
