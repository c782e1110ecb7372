//! Dekodierte Antwort auf einen ServerQuery-Befehl
//!
//! Eine Antwort besteht aus beliebig vielen Datenzeilen und genau einer
//! abschliessenden Fehlerzeile (`error id=0 msg=ok`). Zwischen den Daten
//! koennen asynchrone Ereignisse (`notify...`) und MOTD-Zeilen liegen.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{ProtocolError, ProtocolResult};
use crate::escape::unescape;
use crate::event::Event;
use crate::value::{Wert, Zeile};
use crate::{
    FEHLER, EREIGNIS, TEA_MOTD_PRAEFIX, TRENNER_LISTE, TRENNER_PAAR, TRENNER_ZELLE,
    TS3_MOTD_PRAEFIX,
};

// ---------------------------------------------------------------------------
// Fehlerdatensatz
// ---------------------------------------------------------------------------

/// Status eines Befehls aus der letzten Antwortzeile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FehlerDatensatz {
    /// 0 = Erfolg
    pub id: u32,
    pub msg: String,
    /// Vom Aufrufer gesetztes und vom Server gespiegeltes Korrelations-Token
    pub return_code: Option<String>,
    /// Alle Felder der Zeile, inklusive `failed_permid` und `extra_msg`
    felder: Zeile,
}

impl FehlerDatensatz {
    /// Parst eine Fehlerzeile (`error id=.. msg=.. [weitere]`)
    pub fn parse(zeile: &str) -> ProtocolResult<Self> {
        // Erste Zelle ist das Statuswort `error`
        let zellen = zeile.split_once(TRENNER_ZELLE).map_or("", |(_, rest)| rest);
        let felder = zeile_parsen(zellen, true);

        let id = felder
            .get_int("id")
            .ok()
            .and_then(|id| u32::try_from(id).ok())
            .ok_or_else(|| ProtocolError::UngueltigeFehlerzeile(zeile.to_string()))?;
        let msg = felder.get_string("msg").unwrap_or_default();
        let return_code = felder
            .get("return_code")
            .filter(|w| !w.ist_null())
            .map(ToString::to_string);

        Ok(Self {
            id,
            msg,
            return_code,
            felder,
        })
    }

    /// Erfolgsdatensatz `id=0 msg=ok`
    pub fn ok() -> Self {
        let mut felder = Zeile::neu();
        felder.einfuegen("id", 0_i64);
        felder.einfuegen("msg", "ok");
        Self {
            id: 0,
            msg: "ok".into(),
            return_code: None,
            felder,
        }
    }

    pub fn ist_ok(&self) -> bool {
        self.id == 0
    }

    /// Beliebiges Feld der Fehlerzeile
    pub fn property(&self, schluessel: &str) -> Option<&Wert> {
        self.felder.get(schluessel)
    }

    /// Fehlende Berechtigung bei Fehler 2568
    pub fn failed_permid(&self) -> Option<i64> {
        self.felder.get_int("failed_permid").ok()
    }

    pub fn extra_msg(&self) -> Option<&str> {
        self.felder.get_str("extra_msg").ok()
    }

    pub fn felder(&self) -> &Zeile {
        &self.felder
    }
}

// ---------------------------------------------------------------------------
// Dekoder
// ---------------------------------------------------------------------------

/// Dekodiert rohe Antwortzeilen in eine [`Reply`]
///
/// Haelt die Praefixe der Begruessungszeilen, die beim ersten Befehl nach
/// dem Verbindungsaufbau mitgelesen und verworfen werden.
#[derive(Debug, Clone)]
pub struct Dekoder {
    motd_praefixe: Vec<String>,
}

impl Default for Dekoder {
    fn default() -> Self {
        Self {
            motd_praefixe: vec![TS3_MOTD_PRAEFIX.into(), TEA_MOTD_PRAEFIX.into()],
        }
    }
}

impl Dekoder {
    /// Zusaetzlicher MOTD-Praefix (z.B. fuer angepasste Server-Builds)
    pub fn mit_motd_praefix(mut self, praefix: impl Into<String>) -> Self {
        self.motd_praefixe.push(praefix.into());
        self
    }

    pub fn ist_motd(&self, zeile: &str) -> bool {
        self.motd_praefixe.iter().any(|p| zeile.starts_with(p.as_str()))
    }

    /// Dekodiert alle Zeilen eines Befehls; die letzte Zeile ist die Fehlerzeile
    pub fn decode<S: AsRef<str>>(&self, zeilen: &[S], befehl: &str) -> ProtocolResult<Reply> {
        let (letzte, rest) = zeilen.split_last().ok_or(ProtocolError::LeereAntwort)?;
        let fehler = FehlerDatensatz::parse(letzte.as_ref())?;

        let mut daten = Vec::new();
        let mut ereignisse = Vec::new();

        for zeile in rest.iter().map(AsRef::as_ref) {
            if zeile.is_empty() || self.ist_motd(zeile) {
                continue;
            }
            if zeile.starts_with(EREIGNIS) {
                ereignisse.push(Event::parse(zeile)?);
            } else {
                daten.push(zeile);
            }
        }

        Ok(Reply {
            befehl: befehl.to_string(),
            roh: daten.join(TRENNER_LISTE),
            fehler,
            ereignisse,
        })
    }
}

/// Gibt die erste Zelle einer Zeile zurueck (Befehls- bzw. Statuswort)
pub fn erste_zelle(zeile: &str) -> &str {
    zeile.split(TRENNER_ZELLE).next().unwrap_or_default()
}

/// Prueft ob eine Zeile die abschliessende Fehlerzeile ist
pub fn ist_fehlerzeile(zeile: &str) -> bool {
    erste_zelle(zeile) == FEHLER
}

/// Prueft ob eine Zeile ein Ereignis ist
pub fn ist_ereigniszeile(zeile: &str) -> bool {
    erste_zelle(zeile).starts_with(EREIGNIS)
}

/// Zerlegt eine Zeile (ohne Listentrenner) in Schluessel/Wert-Paare
pub(crate) fn zeile_parsen(roh: &str, dekodieren: bool) -> Zeile {
    roh.split(TRENNER_ZELLE)
        .filter(|zelle| !zelle.is_empty())
        .map(|zelle| match zelle.split_once(TRENNER_PAAR) {
            Some((key, wert)) => (key.to_string(), Wert::aus_wire(wert, dekodieren)),
            None => (zelle.to_string(), Wert::Null),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Reply
// ---------------------------------------------------------------------------

/// Vollstaendig dekodierte Antwort auf einen Befehl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    befehl: String,
    /// Datenzeilen, mit `|` verbunden, noch escaped
    roh: String,
    fehler: FehlerDatensatz,
    ereignisse: Vec<Event>,
}

impl Reply {
    /// Dekodiert mit den Standard-MOTD-Praefixen
    pub fn decode<S: AsRef<str>>(zeilen: &[S], befehl: &str) -> ProtocolResult<Self> {
        Dekoder::default().decode(zeilen, befehl)
    }

    /// Der Befehl, auf den diese Antwort folgte
    pub fn command(&self) -> &str {
        &self.befehl
    }

    /// Escapter Datenpuffer
    pub fn raw(&self) -> &str {
        &self.roh
    }

    pub fn is_empty(&self) -> bool {
        self.roh.is_empty()
    }

    pub fn error(&self) -> &FehlerDatensatz {
        &self.fehler
    }

    /// Feld der Fehlerzeile, z.B. `error_property("return_code")`
    pub fn error_property(&self, schluessel: &str) -> Option<&Wert> {
        self.fehler.property(schluessel)
    }

    /// Zwischen den Daten empfangene Ereignisse in Empfangsreihenfolge
    pub fn events(&self) -> &[Event] {
        &self.ereignisse
    }

    /// Datenzeilen, escaped
    pub fn to_lines_raw(&self) -> Vec<&str> {
        if self.roh.is_empty() {
            return Vec::new();
        }
        self.roh.split(TRENNER_LISTE).collect()
    }

    /// Datenzeilen, dekodiert
    pub fn to_lines(&self) -> Vec<String> {
        self.to_lines_raw().into_iter().map(unescape).collect()
    }

    /// Zeilen x Zellen, jede Zelle dekodiert (`key=value` bleibt zusammen)
    pub fn to_table(&self) -> Vec<Vec<String>> {
        self.to_lines_raw()
            .into_iter()
            .map(|zeile| {
                zeile
                    .split(TRENNER_ZELLE)
                    .filter(|zelle| !zelle.is_empty())
                    .map(unescape)
                    .collect()
            })
            .collect()
    }

    /// Zeilen als Schluessel/Wert-Tabellen, Texte dekodiert
    pub fn to_array(&self) -> Vec<Zeile> {
        self.zeilen(true)
    }

    /// Wie [`Reply::to_array`], Texte bleiben escaped
    pub fn to_array_raw(&self) -> Vec<Zeile> {
        self.zeilen(false)
    }

    /// Erste (bzw. einzige) Zeile, z.B. fuer `serverinfo`
    pub fn to_row(&self) -> Option<Zeile> {
        self.to_array().into_iter().next()
    }

    /// Zeilen indiziert nach dem Wert eines Schluessels
    ///
    /// Jede Zeile muss den Schluessel enthalten, sonst `UngueltigerParameter`.
    pub fn to_assoc_array(&self, schluessel: &str) -> ProtocolResult<IndexMap<String, Zeile>> {
        self.to_array()
            .into_iter()
            .map(|zeile| {
                let index = zeile
                    .get(schluessel)
                    .map(ToString::to_string)
                    .ok_or_else(|| ProtocolError::UngueltigerParameter(schluessel.to_string()))?;
                Ok((index, zeile))
            })
            .collect()
    }

    fn zeilen(&self, dekodieren: bool) -> Vec<Zeile> {
        self.to_lines_raw()
            .into_iter()
            .map(|zeile| zeile_parsen(zeile, dekodieren))
            .collect()
    }
}

impl std::fmt::Display for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&unescape(&self.roh))
    }
}
