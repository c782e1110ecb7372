//! ServerQuery-Adapter
//!
//! Orchestriert Befehl/Antwort-Zyklen auf einem Transport. Jede Antwort
//! endet mit genau einer Fehlerzeile; alle Zeilen davor werden gesammelt
//! und dekodiert. Dazwischen eintreffende Ereignisse werden auf dem
//! Signal-Bus gemeldet.
//!
//! ## Zustaende
//! `Getrennt -> Verbindend -> Bereit -> WartetAufAntwort -> Bereit -> Geschlossen`
//!
//! ## Keep-Alive
//! Handler von `serverqueryWaitTimeout` koennen Befehle ueber den
//! [`Ausgang`](crate::signal::Ausgang) einschleusen. Deren Antworten werden
//! vor dem naechsten Befehl gelesen und verworfen, damit die Zuordnung von
//! Befehl und Fehlerzeile erhalten bleibt.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ts3query_protocol::reply::{erste_zelle, ist_ereigniszeile, ist_fehlerzeile};
use ts3query_protocol::{
    Command, Dekoder, Event, ProtocolError, Reply, TEA_KENNUNG, TS3_KENNUNG,
};

use super::{Adapter, Profiler, TYP_SERVERQUERY};
use crate::config::{KonfigSnapshot, VerbindungsKonfig};
use crate::error::{ClientError, ClientResult, FEHLER_BEFEHL_UNBEKANNT};
use crate::signal::{
    SignalBus, SignalDaten, NOTIFY_EVENT, SERVERQUERY_COMMAND_FINISHED,
    SERVERQUERY_COMMAND_STARTED, SERVERQUERY_CONNECTED,
};
use crate::transport::{Transport, ZEILENENDE};

/// Befehle, die im Automatisierungsbetrieb nicht unterstuetzt werden
const SPERRLISTE: &[&str] = &["help"];

/// Lebenszyklus einer ServerQuery-Sitzung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zustand {
    Getrennt,
    Verbindend,
    Bereit,
    WartetAufAntwort,
    Geschlossen,
}

#[derive(Debug)]
pub struct ServerQuery {
    transport: Transport,
    dekoder: Dekoder,
    zustand: Zustand,
    profiler: Profiler,
    /// Erste Zeile des Servers (`TS3`, `TeaSpeak`, ...)
    kennung: String,
    anzahl: u64,
    letzter_befehl: Option<DateTime<Utc>>,
    /// Eingeschleuste Befehle, deren Fehlerzeile noch nicht gelesen wurde
    ausstehend: usize,
}

impl ServerQuery {
    /// Verbindet sich und prueft die Protokollkennung
    pub async fn connect(konfig: VerbindungsKonfig, signale: SignalBus) -> ClientResult<Self> {
        Self::from_transport(Transport::neu(konfig, signale)).await
    }

    /// Stellt eine Sitzung aus einem gespeicherten Snapshot wieder her
    pub async fn reconnect(snapshot: KonfigSnapshot, signale: SignalBus) -> ClientResult<Self> {
        tracing::debug!(erstellt = %snapshot.erstellt, "Verbinde aus Snapshot");
        Self::connect(snapshot.konfig, signale).await
    }

    /// Uebernimmt einen (ggf. bereits verbundenen) Transport
    pub async fn from_transport(transport: Transport) -> ClientResult<Self> {
        let transport = transport.mit_typ(TYP_SERVERQUERY);

        let mut dekoder = Dekoder::default();
        if let Some(praefix) = transport.konfig().motd_praefix.as_deref() {
            dekoder = dekoder.mit_motd_praefix(praefix);
        }

        let mut sitzung = Self {
            transport,
            dekoder,
            zustand: Zustand::Verbindend,
            profiler: Profiler::neu(TYP_SERVERQUERY)?,
            kennung: String::new(),
            anzahl: 0,
            letzter_befehl: None,
            ausstehend: 0,
        };

        if let Err(e) = sitzung.transport.connect().await {
            sitzung.zustand = Zustand::Getrennt;
            return Err(e);
        }
        sitzung.syn().await?;
        Ok(sitzung)
    }

    /// Liest die erste Zeile und prueft die Protokollkennung
    async fn syn(&mut self) -> ClientResult<()> {
        let zeile = match self.transport.read_line(ZEILENENDE).await {
            Ok(zeile) => zeile,
            Err(e) => {
                self.abbrechen().await;
                return Err(e);
            }
        };

        let eigene = self
            .transport
            .konfig()
            .protokoll_kennung
            .as_deref()
            .filter(|k| !k.is_empty());
        let gueltig = [TS3_KENNUNG, TEA_KENNUNG]
            .into_iter()
            .chain(eigene)
            .any(|kennung| zeile.starts_with(kennung));

        if !gueltig {
            tracing::warn!(kennung = %zeile, "Unbekannte Protokollkennung");
            self.abbrechen().await;
            return Err(ProtocolError::UngueltigesBanner(zeile).into());
        }

        tracing::info!(kennung = %zeile, adresse = %self.transport.konfig().adresse(), "ServerQuery bereit");
        self.kennung = zeile;
        self.zustand = Zustand::Bereit;
        self.transport
            .signale()
            .emit(SERVERQUERY_CONNECTED, &SignalDaten::Leer)?;
        Ok(())
    }

    /// Sendet einen Befehl; eine Fehler-ID ungleich 0 wird zum Fehler
    ///
    /// Bei fehlender Berechtigung wird der Name der Berechtigung per
    /// `permissionlist` nachgeschlagen und an die Meldung angehaengt.
    pub async fn request(&mut self, befehl: &str) -> ClientResult<Reply> {
        let antwort = self.austausch(befehl).await?;
        if antwort.error().ist_ok() {
            return Ok(antwort);
        }
        Err(self.fehler_anreichern(&antwort).await)
    }

    /// Sendet einen Befehl und liefert die Antwort auch bei Fehler-ID ungleich 0
    pub async fn request_unchecked(&mut self, befehl: &str) -> ClientResult<Reply> {
        self.austausch(befehl).await
    }

    pub async fn execute(&mut self, befehl: &Command) -> ClientResult<Reply> {
        self.request(&befehl.encode()).await
    }

    /// Wartet auf das naechste Ereignis (nur im nicht-blockierenden Modus)
    ///
    /// Zeilen, die kein Ereignis sind, werden verworfen.
    pub async fn wait(&mut self) -> ClientResult<Event> {
        if self.transport.konfig().blocking {
            return Err(ClientError::Adapter(
                "wait() ist nur im nicht-blockierenden Modus moeglich".into(),
            ));
        }
        self.bereit_pruefen()?;

        loop {
            let zeile = self.zeile_lesen().await?;
            if ist_fehlerzeile(&zeile) {
                self.ausstehend = self.ausstehend.saturating_sub(1);
                continue;
            }
            if ist_ereigniszeile(&zeile) {
                let ereignis = Event::parse(&zeile)?;
                self.ereignis_melden(&ereignis)?;
                return Ok(ereignis);
            }
            tracing::trace!(zeile = %zeile, "Zeile ohne Ereignis verworfen");
        }
    }

    /// Beendet die Sitzung
    ///
    /// Im blockierenden Modus wird vorher `quit` gesendet; alle Fehler dabei
    /// werden ignoriert. Mehrfacher Aufruf ist ohne Wirkung.
    pub async fn close(&mut self) {
        if self.zustand == Zustand::Geschlossen {
            return;
        }
        if self.transport.konfig().blocking
            && self.zustand == Zustand::Bereit
            && self.transport.is_connected()
        {
            if let Err(e) = self.austausch("quit").await {
                tracing::debug!(fehler = %e, "quit beim Schliessen fehlgeschlagen");
            }
        }
        self.transport.disconnect().await;
        self.zustand = Zustand::Geschlossen;
    }

    /// Serialisierbarer Zustand fuer [`ServerQuery::reconnect`]
    pub fn snapshot(&self) -> KonfigSnapshot {
        KonfigSnapshot::neu(self.transport.konfig().clone())
    }

    pub fn zustand(&self) -> Zustand {
        self.zustand
    }

    /// Protokollkennung aus der ersten Serverzeile
    pub fn kennung(&self) -> &str {
        &self.kennung
    }

    /// Anzahl gesendeter Befehle
    pub fn query_count(&self) -> u64 {
        self.anzahl
    }

    /// Zeitpunkt des letzten Befehls (Grundlage fuer Keep-Alive-Strategien)
    pub fn last_command(&self) -> Option<DateTime<Utc>> {
        self.letzter_befehl
    }

    // -----------------------------------------------------------------------
    // Interna
    // -----------------------------------------------------------------------

    /// Ein vollstaendiger Befehl/Antwort-Zyklus ohne Auswertung der Fehler-ID
    async fn austausch(&mut self, befehl: &str) -> ClientResult<Reply> {
        self.bereit_pruefen()?;

        if befehl.contains(['\r', '\n']) {
            return Err(ProtocolError::UnerlaubteZeichen(befehl.to_string()).into());
        }
        let schluesselwort = erste_zelle(befehl);
        if SPERRLISTE
            .iter()
            .any(|gesperrt| schluesselwort.eq_ignore_ascii_case(gesperrt))
        {
            return Err(ClientError::ServerQuery {
                id: FEHLER_BEFEHL_UNBEKANNT,
                msg: "command not found".into(),
                return_code: None,
            });
        }

        self.ausstehende_antworten_verwerfen().await?;

        self.transport.signale().emit(
            SERVERQUERY_COMMAND_STARTED,
            &SignalDaten::Befehl(befehl.to_string()),
        )?;

        self.zustand = Zustand::WartetAufAntwort;
        self.profiler.start();
        let ergebnis = self.senden_und_sammeln(befehl).await;
        let dauer = self.profiler.stop();

        let zeilen = match ergebnis {
            Ok(zeilen) => {
                self.zustand = Zustand::Bereit;
                zeilen
            }
            Err(e) => {
                if e.ist_transport_fehler() {
                    self.abbrechen().await;
                } else {
                    self.zustand = Zustand::Bereit;
                }
                return Err(e);
            }
        };

        self.anzahl += 1;
        self.letzter_befehl = Some(Utc::now());

        let antwort = Arc::new(self.dekoder.decode(&zeilen, befehl)?);
        tracing::debug!(
            befehl = schluesselwort,
            id = antwort.error().id,
            dauer_ms = dauer.map(|d| d.as_millis() as u64),
            "Befehl beendet"
        );

        for ereignis in antwort.events() {
            self.ereignis_melden(ereignis)?;
        }
        self.transport.signale().emit(
            SERVERQUERY_COMMAND_FINISHED,
            &SignalDaten::Antwort {
                befehl: befehl.to_string(),
                antwort: Arc::clone(&antwort),
            },
        )?;

        Ok(Arc::try_unwrap(antwort).unwrap_or_else(|geteilt| (*geteilt).clone()))
    }

    async fn senden_und_sammeln(&mut self, befehl: &str) -> ClientResult<Vec<String>> {
        self.transport.send_line(befehl, ZEILENENDE).await?;

        let mut zeilen = Vec::new();
        loop {
            let zeile = self.zeile_lesen().await?;
            let ende = ist_fehlerzeile(&zeile);
            zeilen.push(zeile);
            if ende {
                return Ok(zeilen);
            }
        }
    }

    /// Liest eine Zeile und uebernimmt zwischenzeitlich eingeschleuste Befehle
    async fn zeile_lesen(&mut self) -> ClientResult<String> {
        let zeile = self.transport.read_line(ZEILENENDE).await;
        self.ausstehend += self.transport.injizierte_befehle_entnehmen();
        zeile
    }

    /// Liest die Antworten eingeschleuster Befehle; Ereignisse werden gemeldet
    async fn ausstehende_antworten_verwerfen(&mut self) -> ClientResult<()> {
        self.ausstehend += self.transport.injizierte_befehle_entnehmen();
        while self.ausstehend > 0 {
            let zeile = self.zeile_lesen().await?;
            if ist_fehlerzeile(&zeile) {
                self.ausstehend -= 1;
                tracing::trace!(zeile = %zeile, "Antwort auf Keep-Alive verworfen");
            } else if ist_ereigniszeile(&zeile) {
                let ereignis = Event::parse(&zeile)?;
                self.ereignis_melden(&ereignis)?;
            }
        }
        Ok(())
    }

    /// Meldet ein Ereignis als `notifyEvent` und `notify<Typ>`
    fn ereignis_melden(&self, ereignis: &Event) -> ClientResult<()> {
        let daten = SignalDaten::Ereignis(Arc::new(ereignis.clone()));
        let signale = self.transport.signale();
        signale.emit(NOTIFY_EVENT, &daten)?;
        signale.emit(&ereignis.signal_name(), &daten)?;
        Ok(())
    }

    /// Baut den ServerQuery-Fehler und haengt Details an die Meldung an
    async fn fehler_anreichern(&mut self, antwort: &Reply) -> ClientError {
        let fehler = antwort.error();
        let mut msg = fehler.msg.clone();

        if let Some(permid) = fehler.failed_permid().filter(|id| *id != 0) {
            match self.berechtigungsname(permid).await {
                Some(name) => msg.push_str(&format!(" (failed on {name})")),
                None => msg.push_str(&format!(" (failed on permid {permid}/0x{permid:X})")),
            }
        } else if let Some(extra) = fehler.extra_msg().filter(|e| !e.is_empty()) {
            msg.push_str(&format!(" ({extra})"));
        }

        ClientError::ServerQuery {
            id: fehler.id,
            msg,
            return_code: fehler.return_code.clone(),
        }
    }

    /// Schlaegt den Namen einer Berechtigung nach; Fehler fuehren zu `None`
    async fn berechtigungsname(&mut self, permid: i64) -> Option<String> {
        let liste = match self.austausch("permissionlist").await {
            Ok(liste) if liste.error().ist_ok() => liste,
            Ok(liste) => {
                tracing::debug!(id = liste.error().id, "permissionlist abgelehnt");
                return None;
            }
            Err(e) => {
                tracing::debug!(fehler = %e, "permissionlist fehlgeschlagen");
                return None;
            }
        };

        liste
            .to_array()
            .into_iter()
            .find(|zeile| zeile.get_int("permid").ok() == Some(permid))
            .and_then(|zeile| zeile.get_string("permname").ok())
    }

    fn bereit_pruefen(&self) -> ClientResult<()> {
        match self.zustand {
            Zustand::Bereit => Ok(()),
            Zustand::Geschlossen => Err(ClientError::Adapter("Sitzung ist geschlossen".into())),
            andere => Err(ClientError::Adapter(format!(
                "Sitzung nicht bereit (Zustand {andere:?})"
            ))),
        }
    }

    /// Trennt nach einem Transportfehler; die Sitzung ist danach unbrauchbar
    async fn abbrechen(&mut self) {
        self.transport.disconnect().await;
        self.ausstehend = 0;
        self.zustand = Zustand::Getrennt;
    }
}

impl Adapter for ServerQuery {
    fn transport(&self) -> &Transport {
        &self.transport
    }

    fn transport_mut(&mut self) -> &mut Transport {
        &mut self.transport
    }

    fn profiler(&self) -> &Profiler {
        &self.profiler
    }
}

impl Drop for ServerQuery {
    fn drop(&mut self) {
        if self.zustand != Zustand::Geschlossen && self.transport.is_connected() {
            tracing::debug!(
                adresse = %self.transport.konfig().adresse(),
                "ServerQuery ohne close() verworfen"
            );
        }
    }
}
