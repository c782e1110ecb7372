//! Transport – Byte- und Zeilenebene ueber TCP, UDP oder TLS
//!
//! Der Transport kennt keine Protokollsemantik. Er besitzt genau einen
//! Stream (`None` solange getrennt), rahmt Zeilen und meldet gelesene und
//! gesendete Daten auf dem Signal-Bus, jeweils mit dem Adaptertyp als
//! Praefix (`serverqueryDataRead`, `filetransferDataSend`, ...).
//!
//! ## Modi
//! - Blockierend: jeder Lesevorgang ist durch das Zeitlimit begrenzt und
//!   scheitert danach mit [`ClientError::Zeitlimit`].
//! - Nicht-blockierend: vor jedem Lesen wartet [`Transport::wait_for_ready_read`]
//!   beliebig lange und meldet pro abgelaufenem Zeitlimit `<typ>WaitTimeout`.

mod tls;
pub mod udp;

use bytes::Bytes;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::{TransportArt, VerbindungsKonfig};
use crate::error::{ClientError, ClientResult};
use crate::signal::{
    transport_signal, Ausgang, SignalBus, SignalDaten, DATA_READ, DATA_SEND, DISCONNECTED,
    WAIT_TIMEOUT,
};

pub use udp::UdpStream;

/// Standard-Adaptertyp, solange kein Adapter den Transport uebernimmt
pub const TYP_TRANSPORT: &str = "transport";

/// Maximale Groesse eines gesendeten Blocks
pub const MAX_BLOCK: usize = 4096;

/// Standard-Zeilenende
pub const ZEILENENDE: &str = "\n";

/// Jeder Byte-Stream, den der Transport besitzen kann
pub trait StreamIo: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> StreamIo for T {}

type Stream = BufReader<Box<dyn StreamIo>>;

pub struct Transport {
    konfig: VerbindungsKonfig,
    typ: &'static str,
    stream: Option<Stream>,
    signale: SignalBus,
    /// Per Keep-Alive gesendete Befehle, deren Antworten noch ausstehen
    injiziert: usize,
    /// Angefangene Zeile, die ein Zeitlimit unterbrochen hat
    zeilenrest: Vec<u8>,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("typ", &self.typ)
            .field("adresse", &self.konfig.adresse())
            .field("verbunden", &self.stream.is_some())
            .finish()
    }
}

impl Transport {
    /// Erstellt einen getrennten Transport
    pub fn neu(konfig: VerbindungsKonfig, signale: SignalBus) -> Self {
        Self {
            konfig,
            typ: TYP_TRANSPORT,
            stream: None,
            signale,
            injiziert: 0,
            zeilenrest: Vec::new(),
        }
    }

    /// Uebernimmt einen bereits offenen Stream (z.B. einen Mock in Tests)
    pub fn from_stream<S>(konfig: VerbindungsKonfig, stream: S, signale: SignalBus) -> Self
    where
        S: StreamIo + 'static,
    {
        let mut transport = Self::neu(konfig, signale);
        transport.stream = Some(puffern(Box::new(stream), TransportArt::Tcp));
        transport
    }

    /// Setzt den Adaptertyp, der allen Transport-Signalen vorangestellt wird
    pub fn mit_typ(mut self, typ: &'static str) -> Self {
        self.typ = typ;
        self
    }

    pub fn typ(&self) -> &'static str {
        self.typ
    }

    pub fn konfig(&self) -> &VerbindungsKonfig {
        &self.konfig
    }

    pub fn signale(&self) -> &SignalBus {
        &self.signale
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Oeffnet die Verbindung; ohne Wirkung wenn bereits verbunden
    pub async fn connect(&mut self) -> ClientResult<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        self.konfig.validieren()?;

        let adresse = self.konfig.adresse();
        let dauer = self.konfig.timeout_dauer();
        let zeitlimit = || ClientError::Zeitlimit(format!("Verbindungsaufbau zu '{adresse}'"));

        let stream: Box<dyn StreamIo> = match self.konfig.transport {
            TransportArt::Tcp => {
                let tcp = timeout(dauer, TcpStream::connect(&adresse))
                    .await
                    .map_err(|_| zeitlimit())?
                    .map_err(|e| verbindungsfehler(&adresse, &e))?;
                if let Err(e) = tcp.set_nodelay(true) {
                    tracing::debug!(adresse = %adresse, fehler = %e, "TCP_NODELAY nicht gesetzt");
                }

                if self.konfig.tls {
                    let connector =
                        tls::connector_erstellen(self.konfig.tls_ca_datei.as_deref())?;
                    let name = tls::server_name(&self.konfig.host)?;
                    let tls_stream = timeout(dauer, connector.connect(name, tcp))
                        .await
                        .map_err(|_| zeitlimit())?
                        .map_err(|e| {
                            ClientError::Tls(format!("Handshake mit '{adresse}' fehlgeschlagen: {e}"))
                        })?;
                    Box::new(tls_stream)
                } else {
                    Box::new(tcp)
                }
            }
            TransportArt::Udp => {
                let udp = timeout(dauer, UdpStream::verbinden(&adresse))
                    .await
                    .map_err(|_| zeitlimit())?
                    .map_err(|e| verbindungsfehler(&adresse, &e))?;
                Box::new(udp)
            }
        };

        self.stream = Some(puffern(stream, self.konfig.transport));
        tracing::info!(
            typ = self.typ,
            adresse = %adresse,
            tls = self.konfig.tls,
            blocking = self.konfig.blocking,
            "Verbindung hergestellt"
        );
        Ok(())
    }

    /// Trennt die Verbindung und meldet `<typ>Disconnected`
    ///
    /// Mehrfacher Aufruf ist ohne Wirkung. Fehler von Handlern werden nur
    /// protokolliert.
    pub async fn disconnect(&mut self) {
        let Some(mut stream) = self.stream.take() else {
            return;
        };
        self.injiziert = 0;
        self.zeilenrest.clear();

        match timeout(self.konfig.timeout_dauer(), stream.shutdown()).await {
            Ok(Err(e)) => tracing::debug!(fehler = %e, "Shutdown fehlgeschlagen"),
            Err(_) => tracing::debug!("Shutdown ueberschritt das Zeitlimit"),
            Ok(Ok(())) => {}
        }
        drop(stream);

        tracing::info!(typ = self.typ, adresse = %self.konfig.adresse(), "Verbindung getrennt");

        let signal = transport_signal(self.typ, DISCONNECTED);
        if let Err(e) = self.signale.emit(&signal, &SignalDaten::Leer) {
            tracing::warn!(signal = %signal, fehler = %e, "Handler beim Trennen fehlgeschlagen");
        }
    }

    /// Liest bis zu `laenge` Bytes; Verbindungsende ist ein Fehler
    pub async fn read(&mut self, laenge: usize) -> ClientResult<Bytes> {
        let daten = self.read_chunk(laenge).await?;
        if daten.is_empty() && laenge > 0 {
            return Err(ClientError::Getrennt(self.konfig.adresse()));
        }
        Ok(daten)
    }

    /// Wie [`Transport::read`], liefert bei Verbindungsende aber leere Bytes
    pub(crate) async fn read_chunk(&mut self, laenge: usize) -> ClientResult<Bytes> {
        self.wait_for_ready_read(0).await?;

        let adresse = self.konfig.adresse();
        let dauer = self.konfig.timeout_dauer();
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| ClientError::Getrennt(adresse.clone()))?;

        let mut puffer = vec![0u8; laenge];
        let gelesen = timeout(dauer, stream.read(&mut puffer))
            .await
            .map_err(|_| ClientError::Zeitlimit(format!("Lesen von '{adresse}'")))??;
        puffer.truncate(gelesen);

        let daten = Bytes::from(puffer);
        if !daten.is_empty() {
            self.melden(DATA_READ, SignalDaten::Daten(daten.clone()))?;
        }
        Ok(daten)
    }

    /// Liest eine Zeile bis `token` und gibt sie ohne Token und getrimmt zurueck
    ///
    /// Gelesen wird schrittweise: im nicht-blockierenden Modus wartet vor
    /// jedem Schritt [`Transport::wait_for_ready_read`], im blockierenden Modus
    /// ist jeder einzelne Lesevorgang durch das Zeitlimit begrenzt. Bereits
    /// gelesene Bytes bleiben nach einem Zeitlimit erhalten und werden beim
    /// naechsten Aufruf fortgesetzt.
    ///
    /// Endet die Verbindung mitten in einer Zeile, wird der Rest als
    /// vollstaendige Zeile behandelt. Nur ein Verbindungsende ohne
    /// gepufferte Daten ist ein Fehler.
    pub async fn read_line(&mut self, token: &str) -> ClientResult<String> {
        let ende = token.as_bytes();
        if ende.is_empty() {
            return Err(ClientError::Adapter("Leeres Zeilenende".into()));
        }

        let adresse = self.konfig.adresse();
        loop {
            self.wait_for_ready_read(0).await?;

            let stream = self
                .stream
                .as_mut()
                .ok_or_else(|| ClientError::Getrennt(adresse.clone()))?;
            let verfuegbar = if self.konfig.blocking {
                timeout(self.konfig.timeout_dauer(), stream.fill_buf())
                    .await
                    .map_err(|_| ClientError::Zeitlimit(format!("Lesen von '{adresse}'")))??
            } else {
                stream.fill_buf().await?
            };

            if verfuegbar.is_empty() {
                if self.zeilenrest.is_empty() {
                    return Err(ClientError::Getrennt(adresse));
                }
                tracing::debug!(typ = self.typ, "Verbindungsende mitten in einer Zeile");
                self.zeilenrest.extend_from_slice(ende);
                break;
            }

            let mut verbraucht = 0;
            let mut fertig = false;
            for &byte in verfuegbar {
                self.zeilenrest.push(byte);
                verbraucht += 1;
                if self.zeilenrest.ends_with(ende) {
                    fertig = true;
                    break;
                }
            }
            stream.consume(verbraucht);
            if fertig {
                break;
            }
        }

        let puffer = std::mem::take(&mut self.zeilenrest);
        let zeile = String::from_utf8_lossy(&puffer[..puffer.len() - ende.len()])
            .trim()
            .to_string();
        tracing::trace!(typ = self.typ, zeile = %zeile, "<-");

        self.melden(DATA_READ, SignalDaten::Daten(Bytes::from(puffer)))?;
        Ok(zeile)
    }

    /// Sendet Rohdaten und gibt die Anzahl gesendeter Bytes zurueck
    pub async fn send(&mut self, daten: &[u8]) -> ClientResult<usize> {
        let adresse = self.konfig.adresse();
        let dauer = self.konfig.timeout_dauer();
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| ClientError::Getrennt(adresse.clone()))?;

        timeout(dauer, async {
            stream.write_all(daten).await?;
            stream.flush().await?;
            Ok::<_, std::io::Error>(())
        })
        .await
        .map_err(|_| ClientError::Zeitlimit(format!("Senden an '{adresse}'")))??;

        self.melden(DATA_SEND, SignalDaten::Daten(Bytes::copy_from_slice(daten)))?;
        Ok(daten.len())
    }

    /// Sendet eine Zeile in Bloecken von hoechstens 4096 Bytes
    ///
    /// Der Trenner wird nur an den letzten Block angehaengt.
    pub async fn send_line(&mut self, daten: &str, trenner: &str) -> ClientResult<usize> {
        tracing::trace!(typ = self.typ, zeile = %daten, "->");

        let mut bloecke: Vec<Vec<u8>> = daten
            .as_bytes()
            .chunks(MAX_BLOCK)
            .map(<[u8]>::to_vec)
            .collect();
        match bloecke.last_mut() {
            Some(letzter) => letzter.extend_from_slice(trenner.as_bytes()),
            None => bloecke.push(trenner.as_bytes().to_vec()),
        }

        let mut gesendet = 0;
        for block in bloecke {
            gesendet += self.send(&block).await?;
        }
        Ok(gesendet)
    }

    /// Wartet im nicht-blockierenden Modus, bis Daten lesbar sind
    ///
    /// `zeit` ist die bereits verstrichene Wartezeit in Sekunden. Nach jedem
    /// abgelaufenen Zeitlimit wird `<typ>WaitTimeout` mit der kumulierten
    /// Zeit gemeldet. Zeilen, die Handler in den [`Ausgang`] legen, werden
    /// direkt danach gesendet.
    pub async fn wait_for_ready_read(&mut self, zeit: u64) -> ClientResult<()> {
        if self.konfig.blocking || self.stream.is_none() {
            return Ok(());
        }

        let dauer = self.konfig.timeout_dauer();
        let mut zeit = zeit;
        loop {
            if zeit > 0 {
                self.zeitlimit_melden(zeit).await?;
            }

            let stream = self
                .stream
                .as_mut()
                .ok_or_else(|| ClientError::Getrennt(self.konfig.adresse()))?;
            // Leerer Puffer bedeutet Verbindungsende; das meldet der folgende Lesevorgang
            let bereit = match timeout(dauer, stream.fill_buf()).await {
                Ok(Ok(_)) => true,
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => false,
            };
            if bereit {
                return Ok(());
            }
            zeit += self.konfig.timeout;
        }
    }

    /// Anzahl der seit dem letzten Aufruf eingeschleusten Befehle
    pub fn injizierte_befehle_entnehmen(&mut self) -> usize {
        std::mem::take(&mut self.injiziert)
    }

    async fn zeitlimit_melden(&mut self, sekunden: u64) -> ClientResult<()> {
        let ausgang = Ausgang::neu();
        self.melden(
            WAIT_TIMEOUT,
            SignalDaten::Zeitlimit {
                sekunden,
                ausgang: ausgang.clone(),
            },
        )?;

        for zeile in ausgang.entnehmen() {
            tracing::debug!(typ = self.typ, zeile = %zeile, "Keep-Alive gesendet");
            self.send_line(&zeile, ZEILENENDE).await?;
            self.injiziert += 1;
        }
        Ok(())
    }

    fn melden(&self, suffix: &str, daten: SignalDaten) -> ClientResult<()> {
        let signal = transport_signal(self.typ, suffix);
        self.signale.emit(&signal, &daten)?;
        Ok(())
    }
}

fn puffern(stream: Box<dyn StreamIo>, art: TransportArt) -> Stream {
    match art {
        // Ein Datagramm muss vollstaendig in den Lesepuffer passen
        TransportArt::Udp => BufReader::with_capacity(udp::MAX_DATAGRAMM, stream),
        TransportArt::Tcp => BufReader::new(stream),
    }
}

fn verbindungsfehler(adresse: &str, fehler: &std::io::Error) -> ClientError {
    ClientError::Verbindung {
        adresse: adresse.to_string(),
        errno: fehler.raw_os_error(),
        grund: fehler.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio_test::io::Builder;

    fn konfig() -> VerbindungsKonfig {
        VerbindungsKonfig::neu("127.0.0.1", 10011)
    }

    #[tokio::test]
    async fn zeile_lesen_ohne_token() {
        let mock = Builder::new().read(b"TS3\r\nWelcome\n").build();
        let mut t = Transport::from_stream(konfig(), mock, SignalBus::neu());

        assert_eq!(t.read_line("\n").await.unwrap(), "TS3");
        assert_eq!(t.read_line("\n").await.unwrap(), "Welcome");
    }

    #[tokio::test]
    async fn zeile_ueber_mehrere_pakete() {
        let mock = Builder::new().read(b"error id=0").read(b" msg=ok\n").build();
        let mut t = Transport::from_stream(konfig(), mock, SignalBus::neu());
        assert_eq!(t.read_line("\n").await.unwrap(), "error id=0 msg=ok");
    }

    #[tokio::test]
    async fn mehrbyte_token() {
        let mock = Builder::new().read(b"a\nb\n\rc\n\r").build();
        let mut t = Transport::from_stream(konfig(), mock, SignalBus::neu());
        assert_eq!(t.read_line("\n\r").await.unwrap(), "a\nb");
        assert_eq!(t.read_line("\n\r").await.unwrap(), "c");
    }

    #[tokio::test]
    async fn teilzeile_bei_verbindungsende() {
        let mock = Builder::new().read(b"error id=0 msg=ok").build();
        let mut t = Transport::from_stream(konfig(), mock, SignalBus::neu());

        assert_eq!(t.read_line("\n").await.unwrap(), "error id=0 msg=ok");
        let e = t.read_line("\n").await.unwrap_err();
        assert!(matches!(e, ClientError::Getrennt(_)));
    }

    #[tokio::test]
    async fn lesen_bei_verbindungsende_ist_fehler() {
        let mock = Builder::new().read(b"abc").build();
        let mut t = Transport::from_stream(konfig(), mock, SignalBus::neu());

        assert_eq!(&t.read(10).await.unwrap()[..], b"abc");
        assert!(matches!(t.read(10).await, Err(ClientError::Getrennt(_))));
    }

    #[tokio::test]
    async fn send_line_in_bloecken() {
        let lang = "x".repeat(MAX_BLOCK + 10);
        let mut erwartet = lang.clone().into_bytes();
        erwartet.push(b'\n');

        let mock = Builder::new().write(&erwartet).build();
        let signale = SignalBus::neu();
        let bloecke = Arc::new(Mutex::new(Vec::new()));
        let b = Arc::clone(&bloecke);
        signale
            .subscribe("transportDataSend", move |daten| {
                if let SignalDaten::Daten(d) = daten {
                    b.lock().unwrap().push(d.len());
                }
                Ok(())
            })
            .unwrap();

        let mut t = Transport::from_stream(konfig(), mock, signale);
        assert_eq!(t.send_line(&lang, "\n").await.unwrap(), MAX_BLOCK + 11);
        // Trenner nur am letzten Block
        assert_eq!(*bloecke.lock().unwrap(), vec![MAX_BLOCK, 11]);
    }

    #[tokio::test]
    async fn leere_zeile_sendet_nur_trenner() {
        let mock = Builder::new().write(b"\n").build();
        let mut t = Transport::from_stream(konfig(), mock, SignalBus::neu());
        assert_eq!(t.send_line("", "\n").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn signale_tragen_adaptertyp() {
        let mock = Builder::new().read(b"TS3\n").build();
        let signale = SignalBus::neu();
        let gelesen = Arc::new(Mutex::new(Vec::new()));
        let g = Arc::clone(&gelesen);
        signale
            .subscribe("serverqueryDataRead", move |daten| {
                if let SignalDaten::Daten(d) = daten {
                    g.lock().unwrap().push(d.clone());
                }
                Ok(())
            })
            .unwrap();

        let mut t = Transport::from_stream(konfig(), mock, signale).mit_typ("serverquery");
        t.read_line("\n").await.unwrap();
        assert_eq!(&gelesen.lock().unwrap()[0][..], b"TS3\n");
    }

    #[tokio::test]
    async fn disconnect_ist_idempotent() {
        let mock = Builder::new().build();
        let signale = SignalBus::neu();
        let zaehler = Arc::new(Mutex::new(0));
        let z = Arc::clone(&zaehler);
        signale
            .subscribe("transportDisconnected", move |_| {
                *z.lock().unwrap() += 1;
                anyhow::bail!("Handler-Fehler wird nur protokolliert")
            })
            .unwrap();

        let mut t = Transport::from_stream(konfig(), mock, signale);
        t.disconnect().await;
        t.disconnect().await;

        assert!(!t.is_connected());
        assert_eq!(*zaehler.lock().unwrap(), 1);
        assert!(matches!(t.send(b"x").await, Err(ClientError::Getrennt(_))));
    }

    #[tokio::test]
    async fn blockierendes_lesen_mit_zeitlimit() {
        let mut k = konfig();
        k.timeout = 1;
        let mock = Builder::new().wait(Duration::from_secs(5)).read(b"spaet\n").build();
        let mut t = Transport::from_stream(k, mock, SignalBus::neu());

        tokio::time::pause();
        let e = t.read_line("\n").await.unwrap_err();
        assert!(matches!(e, ClientError::Zeitlimit(_)));

        // Restliche Mock-Aktionen verbrauchen
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(t.read_line("\n").await.unwrap(), "spaet");
    }

    #[tokio::test]
    async fn blockierend_zeitlimit_gilt_pro_lesevorgang() {
        let mut k = konfig();
        k.timeout = 2;
        let mock = Builder::new()
            .read(b"error id=0")
            .wait(Duration::from_millis(1500))
            .read(b" msg=")
            .wait(Duration::from_millis(1500))
            .read(b"ok\n")
            .build();
        let mut t = Transport::from_stream(k, mock, SignalBus::neu());

        tokio::time::pause();
        assert_eq!(t.read_line("\n").await.unwrap(), "error id=0 msg=ok");
    }

    #[tokio::test]
    async fn angefangene_zeile_ueberlebt_zeitlimit() {
        let mut k = konfig();
        k.timeout = 1;
        let mock = Builder::new()
            .read(b"error id=0")
            .wait(Duration::from_secs(5))
            .read(b" msg=ok\n")
            .build();
        let mut t = Transport::from_stream(k, mock, SignalBus::neu());

        tokio::time::pause();
        assert!(matches!(t.read_line("\n").await, Err(ClientError::Zeitlimit(_))));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(t.read_line("\n").await.unwrap(), "error id=0 msg=ok");
    }

    #[tokio::test]
    async fn nicht_blockierend_wartet_zwischen_paketen() {
        let mut k = konfig();
        k.timeout = 1;
        k.blocking = false;
        let mock = Builder::new()
            .read(b"notifytextmessage targetmode=3 ")
            .wait(Duration::from_millis(2500))
            .read(b"msg=hi\n")
            .build();

        let signale = SignalBus::neu();
        let sekunden = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&sekunden);
        signale
            .subscribe("transportWaitTimeout", move |daten| {
                if let SignalDaten::Zeitlimit { sekunden, .. } = daten {
                    s.lock().unwrap().push(*sekunden);
                }
                Ok(())
            })
            .unwrap();

        let mut t = Transport::from_stream(k, mock, signale);
        tokio::time::pause();
        let zeile = t.read_line("\n").await.unwrap();

        assert_eq!(zeile, "notifytextmessage targetmode=3 msg=hi");
        assert_eq!(*sekunden.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn nicht_blockierend_meldet_wartezeit_und_sendet_keepalive() {
        let mut k = konfig();
        k.timeout = 1;
        k.blocking = false;
        let mock = Builder::new()
            .write(b"version\n")
            .read(b"notifytextmessage msg=hallo\n")
            .build();

        let signale = SignalBus::neu();
        let sekunden = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&sekunden);
        signale
            .subscribe("transportWaitTimeout", move |daten| {
                if let SignalDaten::Zeitlimit { sekunden, ausgang } = daten {
                    let mut liste = s.lock().unwrap();
                    liste.push(*sekunden);
                    // Erst beim zweiten Zeitlimit einen Keep-Alive einreihen
                    if liste.len() == 2 {
                        ausgang.senden("version");
                    }
                }
                Ok(())
            })
            .unwrap();

        let mut t = Transport::from_stream(k, mock, signale);
        tokio::time::pause();
        let zeile = t.read_line("\n").await.unwrap();

        assert_eq!(zeile, "notifytextmessage msg=hallo");
        assert_eq!(*sekunden.lock().unwrap(), vec![1, 2]);
        assert_eq!(t.injizierte_befehle_entnehmen(), 1);
        assert_eq!(t.injizierte_befehle_entnehmen(), 0);
    }

    #[tokio::test]
    async fn verbindungsfehler_traegt_adresse() {
        // Port 1 auf localhost ist praktisch nie offen
        let mut t = Transport::neu(VerbindungsKonfig::neu("127.0.0.1", 1), SignalBus::neu());
        match t.connect().await {
            Err(ClientError::Verbindung { adresse, .. }) => assert_eq!(adresse, "127.0.0.1:1"),
            Err(ClientError::Zeitlimit(_)) => {}
            andere => panic!("unerwartet: {andere:?}"),
        }
        assert!(!t.is_connected());
    }

    #[tokio::test]
    async fn connect_ueber_tcp() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            sock.write_all(b"TS3\n").await.unwrap();
        });

        let mut t = Transport::neu(VerbindungsKonfig::neu("127.0.0.1", port), SignalBus::neu());
        t.connect().await.unwrap();
        // Zweiter Aufruf ist ohne Wirkung
        t.connect().await.unwrap();
        assert_eq!(t.read_line("\n").await.unwrap(), "TS3");

        server.await.unwrap();
        t.disconnect().await;
    }
}
