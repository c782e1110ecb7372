//! FileTransfer-Adapter
//!
//! Eigene Verbindung zum Dateitransfer-Port. Jeder Transfer beginnt mit dem
//! einmaligen Transferschluessel (ohne Zeilenende), danach fliessen nur noch
//! Rohdaten. Die Anzahl uebertragener Bytes muss exakt der angekuendigten
//! Groesse entsprechen.

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::{Adapter, Profiler, TYP_FILETRANSFER};
use crate::config::VerbindungsKonfig;
use crate::error::{ClientError, ClientResult};
use crate::signal::{
    SignalBus, SignalDaten, TransferFortschritt, FILETRANSFER_CONNECTED,
    FILETRANSFER_DOWNLOAD_FINISHED, FILETRANSFER_DOWNLOAD_PROGRESS,
    FILETRANSFER_DOWNLOAD_STARTED, FILETRANSFER_HANDSHAKE, FILETRANSFER_UPLOAD_FINISHED,
    FILETRANSFER_UPLOAD_PROGRESS, FILETRANSFER_UPLOAD_STARTED,
};
use crate::transport::{Transport, MAX_BLOCK};

/// Erlaubte Laengen eines Transferschluessels
const SCHLUESSEL_LAENGEN: [usize; 2] = [16, 32];

/// Obergrenze fuer die Vorbelegung des Download-Puffers
const MAX_VORBELEGUNG: usize = 16 * 1024 * 1024;

#[derive(Debug)]
pub struct FileTransfer {
    transport: Transport,
    profiler: Profiler,
}

impl FileTransfer {
    pub async fn connect(konfig: VerbindungsKonfig, signale: SignalBus) -> ClientResult<Self> {
        Self::from_transport(Transport::neu(konfig, signale)).await
    }

    /// Uebernimmt einen Transport und verbindet ihn falls noetig
    pub async fn from_transport(transport: Transport) -> ClientResult<Self> {
        let mut transport = transport.mit_typ(TYP_FILETRANSFER);
        transport.connect().await?;
        transport
            .signale()
            .emit(FILETRANSFER_CONNECTED, &SignalDaten::Leer)?;

        Ok(Self {
            transport,
            profiler: Profiler::neu(TYP_FILETRANSFER)?,
        })
    }

    /// Sendet den Transferschluessel
    pub async fn init(&mut self, ftkey: &str) -> ClientResult<()> {
        if !SCHLUESSEL_LAENGEN.contains(&ftkey.chars().count()) {
            return Err(ClientError::Transfer(format!(
                "Ungueltiger Transferschluessel '{ftkey}' (erwartet 16 oder 32 Zeichen)"
            )));
        }

        self.transport.send(ftkey.as_bytes()).await?;
        self.transport.signale().emit(
            FILETRANSFER_HANDSHAKE,
            &SignalDaten::Befehl(ftkey.to_string()),
        )?;
        tracing::debug!(ftkey, "Transfer initialisiert");
        Ok(())
    }

    /// Laedt `daten` ab `offset` hoch und gibt die gesendeten Bytes zurueck
    pub async fn upload(&mut self, ftkey: &str, offset: u64, daten: &[u8]) -> ClientResult<u64> {
        let groesse = daten.len() as u64;
        let start = usize::try_from(offset)
            .ok()
            .filter(|start| *start <= daten.len())
            .ok_or_else(|| {
                ClientError::Transfer(format!(
                    "Offset {offset} liegt hinter dem Dateiende ({groesse} Bytes)"
                ))
            })?;

        self.init(ftkey).await?;
        self.fortschritt(FILETRANSFER_UPLOAD_STARTED, ftkey, offset, groesse)?;

        self.profiler.start();
        let mut position = offset;
        for block in daten[start..].chunks(MAX_BLOCK) {
            position += self.transport.send(block).await? as u64;
            self.fortschritt(FILETRANSFER_UPLOAD_PROGRESS, ftkey, position, groesse)?;
        }
        self.profiler.stop();

        if position < groesse {
            return Err(ClientError::Transfer(format!(
                "Upload unvollstaendig: {position} von {groesse} Bytes gesendet"
            )));
        }

        self.fortschritt(FILETRANSFER_UPLOAD_FINISHED, ftkey, position, groesse)?;
        tracing::info!(ftkey, bytes = position - offset, "Upload abgeschlossen");
        Ok(position - offset)
    }

    /// Laedt genau `groesse` Bytes herunter
    pub async fn download(&mut self, ftkey: &str, groesse: u64) -> ClientResult<Bytes> {
        let kapazitaet = usize::try_from(groesse)
            .unwrap_or(MAX_VORBELEGUNG)
            .min(MAX_VORBELEGUNG);
        let mut puffer = Vec::with_capacity(kapazitaet);
        self.download_passthrough(ftkey, groesse, &mut puffer).await?;
        Ok(Bytes::from(puffer))
    }

    /// Laedt herunter und schreibt direkt in `ziel`
    pub async fn download_passthrough<W>(
        &mut self,
        ftkey: &str,
        groesse: u64,
        ziel: &mut W,
    ) -> ClientResult<u64>
    where
        W: AsyncWrite + Unpin,
    {
        self.init(ftkey).await?;
        self.fortschritt(FILETRANSFER_DOWNLOAD_STARTED, ftkey, 0, groesse)?;

        self.profiler.start();
        let mut position = 0u64;
        while position < groesse {
            let rest = usize::try_from(groesse - position).unwrap_or(MAX_BLOCK).min(MAX_BLOCK);
            let block = self.transport.read_chunk(rest).await?;
            if block.is_empty() {
                break;
            }
            ziel.write_all(&block).await?;
            position += block.len() as u64;
            self.fortschritt(FILETRANSFER_DOWNLOAD_PROGRESS, ftkey, position, groesse)?;
        }
        ziel.flush().await?;
        self.profiler.stop();

        if position != groesse {
            return Err(ClientError::Transfer(format!(
                "Download unvollstaendig: {position} von {groesse} Bytes empfangen"
            )));
        }

        self.fortschritt(FILETRANSFER_DOWNLOAD_FINISHED, ftkey, position, groesse)?;
        tracing::info!(ftkey, bytes = position, "Download abgeschlossen");
        Ok(position)
    }

    pub async fn close(&mut self) {
        self.transport.disconnect().await;
    }

    fn fortschritt(&self, signal: &str, ftkey: &str, position: u64, groesse: u64) -> ClientResult<()> {
        self.transport.signale().emit(
            signal,
            &SignalDaten::Transfer(TransferFortschritt {
                ftkey: ftkey.to_string(),
                position,
                groesse,
            }),
        )?;
        Ok(())
    }
}

impl Adapter for FileTransfer {
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
