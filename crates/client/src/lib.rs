//! ts3query-client – Client fuer die TeamSpeak-3-ServerQuery-Schnittstelle
//!
//! Schichten von unten nach oben:
//! - [`transport`]: TCP, UDP oder TLS, Zeilenrahmung, nicht-blockierendes Warten
//! - [`signal`]: Signal-Bus fuer Transport-, Befehls- und Server-Ereignisse
//! - [`adapter`]: [`ServerQuery`] (Befehle, Ereignisse) und [`FileTransfer`]
//!
//! Die Wire-Grammatik liegt im Crate `ts3query-protocol` und wird hier
//! re-exportiert.
//!
//! ```no_run
//! use ts3query_client::{ServerQuery, SignalBus, VerbindungsKonfig};
//!
//! # async fn beispiel() -> ts3query_client::ClientResult<()> {
//! let konfig = VerbindungsKonfig::from_uri("serverquery://127.0.0.1:10011/")?;
//! let mut sq = ServerQuery::connect(konfig, SignalBus::neu()).await?;
//! sq.request("login serveradmin geheim").await?;
//! let server = sq.request("serverlist").await?.to_array();
//! println!("{} Server", server.len());
//! sq.close().await;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod logging;
pub mod signal;
pub mod transport;

pub use adapter::{Adapter, FileTransfer, Profiler, ServerQuery, Zustand};
pub use config::{KonfigSnapshot, TransportArt, VerbindungsKonfig};
pub use error::{ClientError, ClientResult, FehlerKategorie, SignalError};
pub use signal::{Ausgang, SignalBus, SignalDaten, TransferFortschritt};
pub use transport::Transport;

pub use ts3query_protocol as protocol;
pub use ts3query_protocol::{Command, Event, Reply, Wert, Zeile};
