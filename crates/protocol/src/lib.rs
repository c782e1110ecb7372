//! ts3query-protocol – Wire-Grammatik des TeamSpeak-3-ServerQuery-Protokolls
//!
//! Dieses Crate ist reine Datenverarbeitung ohne I/O:
//! - Escape-Tabelle und Wertkodierung ([`escape`])
//! - Befehls-Encoder inklusive Bulk-Zeilen ([`Command`])
//! - Antwort- und Ereignis-Dekoder ([`Reply`], [`Event`])
//!
//! Das Format ist dreistufig: Zeilen einer Tabelle werden mit `|`
//! getrennt, Zellen mit einem Leerzeichen, Schluessel und Wert mit `=`.

pub mod command;
pub mod error;
pub mod escape;
pub mod event;
pub mod reply;
pub mod value;

pub use command::{Command, NodeId, ParamWert};
pub use error::{ProtocolError, ProtocolResult};
pub use escape::{escape, unescape};
pub use event::Event;
pub use reply::{Dekoder, FehlerDatensatz, Reply};
pub use value::{Wert, Zeile};

/// Trennt Zeilen einer Tabelle
pub const TRENNER_LISTE: &str = "|";
/// Trennt Zellen innerhalb einer Zeile
pub const TRENNER_ZELLE: &str = " ";
/// Trennt Schluessel und Wert
pub const TRENNER_PAAR: &str = "=";

/// Statuswort der abschliessenden Antwortzeile
pub const FEHLER: &str = "error";
/// Praefix asynchroner Ereignisse
pub const EREIGNIS: &str = "notify";

/// Protokollkennung eines TeamSpeak-3-Servers
pub const TS3_KENNUNG: &str = "TS3";
/// Protokollkennung eines TeaSpeak-Servers
pub const TEA_KENNUNG: &str = "TeaSpeak";

/// Begruessungszeilen nach der Kennung
pub const TS3_MOTD_PRAEFIX: &str = "Welcome";
pub const TEA_MOTD_PRAEFIX: &str = "TeaSpeak";
