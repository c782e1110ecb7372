//! Adapter – Protokollsitzungen auf einem exklusiv besessenen Transport
//!
//! - [`serverquery::ServerQuery`]: Befehl/Antwort-Zyklen und Ereignisse
//! - [`filetransfer::FileTransfer`]: Upload und Download per Transferschluessel

pub mod filetransfer;
pub mod profiler;
pub mod serverquery;

use crate::signal::SignalBus;
use crate::transport::Transport;

pub use filetransfer::FileTransfer;
pub use profiler::Profiler;
pub use serverquery::{ServerQuery, Zustand};

/// Adaptertyp der ServerQuery-Sitzung (Signal-Praefix)
pub const TYP_SERVERQUERY: &str = "serverquery";
/// Adaptertyp des Dateitransfers (Signal-Praefix)
pub const TYP_FILETRANSFER: &str = "filetransfer";

/// Gemeinsame Sicht auf beide Adapter
pub trait Adapter {
    fn transport(&self) -> &Transport;

    fn transport_mut(&mut self) -> &mut Transport;

    fn profiler(&self) -> &Profiler;

    fn signale(&self) -> &SignalBus {
        self.transport().signale()
    }

    fn is_connected(&self) -> bool {
        self.transport().is_connected()
    }
}
