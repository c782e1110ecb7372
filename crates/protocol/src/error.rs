//! Fehlertypen fuer das ServerQuery-Protokoll

use thiserror::Error;

/// Result-Alias fuer Protokoll-Operationen
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Alle Fehler, die beim Kodieren und Dekodieren entstehen koennen
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Ungueltige Antwort des Servers: {0}")]
    UngueltigesBanner(String),

    #[error("Unerlaubte Zeichen im Befehl '{0}'")]
    UnerlaubteZeichen(String),

    #[error("Ungueltiges Ereignisformat: {0}")]
    UngueltigesEreignis(String),

    #[error("Ereignis ohne Nutzdaten: {0}")]
    LeeresEreignis(String),

    #[error("Leere Antwort (keine Fehlerzeile)")]
    LeereAntwort,

    #[error("Ungueltige Fehlerzeile: {0}")]
    UngueltigeFehlerzeile(String),

    #[error("Schluessel nicht vorhanden: {0}")]
    FehlenderSchluessel(String),

    #[error("Falscher Typ fuer '{schluessel}': erwartet {erwartet}")]
    FalscherTyp {
        schluessel: String,
        erwartet: &'static str,
    },

    #[error("Ungueltiger Parameter: {0}")]
    UngueltigerParameter(String),
}

impl ProtocolError {
    /// Fehler-Code im Stil der Server-Fehler-IDs (Adapter-Bereich 0x6xx)
    pub fn fehler_code(&self) -> u32 {
        match self {
            Self::UngueltigesBanner(_) => 0x601,
            Self::UngueltigerParameter(_) => 0x602,
            Self::UnerlaubteZeichen(_) => 0x603,
            Self::UngueltigesEreignis(_) | Self::LeeresEreignis(_) => 0x604,
            Self::LeereAntwort | Self::UngueltigeFehlerzeile(_) => 0x605,
            Self::FehlenderSchluessel(_) | Self::FalscherTyp { .. } => 0x606,
        }
    }
}
