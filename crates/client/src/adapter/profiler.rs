//! Laufzeitmessung fuer Befehle und Transfers
//!
//! Jede gemessene Dauer landet in einem Prometheus-Histogramm
//! (`ts3query_<typ>_duration_seconds`). Anwendungen koennen es ueber
//! [`Profiler::histogramm`] in ihrer eigenen Registry registrieren.

use std::time::{Duration, Instant};

use prometheus::{Histogram, HistogramOpts};

use crate::error::{ClientError, ClientResult};

/// Bucket-Grenzen in Sekunden, von LAN-Roundtrips bis zu langen Transfers
const BUCKETS: [f64; 12] = [
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 10.0, 60.0,
];

/// Misst einzelne Laeufe und zeichnet sie im Histogramm auf
#[derive(Clone)]
pub struct Profiler {
    start: Option<Instant>,
    letzte_dauer: Option<Duration>,
    dauer: Histogram,
}

impl std::fmt::Debug for Profiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profiler")
            .field("laeuft", &self.laeuft())
            .field("letzte_dauer", &self.letzte_dauer)
            .field("laeufe", &self.laeufe())
            .finish()
    }
}

impl Profiler {
    /// Erstellt einen Profiler fuer den Adaptertyp `typ`
    pub fn neu(typ: &str) -> ClientResult<Self> {
        let dauer = Histogram::with_opts(
            HistogramOpts::new(
                format!("ts3query_{typ}_duration_seconds"),
                format!("Laufzeit pro {typ}-Vorgang in Sekunden"),
            )
            .buckets(BUCKETS.to_vec()),
        )
        .map_err(|e| ClientError::Adapter(format!("Profiler fuer '{typ}' nicht erstellt: {e}")))?;

        Ok(Self {
            start: None,
            letzte_dauer: None,
            dauer,
        })
    }

    /// Startet einen Lauf; ein bereits laufender wird verworfen
    pub fn start(&mut self) {
        self.start = Some(Instant::now());
    }

    /// Beendet den aktuellen Lauf und gibt seine Dauer zurueck
    pub fn stop(&mut self) -> Option<Duration> {
        let dauer = self.start.take()?.elapsed();
        self.letzte_dauer = Some(dauer);
        self.dauer.observe(dauer.as_secs_f64());
        Some(dauer)
    }

    pub fn laeuft(&self) -> bool {
        self.start.is_some()
    }

    pub fn letzte_dauer(&self) -> Option<Duration> {
        self.letzte_dauer
    }

    /// Summe aller gemessenen Laeufe
    pub fn gesamt(&self) -> Duration {
        Duration::from_secs_f64(self.dauer.get_sample_sum())
    }

    pub fn laeufe(&self) -> u64 {
        self.dauer.get_sample_count()
    }

    pub fn durchschnitt(&self) -> Option<Duration> {
        let laeufe = self.laeufe();
        (laeufe > 0).then(|| Duration::from_secs_f64(self.dauer.get_sample_sum() / laeufe as f64))
    }

    pub fn histogramm(&self) -> &Histogram {
        &self.dauer
    }
}
