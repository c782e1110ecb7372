//! Befehls-Encoder fuer das ServerQuery-Protokoll
//!
//! Baut eine Befehlszeile im Format:
//!   befehl [key=value ...] [-option ...] [key=v1 ...|key=v2 ...]
//!
//! Listenwertige Parameter erzeugen pro Element eine eigene Tabellenzeile.
//! Skalare Parameter stehen vor der ersten Zeile und gelten serverseitig
//! fuer alle Zeilen (Bulk-Befehle wie `clientkick clid=1|clid=2`).

use std::collections::BTreeMap;

use crate::escape::escape;
use crate::{TRENNER_LISTE, TRENNER_PAAR, TRENNER_ZELLE};

/// Ein Knoten (Server, Kanal, Client, Gruppe), der als Parameter ueber seine ID uebergeben wird
pub trait NodeId {
    fn node_id(&self) -> i64;
}

/// Ein einzelner Parameterwert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamWert {
    /// Wird nicht uebertragen
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl ParamWert {
    /// Wert eines Knotens (seine numerische ID)
    pub fn node<N: NodeId + ?Sized>(knoten: &N) -> Self {
        Self::Int(knoten.node_id())
    }

    /// Wire-Darstellung; `None` fuer Null-Werte
    fn kodieren(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Self::Int(n) => Some(n.to_string()),
            Self::Text(s) => Some(escape(s)),
        }
    }
}

impl From<bool> for ParamWert {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for ParamWert {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<i64> for ParamWert {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<u16> for ParamWert {
    fn from(n: u16) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<u32> for ParamWert {
    fn from(n: u32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<u64> for ParamWert {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(n) => Self::Int(n),
            Err(_) => Self::Text(n.to_string()),
        }
    }
}

impl From<&str> for ParamWert {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ParamWert {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&String> for ParamWert {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl<T: Into<ParamWert>> From<Option<T>> for ParamWert {
    fn from(wert: Option<T>) -> Self {
        wert.map_or(Self::Null, Into::into)
    }
}

/// Ein Befehlsparameter
#[derive(Debug, Clone, PartialEq, Eq)]
enum Parameter {
    Skalar(ParamWert),
    Liste(Vec<ParamWert>),
    /// `-uid`, `-virtual` usw., wird unveraendert uebertragen
    Option(String),
}

/// Ein ServerQuery-Befehl mit Parametern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    parameter: Vec<(Option<String>, Parameter)>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameter: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Benannter skalarer Parameter (`key=value`)
    pub fn param(mut self, key: &str, wert: impl Into<ParamWert>) -> Self {
        self.parameter
            .push((Some(key.to_lowercase()), Parameter::Skalar(wert.into())));
        self
    }

    /// Positionaler Parameter ohne Schluessel
    pub fn positional(mut self, wert: impl Into<ParamWert>) -> Self {
        self.parameter.push((None, Parameter::Skalar(wert.into())));
        self
    }

    /// Listenwertiger Parameter: Element `i` landet in Tabellenzeile `i`
    pub fn list<I, V>(mut self, key: &str, werte: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamWert>,
    {
        let werte = werte.into_iter().map(Into::into).collect();
        self.parameter
            .push((Some(key.to_lowercase()), Parameter::Liste(werte)));
        self
    }

    /// Knoten-Parameter (wird zur numerischen ID aufgeloest)
    pub fn node<N: NodeId + ?Sized>(self, key: &str, knoten: &N) -> Self {
        self.param(key, ParamWert::node(knoten))
    }

    /// Schalter ohne Wert, z.B. `option("uid")` -> `-uid`
    pub fn option(mut self, name: &str) -> Self {
        self.parameter
            .push((None, Parameter::Option(name.trim_start_matches('-').to_string())));
        self
    }

    /// Serialisiert den Befehl in eine einzelne Wire-Zeile (ohne Zeilenende)
    pub fn encode(&self) -> String {
        let mut args: Vec<String> = Vec::new();
        let mut zellen: BTreeMap<usize, Vec<String>> = BTreeMap::new();

        for (key, parameter) in &self.parameter {
            let praefix = key
                .as_ref()
                .map(|k| format!("{k}{TRENNER_PAAR}"))
                .unwrap_or_default();

            match parameter {
                Parameter::Skalar(wert) => {
                    if let Some(text) = wert.kodieren() {
                        args.push(format!("{praefix}{text}"));
                    }
                }
                Parameter::Liste(werte) => {
                    for (index, wert) in werte.iter().enumerate() {
                        if let Some(text) = wert.kodieren() {
                            zellen
                                .entry(index)
                                .or_default()
                                .push(format!("{praefix}{text}"));
                        }
                    }
                }
                Parameter::Option(name) => args.push(format!("-{name}")),
            }
        }

        let mut zeile = self.name.clone();
        if !args.is_empty() {
            zeile.push_str(TRENNER_ZELLE);
            zeile.push_str(&args.join(TRENNER_ZELLE));
        }
        if !zellen.is_empty() {
            let zeilen: Vec<String> = zellen
                .into_values()
                .map(|z| z.join(TRENNER_ZELLE))
                .collect();
            zeile.push_str(TRENNER_ZELLE);
            zeile.push_str(&zeilen.join(TRENNER_LISTE));
        }

        zeile.trim().to_string()
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}
