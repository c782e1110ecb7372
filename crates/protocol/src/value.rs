//! Werte und Tabellenzeilen aus dekodierten Antworten

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};
use crate::escape::unescape;

/// Ein einzelner Wert einer Antwortzeile
///
/// Ganzzahlen werden nur erkannt, wenn der Text exakt der kanonischen
/// Dezimaldarstellung entspricht (`"007"` oder `"+1"` bleiben Text).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Wert {
    /// Schluessel ohne Wert (`-flag` oder `key` ohne `=`)
    Null,
    Int(i64),
    Text(String),
}

impl Wert {
    /// Erzeugt einen Wert aus Wire-Text
    ///
    /// Mit `dekodieren = false` bleibt Text in escaptem Zustand.
    pub fn aus_wire(roh: &str, dekodieren: bool) -> Self {
        match kanonische_ganzzahl(roh) {
            Some(n) => Self::Int(n),
            None if dekodieren => Self::Text(unescape(roh)),
            None => Self::Text(roh.to_string()),
        }
    }

    pub fn als_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn als_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn ist_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl std::fmt::Display for Wert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Wert {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for Wert {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Wert {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Prueft ob `s` die kanonische Dezimaldarstellung einer Ganzzahl ist
pub fn kanonische_ganzzahl(s: &str) -> Option<i64> {
    let n = s.parse::<i64>().ok()?;
    (n.to_string() == s).then_some(n)
}

/// Eine Tabellenzeile: geordnete Zuordnung Schluessel -> Wert
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Zeile {
    felder: IndexMap<String, Wert>,
}

impl Zeile {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Fuegt ein Feld ein; ein doppelter Schluessel ueberschreibt den Wert
    pub fn einfuegen(&mut self, schluessel: impl Into<String>, wert: impl Into<Wert>) {
        self.felder.insert(schluessel.into(), wert.into());
    }

    pub fn get(&self, schluessel: &str) -> Option<&Wert> {
        self.felder.get(schluessel)
    }

    /// Gibt ein Feld zurueck oder `FehlenderSchluessel`
    pub fn wert(&self, schluessel: &str) -> ProtocolResult<&Wert> {
        self.get(schluessel)
            .ok_or_else(|| ProtocolError::FehlenderSchluessel(schluessel.to_string()))
    }

    /// Gibt ein Ganzzahl-Feld zurueck
    pub fn get_int(&self, schluessel: &str) -> ProtocolResult<i64> {
        self.wert(schluessel)?
            .als_int()
            .ok_or_else(|| ProtocolError::FalscherTyp {
                schluessel: schluessel.to_string(),
                erwartet: "Ganzzahl",
            })
    }

    /// Gibt ein Text-Feld zurueck (Ganzzahlen und Null sind ein Typfehler)
    pub fn get_str(&self, schluessel: &str) -> ProtocolResult<&str> {
        self.wert(schluessel)?
            .als_str()
            .ok_or_else(|| ProtocolError::FalscherTyp {
                schluessel: schluessel.to_string(),
                erwartet: "Text",
            })
    }

    /// Gibt ein beliebiges Feld als Text zurueck
    ///
    /// Nuetzlich fuer Felder wie Spitznamen, die zufaellig rein numerisch sein koennen.
    pub fn get_string(&self, schluessel: &str) -> ProtocolResult<String> {
        Ok(self.wert(schluessel)?.to_string())
    }

    pub fn contains_key(&self, schluessel: &str) -> bool {
        self.felder.contains_key(schluessel)
    }

    pub fn len(&self) -> usize {
        self.felder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.felder.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.felder.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Wert)> {
        self.felder.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Wert)> for Zeile {
    fn from_iter<I: IntoIterator<Item = (String, Wert)>>(iter: I) -> Self {
        Self {
            felder: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Zeile {
    type Item = (String, Wert);
    type IntoIter = indexmap::map::IntoIter<String, Wert>;

    fn into_iter(self) -> Self::IntoIter {
        self.felder.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kanonische_ganzzahlen() {
        assert_eq!(kanonische_ganzzahl("0"), Some(0));
        assert_eq!(kanonische_ganzzahl("42"), Some(42));
        assert_eq!(kanonische_ganzzahl("-7"), Some(-7));
    }

    #[test]
    fn nicht_kanonische_zahlen_bleiben_text() {
        assert_eq!(kanonische_ganzzahl("007"), None);
        assert_eq!(kanonische_ganzzahl("+1"), None);
        assert_eq!(kanonische_ganzzahl("-0"), None);
        assert_eq!(kanonische_ganzzahl("3.0.13"), None);
        assert_eq!(kanonische_ganzzahl(" 1"), None);
        assert_eq!(kanonische_ganzzahl(""), None);
        assert_eq!(kanonische_ganzzahl("99999999999999999999"), None);
    }

    #[test]
    fn wert_aus_wire() {
        assert_eq!(Wert::aus_wire("12", true), Wert::Int(12));
        assert_eq!(Wert::aus_wire(r"a\sb", true), Wert::Text("a b".into()));
        assert_eq!(Wert::aus_wire(r"a\sb", false), Wert::Text(r"a\sb".into()));
    }

    #[test]
    fn typisierte_zugriffe() {
        let mut zeile = Zeile::neu();
        zeile.einfuegen("clid", 5_i64);
        zeile.einfuegen("client_nickname", "Gast");
        zeile.einfuegen("flag", Wert::Null);

        assert_eq!(zeile.get_int("clid").unwrap(), 5);
        assert_eq!(zeile.get_str("client_nickname").unwrap(), "Gast");
        assert_eq!(zeile.get_string("clid").unwrap(), "5");
        assert!(zeile.get("flag").unwrap().ist_null());

        assert!(matches!(
            zeile.get_int("fehlt"),
            Err(ProtocolError::FehlenderSchluessel(_))
        ));
        assert!(matches!(
            zeile.get_int("client_nickname"),
            Err(ProtocolError::FalscherTyp { .. })
        ));
    }

    #[test]
    fn reihenfolge_bleibt_erhalten() {
        let mut zeile = Zeile::neu();
        zeile.einfuegen("z", 1_i64);
        zeile.einfuegen("a", 2_i64);
        let keys: Vec<&str> = zeile.keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn zeile_als_json() {
        let mut zeile = Zeile::neu();
        zeile.einfuegen("virtualserver_id", 1_i64);
        zeile.einfuegen("virtualserver_name", "TeamSpeak ]I[ Server");
        let json = serde_json::to_string(&zeile).unwrap();
        assert_eq!(
            json,
            r#"{"virtualserver_id":1,"virtualserver_name":"TeamSpeak ]I[ Server"}"#
        );
    }
}
