//! Escape-Grammatik des ServerQuery-Protokolls
//!
//! Jedes Zeichen, das im Wire-Format eine Bedeutung hat (Trennzeichen,
//! Backslash, Steuerzeichen), wird als Zwei-Zeichen-Sequenz uebertragen:
//!
//! | Literal | Sequenz |
//! |---------|---------|
//! | `\`     | `\\`    |
//! | `/`     | `\/`    |
//! | ` `     | `\s`    |
//! | `\|`    | `\p`    |
//! | BEL     | `\a`    |
//! | BS      | `\b`    |
//! | FF      | `\f`    |
//! | LF      | `\n`    |
//! | CR      | `\r`    |
//! | TAB     | `\t`    |
//! | VT      | `\v`    |
//!
//! Andere Backslash-Sequenzen bleiben beim Dekodieren unveraendert.

/// Escape-Tabelle: (Literal, Kennbuchstabe nach dem Backslash)
pub const ESCAPE_TABELLE: [(char, char); 11] = [
    ('\\', '\\'),
    ('/', '/'),
    (' ', 's'),
    ('|', 'p'),
    ('\u{07}', 'a'),
    ('\u{08}', 'b'),
    ('\u{0C}', 'f'),
    ('\n', 'n'),
    ('\r', 'r'),
    ('\t', 't'),
    ('\u{0B}', 'v'),
];

fn kennbuchstabe(literal: char) -> Option<char> {
    ESCAPE_TABELLE
        .iter()
        .find(|(l, _)| *l == literal)
        .map(|(_, k)| *k)
}

fn literal(kennbuchstabe: char) -> Option<char> {
    ESCAPE_TABELLE
        .iter()
        .find(|(_, k)| *k == kennbuchstabe)
        .map(|(l, _)| *l)
}

/// Kodiert einen Wert fuer die Uebertragung (Escape-Sequenzen einfuegen)
pub fn escape(s: &str) -> String {
    let mut ergebnis = String::with_capacity(s.len());
    for c in s.chars() {
        match kennbuchstabe(c) {
            Some(k) => {
                ergebnis.push('\\');
                ergebnis.push(k);
            }
            None => ergebnis.push(c),
        }
    }
    ergebnis
}

/// Dekodiert Escape-Sequenzen in einem Wert-String
///
/// Ein einzelner Durchlauf: bereits ersetzte Zeichen werden nie erneut
/// interpretiert, daher gilt `unescape(escape(s)) == s`.
pub fn unescape(s: &str) -> String {
    let mut ergebnis = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            ergebnis.push(c);
            continue;
        }
        match chars.peek().copied().and_then(literal) {
            Some(l) => {
                chars.next();
                ergebnis.push(l);
            }
            // Unbekannte Sequenz oder Backslash am Ende: unveraendert lassen
            None => ergebnis.push('\\'),
        }
    }

    ergebnis
}
