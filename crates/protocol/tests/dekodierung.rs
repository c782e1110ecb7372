//! Integration-Tests fuer Encoder und Dekoder

use ts3query_protocol::{Command, Reply, Wert, escape, unescape};

const OK: &str = "error id=0 msg=ok";

#[test]
fn befehl_und_antwort_mit_sonderzeichen() {
    let name = "Raum 1 | Musik/Talk";
    let befehl = Command::new("channelcreate").param("channel_name", name).encode();
    assert_eq!(befehl, r"channelcreate channel_name=Raum\s1\s\p\sMusik\/Talk");

    // Der Server spiegelt den Namen escaped zurueck
    let zeile = format!("cid=12 channel_name={}", escape(name));
    let antwort = Reply::decode(&[zeile.as_str(), OK], &befehl).unwrap();
    let kanal = antwort.to_row().unwrap();
    assert_eq!(kanal.get_int("cid").unwrap(), 12);
    assert_eq!(kanal.get_str("channel_name").unwrap(), name);
    assert_eq!(antwort.command(), befehl);
}

#[test]
fn ereignis_daten_und_fehler_in_einer_antwort() {
    let zeilen = [
        "notifyclientleftview cfid=1 ctid=0 reasonid=8 reasonmsg=leaving clid=9",
        "clid=1 cid=1 client_nickname=serveradmin client_type=1",
        "error id=0 msg=ok return_code=r42",
    ];
    let antwort = Reply::decode(&zeilen, "clientlist").unwrap();

    assert_eq!(antwort.events().len(), 1);
    assert_eq!(antwort.events()[0].data().get_int("clid").unwrap(), 9);
    assert_eq!(antwort.raw(), zeilen[1]);
    assert_eq!(antwort.error().return_code.as_deref(), Some("r42"));
    assert_eq!(antwort.to_array().len(), 1);
}

#[test]
fn zahlenaehnliche_bezeichner_bleiben_text() {
    let antwort = Reply::decode(
        &[r"client_unique_identifier=0123 client_version=3.6.1 client_database_id=17", OK],
        "clientinfo",
    )
    .unwrap();
    let zeile = antwort.to_row().unwrap();
    assert_eq!(zeile.get("client_unique_identifier"), Some(&Wert::Text("0123".into())));
    assert_eq!(zeile.get("client_version"), Some(&Wert::Text("3.6.1".into())));
    assert_eq!(zeile.get("client_database_id"), Some(&Wert::Int(17)));
}

#[test]
fn escape_tabelle_vollstaendig() {
    let alles = "\\/ |\u{07}\u{08}\u{0C}\n\r\t\u{0B}";
    let kodiert = escape(alles);
    assert_eq!(kodiert, r"\\\/\s\p\a\b\f\n\r\t\v");
    assert_eq!(unescape(&kodiert), alles);
}
