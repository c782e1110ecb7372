//! Integrationstests fuer den ServerQuery-Adapter mit geskripteten Streams

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio_test::io::{Builder, Mock};

use ts3query_client::protocol::ProtocolError;
use ts3query_client::{
    Adapter, ClientError, Command, ServerQuery, SignalBus, SignalDaten, Transport,
    VerbindungsKonfig, Zustand,
};

const BANNER: &[u8] =
    b"TS3\nWelcome to the TeamSpeak 3 ServerQuery interface, type \"help\" for a list of commands.\n";

fn konfig() -> VerbindungsKonfig {
    VerbindungsKonfig::neu("127.0.0.1", 10011)
}

fn nicht_blockierend() -> VerbindungsKonfig {
    let mut k = konfig();
    k.blocking = false;
    k.timeout = 1;
    k
}

async fn verbinden(k: VerbindungsKonfig, mock: Mock, signale: SignalBus) -> ServerQuery {
    ServerQuery::from_transport(Transport::from_stream(k, mock, signale))
        .await
        .unwrap()
}

/// Trennt ohne `quit`, damit der Mock keine weiteren Schreibvorgaenge erwartet
async fn ohne_quit_beenden(mut sq: ServerQuery) {
    sq.transport_mut().disconnect().await;
    sq.close().await;
}

/// Sammelt alle Signalnamen in Emissionsreihenfolge
fn mitschreiben(signale: &SignalBus, namen: &[&str]) -> Arc<Mutex<Vec<String>>> {
    let protokoll = Arc::new(Mutex::new(Vec::new()));
    for name in namen {
        let p = Arc::clone(&protokoll);
        let signal = name.to_string();
        signale
            .subscribe(name, move |_| {
                p.lock().unwrap().push(signal.clone());
                Ok(())
            })
            .unwrap();
    }
    protokoll
}

#[tokio::test]
async fn banner_und_login() {
    let mock = Builder::new()
        .read(BANNER)
        .write(b"login serveradmin secret\n")
        .read(b"error id=0 msg=ok\n")
        .write(b"quit\n")
        .read(b"error id=0 msg=ok\n")
        .build();

    let signale = SignalBus::neu();
    let protokoll = mitschreiben(
        &signale,
        &[
            "serverqueryConnected",
            "serverqueryCommandStarted",
            "serverqueryCommandFinished",
            "serverqueryDisconnected",
        ],
    );

    let mut sq = verbinden(konfig(), mock, signale).await;
    let antwort = sq.request("login serveradmin secret").await.unwrap();

    assert_eq!(antwort.error().id, 0);
    assert_eq!(antwort.error().msg, "ok");
    assert!(antwort.is_empty());
    assert_eq!(sq.query_count(), 1);

    sq.close().await;
    assert_eq!(sq.zustand(), Zustand::Geschlossen);
    assert!(!sq.is_connected());
    assert_eq!(
        *protokoll.lock().unwrap(),
        vec![
            "serverqueryConnected",
            "serverqueryCommandStarted",
            "serverqueryCommandFinished",
            // quit beim Schliessen
            "serverqueryCommandStarted",
            "serverqueryCommandFinished",
            "serverqueryDisconnected",
        ]
    );
}

#[tokio::test]
async fn zeilenumbruch_wird_vor_dem_senden_abgelehnt() {
    // Kein Write im Skript: jeder Schreibversuch wuerde den Test scheitern lassen
    let mock = Builder::new().read(BANNER).build();
    let signale = SignalBus::neu();
    let gesendet = mitschreiben(&signale, &["serverqueryDataSend"]);
    let mut sq = verbinden(konfig(), mock, signale).await;

    let e = sq.request("login serveradmin\nsecret").await.unwrap_err();
    assert!(matches!(
        e,
        ClientError::Protokoll(ProtocolError::UnerlaubteZeichen(_))
    ));
    let e = sq.request_unchecked("version\r").await.unwrap_err();
    assert!(matches!(
        e,
        ClientError::Protokoll(ProtocolError::UnerlaubteZeichen(_))
    ));

    assert!(gesendet.lock().unwrap().is_empty());
    assert_eq!(sq.query_count(), 0);
    assert_eq!(sq.zustand(), Zustand::Bereit);
    ohne_quit_beenden(sq).await;
}

#[tokio::test]
async fn help_ist_gesperrt() {
    let mock = Builder::new().read(BANNER).build();
    let mut sq = verbinden(konfig(), mock, SignalBus::neu()).await;

    match sq.request("help").await {
        Err(ClientError::ServerQuery { id, msg, .. }) => {
            assert_eq!(id, 0x100);
            assert_eq!(msg, "command not found");
        }
        andere => panic!("unerwartet: {andere:?}"),
    }
    ohne_quit_beenden(sq).await;
}

#[tokio::test]
async fn ereignisse_zwischen_antwortzeilen() {
    let mock = Builder::new()
        .read(BANNER)
        .write(b"clientlist\n")
        .read(
            b"notifycliententerview cfid=0 ctid=1 reasonid=0 clid=7 client_nickname=Gast\n\
              clid=1 cid=1 client_nickname=serveradmin|clid=7 cid=1 client_nickname=Gast\n\
              error id=0 msg=ok\n",
        )
        .build();

    let signale = SignalBus::neu();
    let protokoll = mitschreiben(&signale, &["notifyEvent", "notifyCliententerview"]);
    let nicknames = Arc::new(Mutex::new(Vec::new()));
    let n = Arc::clone(&nicknames);
    signale
        .subscribe("notifyCliententerview", move |daten| {
            if let SignalDaten::Ereignis(ereignis) = daten {
                n.lock()
                    .unwrap()
                    .push(ereignis.data().get_string("client_nickname")?);
            }
            Ok(())
        })
        .unwrap();

    let mut sq = verbinden(konfig(), mock, signale).await;
    let antwort = sq.request("clientlist").await.unwrap();

    let clients = antwort.to_array();
    assert_eq!(clients.len(), 2);
    assert_eq!(clients[0].get_string("client_nickname").unwrap(), "serveradmin");
    assert_eq!(clients[1].get_int("clid").unwrap(), 7);

    assert_eq!(antwort.events().len(), 1);
    assert_eq!(antwort.events()[0].typ(), "cliententerview");
    assert_eq!(
        *protokoll.lock().unwrap(),
        vec!["notifyEvent", "notifyCliententerview"]
    );
    assert_eq!(*nicknames.lock().unwrap(), vec!["Gast"]);
    ohne_quit_beenden(sq).await;
}

#[tokio::test]
async fn fehlende_berechtigung_mit_namen() {
    let mock = Builder::new()
        .read(BANNER)
        .write(b"clientkick reasonid=5 clid=7\n")
        .read(b"error id=2568 msg=insufficient\\sclient\\spermissions failed_permid=143\n")
        .write(b"permissionlist\n")
        .read(
            b"permid=142 permname=i_client_kick_from_channel_power permdesc=Kick\\sfrom\\schannel|\
              permid=143 permname=i_client_kick_from_server_power permdesc=Kick\\sfrom\\sserver\n\
              error id=0 msg=ok\n",
        )
        .build();
    let mut sq = verbinden(konfig(), mock, SignalBus::neu()).await;

    let befehl = Command::new("clientkick").param("reasonid", 5).list("clid", [7]);
    match sq.execute(&befehl).await {
        Err(ClientError::ServerQuery { id, msg, .. }) => {
            assert_eq!(id, 2568);
            assert_eq!(
                msg,
                "insufficient client permissions (failed on i_client_kick_from_server_power)"
            );
        }
        andere => panic!("unerwartet: {andere:?}"),
    }
    ohne_quit_beenden(sq).await;
}

#[tokio::test]
async fn fehlende_berechtigung_ohne_nachschlagen() {
    let mock = Builder::new()
        .read(BANNER)
        .write(b"serveredit virtualserver_name=x\n")
        .read(b"error id=2568 msg=insufficient\\sclient\\spermissions failed_permid=143\n")
        .write(b"permissionlist\n")
        .read(b"error id=2568 msg=insufficient\\sclient\\spermissions failed_permid=4353\n")
        .build();
    let mut sq = verbinden(konfig(), mock, SignalBus::neu()).await;

    let e = sq.request("serveredit virtualserver_name=x").await.unwrap_err();
    assert_eq!(
        e.to_string(),
        "insufficient client permissions (failed on permid 143/0x8F) (Fehler-ID 0xa08)"
    );
    assert_eq!(e.fehler_code(), Some(0xa08));
    ohne_quit_beenden(sq).await;
}

#[tokio::test]
async fn eigener_motd_praefix_wird_verworfen() {
    let mut k = konfig();
    k.motd_praefix = Some("Hinweis".into());
    let mock = Builder::new()
        .read(b"TS3\nHinweis: Wartung um 3 Uhr\n")
        .write(b"version\n")
        .read(b"version=3.13.7 build=1655727713 platform=Linux\nerror id=0 msg=ok\n")
        .build();
    let mut sq = verbinden(k, mock, SignalBus::neu()).await;

    let antwort = sq.request("version").await.unwrap();
    assert_eq!(antwort.to_array().len(), 1);
    assert_eq!(antwort.to_row().unwrap().get_string("platform").unwrap(), "Linux");
    ohne_quit_beenden(sq).await;
}

#[tokio::test]
async fn ungueltiges_banner() {
    let mock = Builder::new().read(b"SSH-2.0-OpenSSH_9.6\n").build();
    let e = ServerQuery::from_transport(Transport::from_stream(konfig(), mock, SignalBus::neu()))
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        ClientError::Protokoll(ProtocolError::UngueltigesBanner(ref zeile)) if zeile == "SSH-2.0-OpenSSH_9.6"
    ));
}

#[tokio::test]
async fn eigene_protokollkennung() {
    let mut k = konfig();
    k.protokoll_kennung = Some("MyQuery".into());
    let mock = Builder::new().read(b"MyQuery 1.0\n").build();
    let sq = verbinden(k, mock, SignalBus::neu()).await;

    assert_eq!(sq.kennung(), "MyQuery 1.0");
    ohne_quit_beenden(sq).await;
}

#[tokio::test]
async fn teaspeak_banner() {
    let mock = Builder::new()
        .read(b"TeaSpeak\nTeaSpeak Query Interface\n")
        .write(b"whoami\n")
        .read(b"virtualserver_status=unknown client_id=0\nerror id=0 msg=ok\n")
        .build();
    let mut sq = verbinden(konfig(), mock, SignalBus::neu()).await;

    let antwort = sq.request("whoami").await.unwrap();
    assert_eq!(antwort.to_lines(), vec!["virtualserver_status=unknown client_id=0"]);
    ohne_quit_beenden(sq).await;
}

#[tokio::test]
async fn wait_im_blockierenden_modus() {
    let mock = Builder::new().read(BANNER).build();
    let mut sq = verbinden(konfig(), mock, SignalBus::neu()).await;

    assert!(matches!(sq.wait().await, Err(ClientError::Adapter(_))));
    ohne_quit_beenden(sq).await;
}

#[tokio::test]
async fn wait_liefert_naechstes_ereignis() {
    let mock = Builder::new()
        .read(BANNER)
        .read(b"notifytextmessage targetmode=3 msg=Hallo\\sWelt invokerid=1 invokername=admin\n")
        .build();
    let signale = SignalBus::neu();
    let protokoll = mitschreiben(&signale, &["notifyEvent", "notifyTextmessage"]);
    let mut sq = verbinden(nicht_blockierend(), mock, signale).await;

    let ereignis = sq.wait().await.unwrap();
    assert_eq!(ereignis.typ(), "textmessage");
    assert_eq!(ereignis.data().get_string("msg").unwrap(), "Hallo Welt");
    assert_eq!(ereignis.data().get_int("targetmode").unwrap(), 3);
    assert_eq!(
        *protokoll.lock().unwrap(),
        vec!["notifyEvent", "notifyTextmessage"]
    );

    // Nicht-blockierend wird beim Schliessen kein quit gesendet
    sq.close().await;
    assert_eq!(sq.zustand(), Zustand::Geschlossen);
}

#[tokio::test]
async fn keepalive_antwort_wird_vor_naechstem_befehl_verworfen() {
    tokio::time::pause();

    let mock = Builder::new()
        .read(BANNER)
        .write(b"whoami\n")
        .read(b"notifytextmessage targetmode=3 msg=hi invokerid=1\n")
        .read(b"virtualserver_status=online client_id=1\nerror id=0 msg=ok\n")
        .write(b"version\n")
        .read(b"version=3.13.7 build=1655727713 platform=Linux\nerror id=0 msg=ok\n")
        .build();

    let signale = SignalBus::neu();
    let gesendet = Arc::new(AtomicBool::new(false));
    let zeitlimits = Arc::new(AtomicUsize::new(0));
    let (g, z) = (Arc::clone(&gesendet), Arc::clone(&zeitlimits));
    signale
        .subscribe("serverqueryWaitTimeout", move |daten| {
            z.fetch_add(1, Ordering::SeqCst);
            if let SignalDaten::Zeitlimit { ausgang, .. } = daten {
                if !g.swap(true, Ordering::SeqCst) {
                    ausgang.senden("whoami");
                }
            }
            Ok(())
        })
        .unwrap();

    let mut sq = verbinden(nicht_blockierend(), mock, signale).await;

    let ereignis = sq.wait().await.unwrap();
    assert_eq!(ereignis.typ(), "textmessage");
    assert_eq!(zeitlimits.load(Ordering::SeqCst), 1);

    // Die whoami-Antwort darf nicht als Antwort auf version gelten
    let antwort = sq.request("version").await.unwrap();
    assert_eq!(antwort.to_row().unwrap().get_string("version").unwrap(), "3.13.7");
    assert_eq!(sq.query_count(), 1);

    sq.close().await;
}

#[tokio::test]
async fn snapshot_und_reconnect_ueber_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let mut befehle = Vec::new();
        for _ in 0..2 {
            let (sock, _) = listener.accept().await.unwrap();
            let (lesen, mut schreiben) = sock.into_split();
            schreiben.write_all(BANNER).await.unwrap();

            let mut zeilen = BufReader::new(lesen).lines();
            let befehl = zeilen.next_line().await.unwrap().unwrap();
            schreiben.write_all(b"error id=0 msg=ok\n").await.unwrap();
            befehle.push(befehl);
        }
        befehle
    });

    let konfig = VerbindungsKonfig::neu("127.0.0.1", port);
    let mut sq = ServerQuery::connect(konfig.clone(), SignalBus::neu()).await.unwrap();
    let json = sq.snapshot().to_json().unwrap();
    sq.close().await;

    let snapshot = ts3query_client::KonfigSnapshot::from_json(&json).unwrap();
    assert_eq!(snapshot.konfig, konfig);
    let mut sq = ServerQuery::reconnect(snapshot, SignalBus::neu()).await.unwrap();
    assert_eq!(sq.zustand(), Zustand::Bereit);
    sq.close().await;

    assert_eq!(server.await.unwrap(), vec!["quit", "quit"]);
}
