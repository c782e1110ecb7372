//! TLS ueber TCP
//!
//! Nutzt die WebPKI-Roots und optional zusaetzliche CA-Zertifikate aus einer
//! PEM-Datei (fuer Server mit selbstsignierten Zertifikaten).

use std::io::BufReader;
use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

use crate::error::{ClientError, ClientResult};

/// Erstellt einen TLS-Connector mit WebPKI-Roots (+ optionaler CA-Datei)
pub(crate) fn connector_erstellen(ca_datei: Option<&str>) -> ClientResult<TlsConnector> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    if let Some(pfad) = ca_datei {
        let hinzugefuegt = ca_laden(&mut roots, pfad)?;
        tracing::debug!(pfad, zertifikate = hinzugefuegt, "Zusaetzliche CA-Zertifikate geladen");
    }

    let tls_config = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| ClientError::Tls(format!("TLS-Konfiguration ungueltig: {e}")))?
    .with_root_certificates(roots)
    .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(tls_config)))
}

/// Liest alle Zertifikate einer PEM-Datei in den Root-Store
fn ca_laden(roots: &mut RootCertStore, pfad: &str) -> ClientResult<usize> {
    let datei = std::fs::File::open(pfad)
        .map_err(|e| ClientError::Tls(format!("CA-Datei '{pfad}' nicht lesbar: {e}")))?;
    let mut reader = BufReader::new(datei);

    let mut anzahl = 0;
    for zertifikat in rustls_pemfile::certs(&mut reader) {
        let zertifikat = zertifikat
            .map_err(|e| ClientError::Tls(format!("CA-Datei '{pfad}' fehlerhaft: {e}")))?;
        roots
            .add(zertifikat)
            .map_err(|e| ClientError::Tls(format!("Zertifikat in '{pfad}' abgelehnt: {e}")))?;
        anzahl += 1;
    }

    if anzahl == 0 {
        return Err(ClientError::Tls(format!(
            "CA-Datei '{pfad}' enthaelt keine Zertifikate"
        )));
    }
    Ok(anzahl)
}

/// Servername fuer SNI und Zertifikatspruefung (DNS-Name oder IP)
pub(crate) fn server_name(host: &str) -> ClientResult<ServerName<'static>> {
    ServerName::try_from(host.to_string())
        .map_err(|e| ClientError::Tls(format!("Ungueltiger Servername '{host}': {e}")))
}
