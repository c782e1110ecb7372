//! Verbundener UDP-Socket als Byte-Stream
//!
//! Ein Datagramm entspricht einem Lese- bzw. Schreibaufruf. Der Lesepuffer
//! muss gross genug fuer ein ganzes Datagramm sein, sonst wird abgeschnitten.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{lookup_host, UdpSocket};

/// Groesster Datagramm-Inhalt
pub(crate) const MAX_DATAGRAMM: usize = 65_507;

#[derive(Debug)]
pub struct UdpStream {
    socket: UdpSocket,
}

impl UdpStream {
    /// Bindet einen lokalen Socket passender Adressfamilie und verbindet ihn
    pub async fn verbinden(adresse: &str) -> io::Result<Self> {
        let ziel = lookup_host(adresse).await?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("Adresse '{adresse}' nicht aufloesbar"),
            )
        })?;

        let lokal = if ziel.is_ipv6() { "[::]:0" } else { "0.0.0.0:0" };
        let socket = UdpSocket::bind(lokal).await?;
        socket.connect(ziel).await?;
        tracing::debug!(lokal = ?socket.local_addr().ok(), %ziel, "UDP-Socket verbunden");

        Ok(Self { socket })
    }
}

impl AsyncRead for UdpStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.socket.poll_recv(cx, buf)
    }
}

impl AsyncWrite for UdpStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.socket.poll_send(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
