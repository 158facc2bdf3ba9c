//! Integration-Tests fuer den Cube-Link (echte TCP-Verbindung auf Loopback)

use dotfield_core::types::{Coords, Face};
use dotfield_protocol::event::{HardwareAktivierung, HardwareEvent, ZellAufSeite};
use dotfield_protocol::wire::CubeCodec;
use dotfield_signaling::{CubeServer, HardwareSink, KanalHardwareSink, SignalingError};
use futures_util::StreamExt;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_util::codec::Framed;

async fn cube_server(sink: &KanalHardwareSink) -> (std::net::SocketAddr, watch::Sender<bool>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = CubeServer::neu(sink.clone(), addr);
    tokio::spawn(server.auf_listener(listener, shutdown_rx));
    (addr, shutdown_tx)
}

/// Wartet bis der Server die Cube-Verbindung abonniert hat
async fn auf_abonnenten_warten(sink: &KanalHardwareSink, anzahl: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while sink.empfaenger_anzahl() < anzahl {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("Cube wurde nicht abonniert");
}

#[tokio::test]
async fn cube_bekommt_hardware_events_als_zeilen() {
    let sink = KanalHardwareSink::default();
    let (addr, _shutdown) = cube_server(&sink).await;

    let stream = TcpStream::connect(addr).await.unwrap();
    let mut cube = Framed::new(stream, CubeCodec::new());
    auf_abonnenten_warten(&sink, 1).await;

    let aktivierung = HardwareEvent::Activate(HardwareAktivierung {
        start_color_index: 3,
        end_color_index: 7,
        coords: Coords::new(2, 5),
        face: Face::Back,
    });
    let nyan = HardwareEvent::Nyan(ZellAufSeite {
        coords: Coords::new(0, 7),
        face: Face::Top,
    });
    sink.senden(aktivierung);
    sink.senden(nyan);

    let erstes = cube.next().await.unwrap().unwrap();
    let zweites = cube.next().await.unwrap().unwrap();
    assert_eq!(erstes, aktivierung);
    assert_eq!(zweites, nyan);
}

#[tokio::test]
async fn mehrere_cubes_bekommen_dasselbe() {
    let sink = KanalHardwareSink::default();
    let (addr, _shutdown) = cube_server(&sink).await;

    let mut a = Framed::new(TcpStream::connect(addr).await.unwrap(), CubeCodec::new());
    let mut b = Framed::new(TcpStream::connect(addr).await.unwrap(), CubeCodec::new());
    auf_abonnenten_warten(&sink, 2).await;

    let event = HardwareEvent::Nyan(ZellAufSeite {
        coords: Coords::new(4, 4),
        face: Face::Left,
    });
    sink.senden(event);

    assert_eq!(a.next().await.unwrap().unwrap(), event);
    assert_eq!(b.next().await.unwrap().unwrap(), event);
}

#[tokio::test]
async fn getrennter_cube_wird_abgemeldet() {
    let sink = KanalHardwareSink::default();
    let (addr, _shutdown) = cube_server(&sink).await;

    let stream = TcpStream::connect(addr).await.unwrap();
    auf_abonnenten_warten(&sink, 1).await;
    drop(stream);

    tokio::time::timeout(Duration::from_secs(5), async {
        while sink.empfaenger_anzahl() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("Abonnement wurde nicht beendet");
}

#[tokio::test]
async fn belegter_port_ergibt_io_fehler() {
    let belegt = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = belegt.local_addr().unwrap();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let ergebnis = CubeServer::neu(KanalHardwareSink::default(), addr)
        .starten(shutdown_rx)
        .await;
    assert!(matches!(ergebnis, Err(SignalingError::Io(_))));
}
