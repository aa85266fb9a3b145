use rasn::prelude::ObjectIdentifier;
use rasn_snmp::v2::Pdus;
use rasn_snmp::v2c::Message;
use snmp_trapgen::emitter::{self, EmitterConfig};
use snmp_trapgen::trap::{self, COLD_START};
use snmp_trapgen::ObjectIdentifierExt;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

/// Collects `expected` datagrams with their arrival times.
fn collect(socket: UdpSocket, expected: usize) -> JoinHandle<Vec<(Instant, Vec<u8>)>> {
    tokio::spawn(async move {
        let mut received = Vec::with_capacity(expected);
        let mut buf = vec![0u8; 65535];
        while received.len() < expected {
            let len = socket.recv(&mut buf).await.unwrap();
            received.push((Instant::now(), buf[..len].to_vec()));
        }
        received
    })
}

#[tokio::test]
async fn receiver_gets_one_cold_start_per_count() {
    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let port = socket.local_addr().unwrap().port();
    let receiver = collect(socket, 3);

    let config = EmitterConfig {
        target: "127.0.0.1".to_string(),
        port,
        community: "public".to_string(),
        source_ip: Ipv4Addr::new(192, 0, 2, 1),
        count: 3,
        rate: 10,
    };
    let summary = emitter::run(&config, |_| {}).await.unwrap();
    assert_eq!(summary.sent, 3);
    assert_eq!(summary.failed, 0);
    // Three sends, each followed by a 100ms pause.
    assert!(summary.elapsed >= Duration::from_millis(300));

    let received = tokio::time::timeout(Duration::from_secs(5), receiver)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(received.len(), 3);

    let cold_start = ObjectIdentifier::parse(COLD_START).unwrap();
    let mut payloads = Vec::new();
    for (_, bytes) in &received {
        let message: Message<Pdus> = rasn::ber::decode(bytes).unwrap();
        assert_eq!(&message.community[..], b"public");
        let Pdus::Trap(pdu) = message.data else {
            panic!("expected an SNMPv2-Trap-PDU");
        };
        let bindings = pdu.0.variable_bindings;
        assert_eq!(trap::trap_oid(&bindings), Some(&cold_start));
        // Skip sysUpTime.0, which advances between sends.
        payloads.push(bindings[1..].to_vec());
    }
    assert!(payloads.windows(2).all(|pair| pair[0] == pair[1]));

    for pair in received.windows(2) {
        assert!(pair[1].0 - pair[0].0 >= Duration::from_millis(90));
    }
}

#[tokio::test]
async fn zero_count_connects_and_sends_nothing() {
    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let port = socket.local_addr().unwrap().port();

    let summary = emitter::run(
        &EmitterConfig {
            port,
            count: 0,
            ..Default::default()
        },
        |_| {},
    )
    .await
    .unwrap();
    assert_eq!(summary.sent, 0);

    let mut buf = [0u8; 16];
    let nothing = tokio::time::timeout(Duration::from_millis(100), socket.recv(&mut buf)).await;
    assert!(nothing.is_err());
}
