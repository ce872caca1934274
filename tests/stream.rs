//! End-to-end producer/consumer tests: the background reader thread,
//! the latest-transform relay, and the console bridge.

mod common;

use common::*;
use mocap::{
    protocol, Client, Console, ConsoleCode, PreviewStream, StreamOptions, StreamStatus, Target,
};
use std::time::{Duration, Instant};

fn connect(addr: std::net::SocketAddr) -> Client {
    Client::connect(&addr.ip().to_string(), addr.port()).unwrap()
}

#[test]
fn stream_publishes_latest_transform_and_every_frame() {
    let q_last = [0.5f32, 0.5, 0.5, 0.5];
    let addr = spawn_service(move |mut stream| {
        send_greeting(&mut stream, "preview data service");
        for _ in 0..4 {
            let payload = preview_payload(&[(1, unit_preview_values([1.0, 0.0, 0.0, 0.0]))]);
            send_frame(&mut stream, &payload);
        }
        let payload = preview_payload(&[(1, unit_preview_values(q_last))]);
        send_frame(&mut stream, &payload);
        std::thread::sleep(Duration::from_secs(1));
    });

    let stream = PreviewStream::start(connect(addr), StreamOptions::default()).unwrap();

    // The channel delivers each frame in order.
    let mut frames = 0;
    while frames < 5 {
        let frame = stream.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(frame.len(), 1);
        frames += 1;
    }

    // The relay carries the transform of the most recent frame.
    let expected = protocol::quaternion_to_matrix(q_last);
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        if stream.snapshot() == Some(expected) {
            break;
        }
        assert!(Instant::now() < deadline, "relay never caught up");
        std::thread::sleep(Duration::from_millis(10));
    }

    stream.stop();
}

#[test]
fn stream_tracks_a_configured_device_key() {
    let addr = spawn_service(|mut stream| {
        send_greeting(&mut stream, "preview data service");
        let payload = preview_payload(&[
            (1, unit_preview_values([1.0, 0.0, 0.0, 0.0])),
            (2, unit_preview_values([0.0, 1.0, 0.0, 0.0])),
        ]);
        send_frame(&mut stream, &payload);
        std::thread::sleep(Duration::from_secs(1));
    });

    let options = StreamOptions {
        target: Target::Device(2),
        ..Default::default()
    };
    let stream = PreviewStream::start(connect(addr), options).unwrap();

    let frame = stream.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(frame.len(), 2);

    let expected = protocol::quaternion_to_matrix([0.0, 1.0, 0.0, 0.0]);
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        if stream.snapshot() == Some(expected) {
            break;
        }
        assert!(Instant::now() < deadline, "relay never published device 2");
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn stream_ends_cleanly_when_the_service_closes() {
    let addr = spawn_service(|mut stream| {
        send_greeting(&mut stream, "preview data service");
        let payload = preview_payload(&[(1, unit_preview_values([1.0, 0.0, 0.0, 0.0]))]);
        send_frame(&mut stream, &payload);
        // Then drop the connection.
    });

    let stream = PreviewStream::start(connect(addr), StreamOptions::default()).unwrap();

    let _ = stream.recv_timeout(Duration::from_secs(2)).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while stream.status() == StreamStatus::Live {
        assert!(Instant::now() < deadline, "worker never observed the close");
        std::thread::sleep(Duration::from_millis(20));
    }
    assert_eq!(stream.status(), StreamStatus::Ended);

    // The consumer side reports the stop rather than hanging.
    assert!(matches!(
        stream.recv_timeout(Duration::from_secs(1)),
        Err(mocap::Error::StreamStopped) | Err(mocap::Error::Timeout)
    ));
}

#[test]
fn stop_joins_the_worker_thread() {
    let addr = spawn_service(|mut stream| {
        send_greeting(&mut stream, "preview data service");
        // Idle connection; the worker sits in wait-for-data.
        std::thread::sleep(Duration::from_secs(5));
    });

    let options = StreamOptions {
        wait_timeout: Duration::from_millis(100),
        ..Default::default()
    };
    let stream = PreviewStream::start(connect(addr), options).unwrap();
    assert!(stream.is_active());

    let start = Instant::now();
    stream.stop();
    // One wait cycle at most, far less than the server's sleep.
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
fn skips_malformed_frame_and_keeps_reading() {
    let addr = spawn_service(|mut stream| {
        send_greeting(&mut stream, "preview data service");
        // Valid header, payload not a whole number of preview records.
        send_frame(&mut stream, &[0u8; 17]);
        let payload = preview_payload(&[(1, unit_preview_values([1.0, 0.0, 0.0, 0.0]))]);
        send_frame(&mut stream, &payload);
        std::thread::sleep(Duration::from_secs(1));
    });

    let stream = PreviewStream::start(connect(addr), StreamOptions::default()).unwrap();

    // The bad frame is skipped; the good one still arrives.
    let frame = stream.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(frame.keys().collect::<Vec<_>>(), vec![1]);
}

#[test]
fn console_round_trip() {
    let chunk = "node.scan() node.start() print('Reading from 3 device(s)')";
    let addr = spawn_service(move |mut stream| {
        send_greeting(&mut stream, "console service");

        let request = recv_frame(&mut stream);
        assert_eq!(String::from_utf8(request).unwrap(), chunk);

        let mut reply = vec![0u8]; // success
        reply.extend_from_slice(b"Reading from 3 device(s)\n");
        send_frame(&mut stream, &reply);
        std::thread::sleep(Duration::from_millis(500));
    });

    let mut console = Console::new(connect(addr));
    let reply = console
        .send_chunk(chunk, Some(Duration::from_secs(2)))
        .unwrap();

    assert_eq!(reply.code, ConsoleCode::Success);
    assert_eq!(reply.output, "Reading from 3 device(s)\n");
}

#[test]
fn console_reports_incomplete_and_failed_chunks() {
    let addr = spawn_service(|mut stream| {
        send_greeting(&mut stream, "console service");

        let _ = recv_frame(&mut stream);
        send_frame(&mut stream, &[1u8]); // continue, no output

        let _ = recv_frame(&mut stream);
        let mut reply = vec![2u8];
        reply.extend_from_slice(b"attempt to call a nil value");
        send_frame(&mut stream, &reply);
        std::thread::sleep(Duration::from_millis(500));
    });

    let mut console = Console::new(connect(addr));

    let reply = console.send_chunk("if x > 1 then", None).unwrap();
    assert_eq!(reply.code, ConsoleCode::Continue);
    assert!(reply.output.is_empty());

    let reply = console.send_chunk("nosuchfn()", None).unwrap();
    assert_eq!(reply.code, ConsoleCode::Failure);
    assert!(reply.output.contains("nil value"));
}
