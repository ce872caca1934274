//! Stream preview orientation data to stdout.
//!
//! Usage: cargo run --example stream [host]
//! Press Ctrl+C to stop.

use mocap::{protocol, Client, PreviewStream, StreamOptions};
use std::time::{Duration, Instant};

fn main() {
    env_logger::init();

    let host = std::env::args().nth(1).unwrap_or_default();

    let client = match Client::connect(&host, protocol::PORT_PREVIEW) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to connect: {}", e);
            std::process::exit(1);
        }
    };

    println!("Connected to {}:{}", client.host(), client.port());
    if let Some(description) = client.description() {
        println!("Service:  {}", description);
    }
    println!();

    let stream = match PreviewStream::start(client, StreamOptions::default()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to start stream: {}", e);
            std::process::exit(1);
        }
    };

    println!("Streaming preview data (Ctrl+C to stop)...");

    let start = Instant::now();
    let mut count: u64 = 0;

    loop {
        match stream.recv_timeout(Duration::from_secs(10)) {
            Ok(frame) => {
                count += 1;

                // Print every ~100th frame to avoid flooding the terminal
                if count % 100 == 1 {
                    for (key, element) in frame.iter() {
                        let [w, x, y, z] = element.quaternion(false);
                        println!(
                            "Gq({}) = ({:+.4}, {:+.4}i, {:+.4}j, {:+.4}k)",
                            key, w, x, y, z
                        );
                    }
                    if let Some(matrix) = stream.snapshot() {
                        println!("latest transform row 0 = {:?}", &matrix[0..4]);
                    }
                }
            }
            Err(mocap::Error::Timeout) => {
                eprintln!("Timeout waiting for preview data");
                break;
            }
            Err(e) => {
                eprintln!("Stream ended: {}", e);
                break;
            }
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    println!(
        "\nTotal: {} frames in {:.1}s ({:.1} Hz)",
        count,
        elapsed,
        count as f64 / elapsed
    );
}
