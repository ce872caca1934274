//! Start device reading through the scripting console.
//!
//! Usage: cargo run --example console [host]

use mocap::{protocol, Client, Console, ConsoleCode};
use std::time::Duration;

fn main() {
    env_logger::init();

    let host = std::env::args().nth(1).unwrap_or_default();

    let client = match Client::connect(&host, protocol::PORT_CONSOLE) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to connect: {}", e);
            std::process::exit(1);
        }
    };

    println!("Connected to {}:{}", client.host(), client.port());

    // One chunk: scan for devices and start reading unless the service
    // is already doing so, then report how many devices are live.
    let chunk = "if not node.is_reading() then\
                 \n  node.close()\
                 \n  node.scan()\
                 \n  node.start()\
                 \nend\
                 \nif node.is_reading() then\
                 \n  print('Reading from ' .. node.num_reading() .. ' device(s)')\
                 \nelse\
                 \n  print('Failed to start reading')\
                 \nend";

    let mut console = Console::new(client);
    match console.send_chunk(chunk, Some(Duration::from_secs(5))) {
        Ok(reply) => match reply.code {
            ConsoleCode::Success => print!("{}", reply.output),
            ConsoleCode::Continue => eprintln!("incomplete chunk: {}", reply.output),
            ConsoleCode::Failure => eprintln!("command failed: {}", reply.output),
        },
        Err(e) => {
            eprintln!("Console exchange failed: {}", e);
            std::process::exit(1);
        }
    }
}
