//! Load test for the explorer server.
//!
//! Spawns multiple fake explorer clients that:
//! - Open a reply listener and connect to the control port
//! - Periodically send random movement commands
//! - Receive and count MOVE acks and STATE broadcasts
//!
//! Usage: cargo run --bin loadtest -- [OPTIONS]
//!
//! Options:
//!   --clients N      Number of clients to spawn (default: 100)
//!   --duration S     Test duration in seconds (default: 30)
//!   --move-rate R    Movement commands per second per client (default: 5)
//!   --addr ADDR      Server control address (default: 127.0.0.1:12345)

use explorer_shared::protocol::{ControlMsg, Handshake, ServerMsg};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

// === Metrics ===

#[derive(Default)]
struct Metrics {
    connected: AtomicU64,
    messages_received: AtomicU64,
    states_received: AtomicU64,
    acks_received: AtomicU64,
    moves_sent: AtomicU64,
    errors: AtomicU64,
    total_entities_seen: AtomicU64,
    latency_sum_ms: AtomicU64,
    latency_count: AtomicU64,
}

// === Client task ===

async fn run_client(
    client_id: u32,
    addr: String,
    move_rate: f64,
    duration: Duration,
    metrics: Arc<Metrics>,
) {
    let connect_start = Instant::now();

    let reply_listener = match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Client {} could not open reply listener: {}", client_id, e);
            metrics.errors.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };
    let reply_port = match reply_listener.local_addr() {
        Ok(local) => local.port(),
        Err(e) => {
            eprintln!("Client {} reply listener has no address: {}", client_id, e);
            metrics.errors.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };

    let mut control = match TcpStream::connect(&addr).await {
        Ok(stream) => stream,
        Err(e) => {
            if client_id < 5 {
                eprintln!("Client {} failed to connect: {}", client_id, e);
            }
            metrics.errors.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };

    let mut rng = ChaCha8Rng::seed_from_u64(client_id as u64 * 12345 + 67890);
    let handshake = Handshake {
        reply_port,
        start_x: rng.gen_range(0.0..=1280.0),
        start_y: rng.gen_range(0.0..=720.0),
    };
    if control
        .write_all(format!("{}\n", handshake).as_bytes())
        .await
        .is_err()
    {
        metrics.errors.fetch_add(1, Ordering::Relaxed);
        return;
    }

    // Wait for the server to dial back
    let reply = match tokio::time::timeout(Duration::from_secs(5), reply_listener.accept()).await {
        Ok(Ok((stream, _))) => stream,
        Ok(Err(e)) => {
            eprintln!("Client {} reply accept failed: {}", client_id, e);
            metrics.errors.fetch_add(1, Ordering::Relaxed);
            return;
        }
        Err(_) => {
            if client_id < 3 {
                eprintln!("Client {} reply dial timeout", client_id);
            }
            metrics.errors.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };

    let connect_latency = connect_start.elapsed();
    metrics
        .latency_sum_ms
        .fetch_add(connect_latency.as_millis() as u64, Ordering::Relaxed);
    metrics.latency_count.fetch_add(1, Ordering::Relaxed);
    metrics.connected.fetch_add(1, Ordering::Relaxed);

    let move_interval = if move_rate > 0.0 {
        Duration::from_secs_f64(1.0 / move_rate)
    } else {
        Duration::from_secs(3600) // Effectively never
    };
    let mut move_timer = tokio::time::interval(move_interval);
    move_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut replies = BufReader::new(reply).lines();
    let test_end = tokio::time::sleep(duration);
    tokio::pin!(test_end);

    loop {
        tokio::select! {
            _ = &mut test_end => break,

            _ = move_timer.tick() => {
                let cmd = ControlMsg::ALL_MOVES[rng.gen_range(0..ControlMsg::ALL_MOVES.len())];
                if control.write_all(format!("{}\n", cmd).as_bytes()).await.is_ok() {
                    metrics.moves_sent.fetch_add(1, Ordering::Relaxed);
                } else {
                    metrics.errors.fetch_add(1, Ordering::Relaxed);
                    break;
                }
            }

            line = replies.next_line() => {
                match line {
                    Ok(Some(text)) => {
                        metrics.messages_received.fetch_add(1, Ordering::Relaxed);
                        match ServerMsg::parse(&text) {
                            Ok(ServerMsg::State(entities)) => {
                                metrics.states_received.fetch_add(1, Ordering::Relaxed);
                                metrics
                                    .total_entities_seen
                                    .fetch_add(entities.len() as u64, Ordering::Relaxed);
                            }
                            Ok(ServerMsg::Move { .. }) => {
                                metrics.acks_received.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(e) => {
                                if client_id < 3 {
                                    eprintln!(
                                        "Client {} got bad line {:?}: {}",
                                        client_id, text, e
                                    );
                                }
                                metrics.errors.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                    }
                    Ok(None) => {
                        if client_id < 3 {
                            eprintln!("Client {} reply stream ended", client_id);
                        }
                        break;
                    }
                    Err(e) => {
                        if client_id < 3 {
                            eprintln!("Client {} error: {}", client_id, e);
                        }
                        metrics.errors.fetch_add(1, Ordering::Relaxed);
                        break;
                    }
                }
            }
        }
    }

    let _ = control
        .write_all(format!("{}\n", ControlMsg::Exit).as_bytes())
        .await;
    metrics.connected.fetch_sub(1, Ordering::Relaxed);
}

// === Main ===

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut num_clients: u32 = 100;
    let mut duration_secs: u64 = 30;
    let mut move_rate: f64 = 5.0;
    let mut addr = "127.0.0.1:12345".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--clients" => {
                i += 1;
                num_clients = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(100);
            }
            "--duration" => {
                i += 1;
                duration_secs = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(30);
            }
            "--move-rate" => {
                i += 1;
                move_rate = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(5.0);
            }
            "--addr" => {
                i += 1;
                addr = args.get(i).cloned().unwrap_or(addr);
            }
            _ => {}
        }
        i += 1;
    }

    println!("=== Explorer Server Load Test ===");
    println!("Clients: {}", num_clients);
    println!("Duration: {}s", duration_secs);
    println!("Move rate: {}/s per client", move_rate);
    println!("Address: {}", addr);
    println!();

    let metrics = Arc::new(Metrics::default());
    let duration = Duration::from_secs(duration_secs);

    let mut handles = Vec::with_capacity(num_clients as usize);

    println!("Spawning {} clients...", num_clients);
    let spawn_start = Instant::now();

    for client_id in 0..num_clients {
        let addr = addr.clone();
        let metrics = Arc::clone(&metrics);

        handles.push(tokio::spawn(async move {
            run_client(client_id, addr, move_rate, duration, metrics).await;
        }));

        // Stagger spawns slightly to avoid thundering herd
        if client_id % 50 == 49 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    println!("All clients spawned in {:?}", spawn_start.elapsed());
    println!();

    let metrics_clone = Arc::clone(&metrics);
    let stats_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        let start = Instant::now();

        loop {
            interval.tick().await;
            let elapsed = start.elapsed().as_secs();
            if elapsed >= duration_secs + 5 {
                break;
            }

            println!(
                "[{:3}s] connected={}, msgs={}, states={}, acks={}, moves={}, errors={}",
                elapsed,
                metrics_clone.connected.load(Ordering::Relaxed),
                metrics_clone.messages_received.load(Ordering::Relaxed),
                metrics_clone.states_received.load(Ordering::Relaxed),
                metrics_clone.acks_received.load(Ordering::Relaxed),
                metrics_clone.moves_sent.load(Ordering::Relaxed),
                metrics_clone.errors.load(Ordering::Relaxed),
            );
        }
    });

    for handle in handles {
        let _ = handle.await;
    }

    stats_handle.abort();

    println!();
    println!("=== Final Results ===");
    let msgs = metrics.messages_received.load(Ordering::Relaxed);
    let states = metrics.states_received.load(Ordering::Relaxed);
    let acks = metrics.acks_received.load(Ordering::Relaxed);
    let moves = metrics.moves_sent.load(Ordering::Relaxed);
    let errors = metrics.errors.load(Ordering::Relaxed);
    let entities = metrics.total_entities_seen.load(Ordering::Relaxed);
    let latency_sum = metrics.latency_sum_ms.load(Ordering::Relaxed);
    let latency_count = metrics.latency_count.load(Ordering::Relaxed);

    println!("Total messages received: {}", msgs);
    println!("Total STATE messages: {}", states);
    println!("Total MOVE acks: {} (moves sent: {})", acks, moves);
    println!("Total errors: {}", errors);
    println!(
        "Average entities per STATE: {}",
        if states > 0 { entities / states } else { 0 }
    );

    if latency_count > 0 {
        println!("Average handshake latency: {}ms", latency_sum / latency_count);
    }

    let states_per_client = states as f64 / num_clients.max(1) as f64;
    let expected = duration_secs as f64 * 60.0; // 60 Hz broadcast

    println!();
    println!("Messages/sec (total): {:.0}", msgs as f64 / duration_secs.max(1) as f64);
    println!("STATE messages per client: {:.1}", states_per_client);
    println!("Expected per client: {:.1}", expected);
    if expected > 0.0 {
        println!("Delivery rate: {:.1}%", states_per_client / expected * 100.0);
    }
}
