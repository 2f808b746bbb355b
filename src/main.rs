// Demo: keep one TCP connection pooled and write to it once a second.
//
// Run: cargo run -- 127.0.0.1:38888
// Logging follows RUST_LOG, e.g. RUST_LOG=general_pool=debug,info

use general_pool::{Backoff, ConnectionPool, PoolConfiguration};
use std::io::{self, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "127.0.0.1:38888";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_ADDR.to_string());

    let dial_addr = addr.clone();
    let config = PoolConfiguration::<TcpStream, io::Error>::new()
        .with_min_size(1)
        .with_max_size(1)
        .with_max_idle(1)
        .with_idle_timeout(Duration::from_secs(30))
        .with_factory(move || {
            let stream = TcpStream::connect(&dial_addr)?;
            info!(addr = %dial_addr, "connection established");
            Ok(stream)
        })
        .with_closer(|stream| stream.shutdown(Shutdown::Both))
        .with_prober(|stream| (&*stream).write_all(b"ping\n"));

    let pool = match ConnectionPool::new(config) {
        Ok(pool) => Arc::new(pool),
        Err(e) => {
            error!(%addr, error = %e, "could not create pool");
            return;
        }
    };

    let monitor = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || {
            while !pool.is_closed() {
                thread::sleep(Duration::from_secs(1));
                info!(size = pool.size(), open = pool.open_count(), "pool status");
            }
        })
    };

    let worker = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || {
            let mut backoff = Backoff::new()
                .with_jitter(true)
                .with_max_delay(Duration::from_secs(120));

            for _ in 0..100 {
                thread::sleep(Duration::from_secs(1));
                let mut conn = match pool.acquire() {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!(error = %e, "acquire failed");
                        backoff.sleep();
                        continue;
                    }
                };
                backoff.reset();

                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs();
                let result = match conn.write_all(format!("time: {now}, data: hello\n").as_bytes()) {
                    Ok(()) => pool.release(conn),
                    Err(e) => {
                        error!(error = %e, "write failed, dropping connection");
                        pool.discard(conn)
                    }
                };
                if let Err(e) = result {
                    error!(error = %e, "returning connection failed");
                }
            }
        })
    };

    let _ = worker.join();
    pool.shutdown();
    let _ = monitor.join();
}
