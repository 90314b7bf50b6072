extern crate tokio_1 as tokio;

use std::time::Duration;

use jitter_retry::{Cancellation, Signal};

async fn fetch(signal: Signal) -> Result<String, std::io::Error> {
    tokio::select! {
        _ = signal.wait() => Err(std::io::Error::new(std::io::ErrorKind::Interrupted, "cancelled")),
        _ = tokio::time::sleep(Duration::from_millis(50)) => {
            Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "upstream timed out"))
        }
    }
}

#[tokio::main]
async fn main() {
    // Give up after two seconds no matter how many attempts are left.
    let signal = Signal::with_timeout(Duration::from_secs(2));

    match jitter_retry::tokio::retry_with_cancellation(signal, 10, Duration::from_secs(1), fetch).await {
        Ok(body) => println!("Successfully fetched {}", body),
        Err(err) if err.is_cancelled() => println!("Stopped: {}", err),
        Err(err) => println!("Failed to fetch: {}", err),
    }
}
