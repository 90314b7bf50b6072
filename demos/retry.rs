use std::time::Duration;

use jitter_retry::retry;

fn flaky(call: u32) -> Result<String, String> {
    if call < 3 {
        Err(format!("connection refused (call {})", call))
    } else {
        Ok(String::from("payload"))
    }
}

fn main() {
    let mut calls = 0;
    let mut result = Err(String::from("not attempted"));

    // Retry six times with a maximum backoff of 200ms between attempts.
    retry(6, Duration::from_millis(200), || {
        calls += 1;
        println!("Fetching, call {}", calls);
        result = flaky(calls);
        result.is_err()
    });

    match result {
        Ok(body) => println!("Successfully fetched {} after {} calls", body, calls),
        Err(err) => panic!("Failed to fetch: {}", err),
    }
}
