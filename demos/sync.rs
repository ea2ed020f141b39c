//! Drives the client from a plain `fn main`, for callers embedded in a
//! non-async program that can still spare a background Tokio runtime.

use std::sync::Arc;

use rmonitor_live::client::Client;
use rmonitor_live::credentials::{CredentialProvider, StaticCredentialProvider};
use rmonitor_live::logging::StdLogger;

fn main() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to start runtime");

    let provider = StaticCredentialProvider::new("ws://127.0.0.1:9898", "dGhlIHNhbXBsZQ==");
    let credentials = provider
        .credentials()
        .expect("static provider never fails");

    let client = Arc::new(Client::new());
    let logger = Arc::new(StdLogger::with_generated_id());

    runtime.block_on(async {
        client
            .connect(&credentials, logger)
            .await
            .expect("failed to connect to feed");

        let mut snapshots = client.snapshots();
        loop {
            if snapshots.changed().await.is_err() {
                break;
            }
            let snapshot = snapshots.borrow().clone();
            for row in &snapshot.competitors {
                println!("{}: {} {}", row.pos, row.name, row.time);
            }
        }
    });
}
