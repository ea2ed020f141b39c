use std::error::Error;
use std::sync::Arc;

use rmonitor_live::client::Client;
use rmonitor_live::credentials::{CredentialProvider, StaticCredentialProvider};
use rmonitor_live::logging::StdLogger;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let provider = StaticCredentialProvider::new(
        "ws://127.0.0.1:9898",
        std::env::var("RMONITOR_WS_KEY").unwrap_or_else(|_| "dGhlIHNhbXBsZQ==".to_owned()),
    );
    let credentials = provider.credentials()?;

    let client = Client::new();
    let logger = Arc::new(StdLogger::with_generated_id());
    client.connect(&credentials, logger).await?;

    let mut snapshots = client.snapshots();
    loop {
        snapshots.changed().await?;
        let snapshot = snapshots.borrow().clone();
        println!("{:#?}", snapshot.session);
        for row in &snapshot.competitors {
            println!("  {:>3} {:<20} {:>10} {:>10}", row.pos, row.name, row.time, row.gap);
        }
    }
}
