//! Quick-start examples for the VanceAI Rust SDK.
//!
//! Run with:
//!   VANCEAI_API_TOKEN=... cargo run --example quickstart
//!
//! Or pass the token directly in code (not recommended for production).

use std::time::Duration;

use vanceai::{ClientBuilder, EnlargeOptions, EnlargeScale, JobConfig, ProcessOptions};

#[tokio::main]
async fn main() -> vanceai::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Create a client (reads VANCEAI_API_TOKEN from environment)
    // -----------------------------------------------------------------------
    let client = ClientBuilder::new().build()?;

    // Or provide the token directly:
    // let client = Client::new("your_api_token");

    // -----------------------------------------------------------------------
    // 2. Enlarge a local image 2x and wait for the result
    // -----------------------------------------------------------------------
    let output = client
        .enlarge("demo.jpg", &EnlargeOptions::default(), None)
        .await?;
    println!("Enlarged image written to {}", output.display());

    // -----------------------------------------------------------------------
    // 3. Enlarge to a minimum size, with a progress callback
    // -----------------------------------------------------------------------
    let opts = ProcessOptions {
        poll_interval: Duration::from_secs(2),
        timeout: Duration::from_secs(60),
        on_progress: Some(Box::new(|status| println!("  status: {status}"))),
        ..Default::default()
    };

    let output = client
        .enlarge_to_dimensions("demo.jpg", 1920, 1080, &EnlargeOptions::default(), Some(opts))
        .await?;
    println!("At least 1920 wide or 1080 tall: {}", output.display());

    // -----------------------------------------------------------------------
    // 4. Drive the primitives yourself
    // -----------------------------------------------------------------------
    let options = EnlargeOptions {
        scale: EnlargeScale::X4,
        suppress_noise: 40,
        remove_blur: 20,
    };
    let config = JobConfig::enlarge(&options)?;

    let uid = client.upload("demo.jpg").await?;
    let job = client.transform(&uid, &config, None).await?;
    println!("Submitted: trans_id={} status={}", job.trans_id, job.status);

    let status = client.progress(&job.trans_id).await?;
    if status.is_finished() {
        let written = client.download(&job.trans_id, "enlarged.jpg").await?;
        println!("Downloaded {written} bytes");
    }

    Ok(())
}
