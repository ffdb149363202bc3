//! # Example: scroll
//!
//! Several widgets watch `window` scroll through one shared listener. A burst of
//! scroll occurrences is coalesced into one trailing-edge fan-out per window.
//!
//! ## Flow
//! ```text
//! register(header), register(lazy-images)  ──► 1 low-level listener on window
//! dispatch(y=0..=400) every 10ms           ──► fan-out every 50ms, latest y only
//! unregister(header)                       ──► listener stays (1 callback left)
//! teardown()                               ──► listener detached, timers cancelled
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example scroll --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use unifier::{CallbackFn, Config, Document, LogWriter, Occurrence, Subscribe, UnifiedEventService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let doc = Arc::new(Document::new());
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let svc = UnifiedEventService::builder(Config::default(), doc.clone())
        .with_subscribers(subs)
        .build()?;

    let deliveries = Arc::new(AtomicUsize::new(0));
    let header = {
        let deliveries = deliveries.clone();
        CallbackFn::arc("sticky-header", move |occ: &Occurrence| {
            deliveries.fetch_add(1, Ordering::Relaxed);
            println!("sticky-header: {}", occ.detail.as_deref().unwrap_or("-"));
            Ok(())
        })
    };
    let images = CallbackFn::arc("lazy-images", |occ: &Occurrence| {
        println!("lazy-images:   {}", occ.detail.as_deref().unwrap_or("-"));
        Ok(())
    });

    svc.register("window", "scroll", header.clone())?;
    svc.register("window", "scroll", images.clone())?;
    println!("low-level scroll listeners on window: {}", doc.window().listener_count("scroll"));

    for y in (0..=400).step_by(10) {
        doc.window().dispatch(&Occurrence::new("scroll").with_detail(format!("y={y}")))?;
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    println!("41 occurrences, {} header deliveries", deliveries.load(Ordering::Relaxed));

    svc.unregister("window", "scroll", &header);
    println!("after unregister(header): {} listener(s)", doc.window().listener_count("scroll"));

    doc.window().dispatch(&Occurrence::new("scroll").with_detail("y=0"))?;
    svc.teardown();
    println!("after teardown: {} listener(s)", doc.window().listener_count("scroll"));

    // Let the log subscriber drain.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
