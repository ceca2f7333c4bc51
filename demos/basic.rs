use reliable_get::{FetcherOptions, Payload, ReliableFetcher};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reliable_get=debug")),
        )
        .init();

    let logfile = std::env::var("RELIABLE_GET_LOG").unwrap_or_else(|_| "calls.csv".to_owned());
    let urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        anyhow::bail!("usage: basic <url>...");
    }

    let fetcher = ReliableFetcher::with_options(&logfile, false, FetcherOptions::from_env()?)?;

    let tasks: Vec<_> = urls
        .into_iter()
        .map(|url| {
            let fetcher = fetcher.clone();
            tokio::spawn(async move {
                let result = fetcher.fetch(&url, "demo").await;
                (url, result)
            })
        })
        .collect();

    for task in tasks {
        let (url, result) = task.await?;
        match result? {
            Some(Payload::Json(value)) => println!("{url}: json {value}"),
            Some(Payload::Text(text)) => println!("{url}: {} chars of text", text.chars().count()),
            None => println!("{url}: no result"),
        }
    }

    fetcher.log().close()?;
    println!("audit log written to {logfile}");
    Ok(())
}
