//! HyperionX worker host
//!
//! Installs and activates the worker, then dispatches one fetch event per
//! URL argument against the live network.

mod scope;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use hx_net::{HttpLoader, LoaderConfig, MemoryCacheStorage, Request};
use hx_worker::{
    FetchEvent, NotificationClickEvent, PushEvent, ServiceWorker, SyncEvent, WorkerConfig,
};
use tracing_subscriber::EnvFilter;

use crate::scope::ConsoleScope;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const USAGE: &str = "\
usage: hx-host [--config FILE] [--timeout SECS] [--navigate] [--push JSON] [--sync TAG] [URL...]

  --config FILE   worker config (JSON); defaults to $HX_WORKER_CONFIG
  --timeout SECS  network timeout per request (default 30)
  --navigate      dispatch URLs as navigation requests
  --push JSON     deliver a push message, then click the notification
  --sync TAG      deliver a background sync event";

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    timeout: Option<Duration>,
    navigate: bool,
    push: Option<String>,
    sync: Option<String>,
    urls: Vec<String>,
    help: bool,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut parsed = Args::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .with_context(|| format!("{flag} needs a value"))
            };

            match arg.as_str() {
                "--config" => parsed.config = Some(value("--config")?.into()),
                "--timeout" => {
                    let secs: u64 = value("--timeout")?
                        .parse()
                        .context("--timeout takes whole seconds")?;
                    parsed.timeout = Some(Duration::from_secs(secs));
                }
                "--navigate" => parsed.navigate = true,
                "--push" => parsed.push = Some(value("--push")?),
                "--sync" => parsed.sync = Some(value("--sync")?),
                "-h" | "--help" => parsed.help = true,
                flag if flag.starts_with("--") => bail!("unknown option {flag}"),
                _ => parsed.urls.push(arg),
            }
        }

        Ok(parsed)
    }
}

fn load_config(args: &Args) -> Result<WorkerConfig> {
    let path = args
        .config
        .clone()
        .or_else(|| std::env::var_os("HX_WORKER_CONFIG").map(PathBuf::from));

    match path {
        Some(path) => WorkerConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(WorkerConfig::default()),
    }
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;

    let mut loader_config = LoaderConfig::default();
    if let Some(timeout) = args.timeout {
        loader_config.timeout = timeout;
    }
    let loader = HttpLoader::with_config(loader_config)?;

    let mut worker = ServiceWorker::new(
        config,
        Arc::new(loader),
        Arc::new(MemoryCacheStorage::new()),
        ConsoleScope::default(),
    )?;

    worker.install().await.context("install failed")?;
    worker.activate().await.context("activation failed")?;
    tracing::info!("Worker {:?} for {}", worker.state(), worker.config().origin);

    for url in &args.urls {
        let request = if args.navigate {
            Request::navigate(url)?
        } else {
            Request::get(url)?
        };

        let Some(outcome) = worker.handle_fetch(FetchEvent::new(request)).await else {
            println!("{:<14} {url}", "not-intercepted");
            continue;
        };

        match &outcome.result {
            Ok(served) => println!(
                "{:<14} {} {:?} {}B {url}",
                outcome.disposition.as_str(),
                served.response.status,
                served.source,
                served.response.body.len(),
            ),
            Err(err) => println!("{:<14} error: {err} {url}", outcome.disposition.as_str()),
        }
        outcome.wait_until.settle().await;
    }

    if let Some(payload) = args.push {
        let shown = worker.handle_push(PushEvent::new(payload)).await?;
        if let Some(notification) = shown {
            worker
                .handle_notification_click(NotificationClickEvent::new(notification))
                .await?;
        }
        tracing::info!("{} notification(s) shown", worker.scope().shown());
    }

    if let Some(tag) = args.sync {
        let handled = worker.handle_sync(SyncEvent::new(&tag)).await?;
        tracing::info!("Sync {tag}: {}", if handled { "handled" } else { "ignored" });
    }

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse(std::env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }

    smol::block_on(run(args))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args> {
        Args::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_urls_and_flags() {
        let args = parse(&["--navigate", "http://localhost:8501/", "--timeout", "5"]).unwrap();

        assert!(args.navigate);
        assert_eq!(args.timeout, Some(Duration::from_secs(5)));
        assert_eq!(args.urls, vec!["http://localhost:8501/"]);
    }

    #[test]
    fn test_parse_push_and_sync() {
        let args = parse(&["--push", r#"{"title":"T"}"#, "--sync", "sync-messages"]).unwrap();

        assert_eq!(args.push.as_deref(), Some(r#"{"title":"T"}"#));
        assert_eq!(args.sync.as_deref(), Some("sync-messages"));
        assert!(args.urls.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&["--config"]).is_err());
        assert!(parse(&["--timeout", "soon"]).is_err());
        assert!(parse(&["--verbose"]).is_err());
    }

    #[test]
    fn test_config_defaults_without_file() {
        let args = Args {
            config: None,
            ..Args::default()
        };
        // Only meaningful when the environment does not point elsewhere
        if std::env::var_os("HX_WORKER_CONFIG").is_none() {
            assert_eq!(load_config(&args).unwrap(), WorkerConfig::default());
        }
    }

    #[test]
    fn test_missing_config_file() {
        let args = parse(&["--config", "/nonexistent/hx-worker.json"]).unwrap();
        assert!(load_config(&args).is_err());
    }
}
