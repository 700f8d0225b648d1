use std::{error::Error, sync::Arc};

use counter_handler::{
    config::{env_string, env_u64},
    ErrorBody, Handler, IncrementHandler, MemoryStore, SuccessBody,
};
use counter_service::{init_tracing, serve, ServiceSettings};
use indicatif::ProgressBar;
use tokio::time::{sleep, Duration, Instant};
use tracing::{info, warn};

type BoxError = Box<dyn Error + Send + Sync>;

/// POST an increment and return the count the service answered with.
async fn increment(client: &reqwest::Client, url: &str, by: i64) -> Result<i64, BoxError> {
    let response = client
        .post(url)
        .body(format!(r#"{{"incrementBy": {by}}}"#))
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        let body: ErrorBody = response.json().await?;
        return Err(format!("increment failed with {status}: {}", body.error).into());
    }
    let body: SuccessBody = response.json().await?;
    Ok(body.count)
}

fn mean_per_increment(elapsed: Duration, total: u64) -> Option<Duration> {
    (total > 0).then(|| elapsed.div_f64(total as f64))
}

async fn wait_until_up(client: &reqwest::Client, base: &str) -> Result<(), BoxError> {
    for _ in 0..50 {
        if let Ok(response) = client.get(format!("{base}/health")).send().await {
            if response.status().is_success() {
                return Ok(());
            }
        }
        sleep(Duration::from_millis(10)).await;
    }
    Err(format!("service at {base} never became healthy").into())
}

#[actix_web::main]
async fn main() -> Result<(), BoxError> {
    init_tracing();

    let settings = ServiceSettings {
        bind: env_string("LOAD_BIND", "127.0.0.1:8089".into()),
        ..ServiceSettings::default()
    };
    let num_tasks = env_u64("LOAD_TASKS", 8);
    let num_increments_per_task = env_u64("LOAD_INCREMENTS_PER_TASK", 250);
    let counter_id = env_string("LOAD_COUNTER", "load-test".into());

    let handler: Arc<dyn Handler> = Arc::new(IncrementHandler::with_config(
        Arc::new(MemoryStore::new()),
        settings.handler.clone(),
    ));
    let server = serve(&settings, handler)?;
    let server_handle = server.handle();
    tokio::spawn(server);

    let base = format!("http://{}", settings.bind);
    let url = format!("{base}/counters/{counter_id}");
    let client = reqwest::Client::new();
    wait_until_up(&client, &base).await?;

    // an increment of zero reads the current value
    let first_value = increment(&client, &url, 0).await?;
    info!("First value: {}", first_value);

    let total = num_tasks * num_increments_per_task;
    info!("Incrementing counter using {num_tasks} tasks with {num_increments_per_task} increments each");
    let progress = ProgressBar::new(total);

    let start = Instant::now();

    let mut tasks = Vec::new();
    for _ in 0..num_tasks {
        let client = client.clone();
        let url = url.clone();
        let progress = progress.clone();
        tasks.push(tokio::spawn(async move {
            let mut failures = 0u64;
            for _ in 0..num_increments_per_task {
                if let Err(e) = increment(&client, &url, 1).await {
                    warn!("Increment failed: {e}");
                    failures += 1;
                }
                progress.inc(1);
            }
            failures
        }));
    }

    let mut failures = 0;
    for task in tasks {
        failures += task.await?;
    }
    progress.finish();

    let elapsed = start.elapsed();
    info!("Ran {} increments using {} tasks in {:?}", total, num_tasks, elapsed);
    if let Some(mean) = mean_per_increment(elapsed, total) {
        info!("(mean time/increment = {:?})", mean);
    }

    let final_value = increment(&client, &url, 0).await?;
    info!("Final value: {}", final_value);

    server_handle.stop(true).await;

    let expected = first_value + (total - failures) as i64;
    if failures > 0 || final_value != expected {
        return Err(format!(
            "lost increments: expected {expected}, got {final_value} ({failures} failed requests)"
        )
        .into());
    }

    Ok(())
}
