use kickbot::backend::config::{load_config, ShowcaseConfig};
use kickbot::backend::kick::{KickApi, StreamLookup};
use kickbot::backend::webhook::{RunningServer, WebhookServer};
use log::{error, info, warn};
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let api = KickApi::new(config.kick.clone());

    let token = api.authenticate().await?;
    info!("Starting Kick API integration...");

    run_showcase(&api, &config.showcase).await;

    let mut server = if config.webhook.enabled {
        let server = WebhookServer::new(config.webhook.clone());
        Some(server.start(token.value()).await?)
    } else {
        None
    };

    let mut monitor = config.showcase.monitor_interval_secs.map(|secs| {
        info!("Monitoring {} every {} seconds", config.showcase.monitor_channel, secs);
        let mut interval = tokio::time::interval(Duration::from_secs(secs.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval
    });

    if server.is_none() && monitor.is_none() {
        return Ok(());
    }

    // The showcase already checked the stream once
    if let Some(interval) = monitor.as_mut() {
        interval.tick().await;
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down...");
                break;
            }
            result = server_exit(&mut server) => {
                let reason = match result {
                    Ok(()) => "stopped unexpectedly".to_string(),
                    Err(e) => e.to_string(),
                };
                return Err(format!("webhook server is down: {}", reason).into());
            }
            _ = next_tick(&mut monitor) => {
                monitor_stream(&api, &config.showcase.monitor_channel).await;
            }
        }
    }

    if let Some(server) = server {
        server.shutdown();
    }
    Ok(())
}

async fn server_exit(server: &mut Option<RunningServer>) -> std::io::Result<()> {
    match server {
        Some(server) => server.wait().await,
        None => std::future::pending().await,
    }
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// One pass over the read endpoints, logging a short summary of each
async fn run_showcase(api: &KickApi, showcase: &ShowcaseConfig) {
    info!("--- Getting Channel Info ---");
    match api.get_channel(&showcase.channel).await {
        Ok(channel) => info!(
            "Channel {}: {} followers, live: {}, viewers: {}",
            channel.username(),
            channel.followers_count,
            channel.is_live(),
            channel.viewer_count()
        ),
        Err(e) => warn!("Channel info error: {}", e),
    }

    info!("--- Getting Live Streams ---");
    match api.get_live_streams(Some(1), Some(showcase.live_limit)).await {
        Ok(streams) => {
            info!("Live streams count: {}", streams.data.len());
            for (index, stream) in streams.data.iter().take(3).enumerate() {
                info!(
                    "{}. {} - {} ({} viewers)",
                    index + 1,
                    stream.username(),
                    stream.session_title,
                    stream.viewer_count
                );
            }
        }
        Err(e) => warn!("Live streams error: {}", e),
    }

    info!("--- Searching Channels ---");
    match api.search_channels(&showcase.search_query, Some(1)).await {
        Ok(results) => {
            info!("Search results count: {}", results.data.len());
            for (index, channel) in results.data.iter().take(3).enumerate() {
                info!(
                    "{}. {} - {} followers",
                    index + 1,
                    channel.username(),
                    channel.followers_count
                );
            }
        }
        Err(e) => warn!("Search error: {}", e),
    }

    info!("--- Getting Categories ---");
    match api.get_categories().await {
        Ok(categories) => {
            info!("Categories count: {}", categories.len());
            for (index, category) in categories.iter().take(5).enumerate() {
                info!("{}. {} (ID: {})", index + 1, category.name, category.id);
            }
        }
        Err(e) => warn!("Categories error: {}", e),
    }

    info!("--- Monitoring Stream ---");
    monitor_stream(api, &showcase.monitor_channel).await;
}

async fn monitor_stream(api: &KickApi, channel: &str) {
    match api.get_stream_info(channel).await {
        StreamLookup::Live(stream) if stream.is_live => {
            info!("📺 {} is LIVE!", channel);
            info!("   Title: {}", stream.session_title);
            info!("   Viewers: {}", stream.viewer_count);
            info!("   Duration: {} minutes", stream.duration_minutes());
        }
        StreamLookup::Live(_) | StreamLookup::Offline => info!("💤 {} is offline", channel),
        StreamLookup::Failed(e) => warn!("Could not determine whether {} is live: {}", channel, e),
    }
}
