use gaze_backend::config::Config;
use gaze_backend::engine::config::EngineConfig;
use gaze_backend::engine::session::spawn_session;
use gaze_backend::engine::tracker::NoopTracker;
use gaze_backend::engine::types::GazeSample;
use gaze_backend::logging::{init_tracing, LogConfig};
use gaze_backend::services::classifier::HttpEmotionClassifier;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Replay driver: reads JSON-lines gaze samples from stdin, feeds them
/// through a live session, and prints the session summary on EOF or ctrl-c.
#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    init_tracing(&LogConfig {
        log_level: config.log_level.clone(),
        enable_file_logs: config.enable_file_logs,
        log_dir: config.log_dir.clone(),
    });
    tracing::info!("Starting gaze-backend replay");

    let engine_config = EngineConfig::from_env(&config.engine);
    if let Err(error) = engine_config.validate() {
        tracing::error!(%error, "Invalid engine configuration");
        std::process::exit(1);
    }

    let classifier = HttpEmotionClassifier::new(&config.classifier);
    let (session, mut decisions) = spawn_session(engine_config, classifier, NoopTracker);

    // A replay run has no UI to take a break, so decisions are logged and
    // resolved immediately to keep collection going.
    let resolver = session.clone();
    tokio::spawn(async move {
        while let Some(decision) = decisions.recv().await {
            tracing::info!(
                emotion = decision.emotion.as_str(),
                mean = ?decision.mean_vector,
                "Intervention decision"
            );
            if resolver.resolve(None).await.is_err() {
                break;
            }
        }
    });

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<GazeSample>(line) {
                        Ok(sample) => {
                            if session.submit_sample(sample).await.is_err() {
                                tracing::error!("Session task stopped unexpectedly");
                                break;
                            }
                        }
                        Err(error) => tracing::warn!(%error, "Skipping malformed gaze sample"),
                    }
                }
                Ok(None) => {
                    tracing::info!("End of input");
                    break;
                }
                Err(error) => {
                    tracing::error!(%error, "Failed to read stdin");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    match session.end().await {
        Ok(summary) => match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(error) => tracing::error!(%error, "Failed to serialize session summary"),
        },
        Err(error) => tracing::error!(%error, "Session ended without a summary"),
    }
}
