//! speechlane - 冷热双通道语音合成服务
//!
//! - Domain: speech/, voice/
//! - Application: commands (lane router), queries, ports, warm lane guard
//! - Infrastructure: http, persistence, adapters (warm engine, cold lane, ffmpeg)

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use speechlane::application::{LaneRouter, LaneRouterConfig, WarmResourceGuard};
use speechlane::config::{load_config_with, print_config, ConfigOverrides};
use speechlane::domain::ModelId;
use speechlane::infrastructure::adapters::{
    load_warm_lane, ColdLaneConfig, FfmpegTranscoder, FsVoiceResolver, ProcessColdLane,
};
use speechlane::infrastructure::http::{AppState, HttpServer, ServerConfig};
use speechlane::infrastructure::persistence::FsAudioCache;

#[derive(Parser)]
#[command(name = "speechlane")]
#[command(about = "Hybrid warm/cold TTS server with an OpenAI-compatible speech endpoint")]
struct Args {
    /// Model identifier shared by both lanes
    #[arg(long)]
    model: Option<String>,

    /// Listen address
    #[arg(long)]
    host: Option<String>,

    /// Listen port
    #[arg(long)]
    port: Option<u16>,

    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Force debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 加载配置（优先级：命令行 > 环境变量 > 配置文件 > 默认值）
    let config = load_config_with(&ConfigOverrides {
        config_path: args.config,
        model: args.model,
        host: args.host,
        port: args.port,
        debug: args.debug,
    })
    .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},speechlane={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("speechlane - 冷热双通道语音合成服务");
    print_config(&config);

    // 确保工作目录存在
    let work_dir = config.storage.work_dir();
    tokio::fs::create_dir_all(&work_dir).await?;

    // 常驻通道：加载失败时继续以纯冷通道模式运行
    let model = ModelId::new(config.tts.model.clone());
    let warm = Arc::new(WarmResourceGuard::new(model.clone()));
    load_warm_lane(
        warm.clone(),
        &config.warm,
        model,
        &config.storage.voice_dir,
    )
    .await;
    tracing::info!(warm_lane = ?warm.state(), "Warm lane ready");

    // 创建适配器
    let voices = Arc::new(FsVoiceResolver::new(
        config.storage.voice_dir.clone(),
        work_dir.clone(),
    ));
    let cache = Arc::new(FsAudioCache::new(&config.storage.cache_dir).await?);
    let cold = Arc::new(ProcessColdLane::new(ColdLaneConfig {
        python: config.cold.python.clone(),
        script: config.cold.script.clone(),
        model_dir: config.storage.model_dir.clone(),
        use_cuda: config.cold.use_cuda,
        timeout: config.cold.timeout(),
    }));
    let transcoder = Arc::new(FfmpegTranscoder::new(config.transcode.ffmpeg.clone()));

    // 创建调度器
    let lane_router = LaneRouter::new(
        LaneRouterConfig {
            work_dir,
            max_in_flight: config.dispatch.max_in_flight,
        },
        voices,
        cache,
        warm.clone(),
        cold,
        transcoder,
    );

    // 创建 HTTP 服务器
    let server_config = ServerConfig::new(&config.server.host, config.server.port)
        .with_max_body_bytes(config.server.max_body_bytes);
    let server = HttpServer::new(server_config, AppState::new(lane_router));

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    // 服务停止后释放常驻引擎
    warm.unload();
    tracing::info!("Server shutdown complete");

    Ok(())
}
