use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use signward_gateway::api::{ApiServer, ApiState};
use signward_gateway::speech::{SpeechPlayback, SpeechService, SpeechSynthesizer};
use signward_gateway::vision::{CameraCapture, OnnxGestureModel};
use signward_gateway::{Config, GesturePipeline, TextRefiner};

/// Signward - gesture-to-speech gateway
#[derive(Parser)]
#[command(name = "signward", version, about)]
struct Cli {
    /// Port to listen on (overrides config)
    #[arg(long, env = "SIGNWARD_PORT")]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Serve the proxy endpoints only, without the camera pipeline
    #[arg(long, env = "SIGNWARD_NO_DETECT")]
    no_detect: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List available camera devices
    ListCameras,
    /// Test camera capture
    TestCamera {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,signward_gateway=info",
        1 => "info,signward_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load();
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::ListCameras => list_cameras(),
            Command::TestCamera { duration } => test_camera(&config, duration).await,
            Command::TestSpeaker => test_speaker(),
            Command::TestTts { text } => test_tts(&config, &text).await,
        };
    }

    tracing::info!(
        port = config.server.port,
        no_detect = cli.no_detect,
        "starting signward gateway"
    );

    let api_key = config.api_keys.openai.clone().unwrap_or_default();

    let refiner = match TextRefiner::new(api_key.clone(), &config.refiner) {
        Ok(refiner) => Some(Arc::new(refiner)),
        Err(e) => {
            tracing::warn!(error = %e, "refinement disabled");
            None
        }
    };
    let synthesizer = match SpeechSynthesizer::new(api_key, &config.speech) {
        Ok(synthesizer) => Some(Arc::new(synthesizer)),
        Err(e) => {
            tracing::warn!(error = %e, "speech synthesis disabled");
            None
        }
    };

    // The camera pipeline needs both providers and a loadable model; without
    // them the gateway still serves whatever proxy endpoints are available.
    let mut pipeline = if cli.no_detect {
        None
    } else {
        build_pipeline(&config, refiner.clone(), synthesizer.clone())
    };

    let pipeline_running = pipeline
        .as_ref()
        .map_or_else(|| Arc::new(AtomicBool::new(false)), GesturePipeline::running_flag);

    let state = Arc::new(ApiState {
        refiner,
        synthesizer,
        pipeline_running,
    });

    if let Some(pipeline) = pipeline.as_mut() {
        if let Err(e) = pipeline.start() {
            tracing::error!(error = %e, "failed to start detection pipeline");
        }
    }

    let server = ApiServer::new(state, config.server.port);
    let server_task = server.spawn();

    tracing::info!("signward gateway ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    if let Some(pipeline) = pipeline.as_mut() {
        pipeline.stop();
    }
    server_task.abort();

    Ok(())
}

/// Build the detection pipeline if the model and both providers are available
fn build_pipeline(
    config: &Config,
    refiner: Option<Arc<TextRefiner>>,
    synthesizer: Option<Arc<SpeechSynthesizer>>,
) -> Option<GesturePipeline> {
    let (Some(refiner), Some(synthesizer)) = (refiner, synthesizer) else {
        tracing::warn!("detection pipeline disabled: provider credentials missing");
        return None;
    };

    match OnnxGestureModel::load(&config.vision.model_path) {
        Ok(model) => {
            let speech = Arc::new(SpeechService::new(
                synthesizer,
                config.speech.cache_capacity,
            ));
            Some(GesturePipeline::new(
                &config.vision,
                Arc::new(model),
                refiner,
                speech,
            ))
        }
        Err(e) => {
            tracing::error!(error = %e, "detection pipeline disabled: model load failed");
            None
        }
    }
}

/// List available camera devices
fn list_cameras() -> anyhow::Result<()> {
    let cameras = nokhwa::query(nokhwa::utils::ApiBackend::Auto)?;

    if cameras.is_empty() {
        println!("No cameras found");
        return Ok(());
    }

    println!("{:<7} | {:<32} | Misc", "Index", "Name");
    println!("{}", "-".repeat(60));
    for camera in cameras {
        println!(
            "{:<7} | {:<32} | {:?}",
            camera.index().to_string(),
            camera.human_name(),
            camera.misc()
        );
    }

    Ok(())
}

/// Test camera capture
async fn test_camera(config: &Config, duration: u64) -> anyhow::Result<()> {
    println!(
        "Testing camera {} for {duration} seconds...",
        config.vision.camera_index
    );

    let mut capture = CameraCapture::new(config.vision.camera_index);
    capture.start()?;
    let frames = capture.frame_handle();

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        match frames.latest() {
            Some(frame) => println!(
                "[{:2}s] frame {}x{}",
                i + 1,
                frame.width(),
                frame.height()
            ),
            None => println!("[{:2}s] no frame yet", i + 1),
        }
    }

    capture.stop();

    println!("\n---");
    println!("If you saw frame dimensions above, your camera is working!");

    Ok(())
}

/// Test speaker output with a sine wave
fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = SpeechPlayback::new()?;

    // 2 seconds of 440Hz at the 24kHz playback rate, 30% volume
    let sample_rate = 24000_u32;
    let num_samples = (sample_rate * 2) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.3
        })
        .collect();

    playback.play_samples(&samples)?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");

    Ok(())
}

/// Test TTS synthesis and playback
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let api_key = config.api_keys.openai.clone().unwrap_or_default();
    let synthesizer = SpeechSynthesizer::new(api_key, &config.speech)?;

    println!("Synthesizing speech...");
    let mp3_data = synthesizer.synthesize(text).await?;
    println!("Got {} bytes of audio data", mp3_data.len());

    println!("Playing audio...");
    let playback = SpeechPlayback::new()?;
    playback.play_mp3(&mp3_data)?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}
