use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use third_eye::api::ApiServer;
use third_eye::assistant::{AlertTrigger, simulate_alert};
use third_eye::config::CameraSource;
use third_eye::console::{self, ConsoleExit};
use third_eye::vision::{SceneAnalyzer, VisionClient};
use third_eye::voice::{
    AudioPlayback, CommandListener, LocalSpeaker, MicListener, Microphone, Narrator, Speaker,
    SpeechSynthesizer, SpeechToText, SttProvider, TextToSpeech, TtsProvider, calculate_energy,
};
use third_eye::{Action, Collaborators, Config, Controller, Mode, ModeState, camera, interpret};

/// Third Eye - voice-controlled scene narration
#[derive(Parser)]
#[command(name = "third-eye", version, about)]
struct Cli {
    /// Control API port
    #[arg(long)]
    port: Option<u16>,

    /// Don't start the control API
    #[arg(long)]
    no_server: bool,

    /// Don't play narration on the speakers
    #[arg(long)]
    mute: bool,

    /// Disable voice features (for machines without audio hardware)
    #[arg(long, env = "THIRD_EYE_DISABLE_VOICE")]
    disable_voice: bool,

    /// Start scanning immediately
    #[arg(long)]
    auto_start: bool,

    /// Use a still image instead of the webcam
    #[arg(long)]
    camera_file: Option<PathBuf>,

    /// Seconds between scans
    #[arg(long)]
    interval: Option<f64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the assistant (default)
    Run,
    /// Capture one frame and describe it
    Describe {
        /// navigation, reading, find or sos
        #[arg(short, long, default_value = "navigation")]
        mode: Mode,
        /// Object to look for in find mode
        #[arg(short, long, default_value = "")]
        target: String,
        /// Speak the description
        #[arg(long)]
        speak: bool,
    },
    /// Listen for one voice command and show how it is interpreted
    Listen,
    /// Print the simulated emergency alert
    Alert {
        /// Guardian contact (defaults to the configured one)
        #[arg(long)]
        guardian: Option<String>,
    },
    /// Test microphone input
    TestMic {
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
    /// Capture one frame and save it
    TestCamera {
        /// Where to write the frame
        #[arg(short, long, default_value = "frame.jpg")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let filter = match cli.verbose {
        0 => "info,third_eye=info",
        1 => "info,third_eye=debug",
        2 => "debug",
        _ => "trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    apply_overrides(&mut config, &cli);
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => cmd_run(config, cli.mute, cli.auto_start).await,
        Command::Describe {
            mode,
            target,
            speak,
        } => cmd_describe(&config, mode, &target, speak && !cli.mute).await,
        Command::Listen => cmd_listen(&config).await,
        Command::Alert { guardian } => {
            let guardian = guardian.unwrap_or_else(|| config.guardian_contact.clone());
            println!("{}", simulate_alert(&guardian, AlertTrigger::Manual));
            Ok(())
        }
        Command::TestMic { duration } => test_mic(duration).await,
        Command::TestSpeaker => test_speaker().await,
        Command::TestTts { text } => test_tts(&config, &text, cli.mute).await,
        Command::TestCamera { output } => test_camera(&config, &output).await,
    }
}

/// CLI flags take precedence over environment and file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.no_server {
        config.server.enabled = false;
    }
    if cli.disable_voice {
        config.voice.enabled = false;
    }
    if let Some(path) = &cli.camera_file {
        config.camera.source = CameraSource::File(path.clone());
    }
    if let Some(secs) = cli.interval {
        match Duration::try_from_secs_f64(secs) {
            Ok(interval) if !interval.is_zero() => config.scan_interval = interval,
            _ => tracing::warn!(value = secs, "ignoring invalid --interval"),
        }
    }
}

#[allow(clippy::future_not_send)]
async fn cmd_run(config: Config, mute: bool, auto_start: bool) -> anyhow::Result<()> {
    tracing::info!(
        vision = ?config.vision.provider,
        voice = config.voice.enabled,
        interval_secs = config.scan_interval.as_secs_f64(),
        "starting third eye"
    );

    let collaborators = build_collaborators(&config, mute)?;
    let state = ModeState::new(config.guardian_contact.clone());
    let (controller, handle) = Controller::new(state, collaborators, config.scan_interval);
    tokio::spawn(controller.run());

    if config.server.enabled {
        let server = ApiServer::new(handle.clone(), config.server.port);
        tokio::spawn(async move {
            if let Err(e) = server.run().await {
                tracing::error!(error = %e, "API server stopped");
            }
        });
    }

    tokio::spawn(console::watch_display(handle.subscribe()));

    if auto_start {
        handle.submit(Action::Start).await?;
    }

    tokio::select! {
        exit = console::run(handle.clone()) => {
            // Headless runs keep serving the API until interrupted
            if exit? == ConsoleExit::EndOfInput && config.server.enabled {
                tracing::info!("stdin closed, press Ctrl-C to exit");
                tokio::signal::ctrl_c().await?;
            }
        }
        _ = tokio::signal::ctrl_c() => {}
    }

    tracing::info!("shutting down");
    Ok(())
}

fn build_collaborators(config: &Config, mute: bool) -> anyhow::Result<Collaborators> {
    let analyzer = build_analyzer(config)?;

    let narrator = if config.voice.enabled {
        build_synthesizer(config)
            .map(|tts| Arc::new(Narrator::new(tts, config.voice.artifact_dir.clone())))
    } else {
        None
    };

    let listener = if config.voice.enabled {
        build_listener(config)
    } else {
        None
    };

    let speaker = (config.voice.enabled && config.voice.playback && !mute)
        .then(|| Arc::new(LocalSpeaker) as Arc<dyn Speaker>);

    Ok(Collaborators {
        camera: camera::from_config(&config.camera),
        analyzer,
        narrator,
        listener,
        speaker,
    })
}

fn build_analyzer(config: &Config) -> anyhow::Result<SceneAnalyzer> {
    let client = VisionClient::new(config.vision.provider, config.vision_api_key()?)?
        .with_model(config.vision.model.clone())
        .with_max_tokens(config.vision.max_tokens);

    Ok(SceneAnalyzer::new(Arc::new(client)))
}

fn build_synthesizer(config: &Config) -> Option<Arc<dyn SpeechSynthesizer>> {
    let voice = &config.voice;
    let key = match voice.tts_provider {
        TtsProvider::OpenAI => config.api_keys.openai.clone(),
        TtsProvider::ElevenLabs => config.api_keys.elevenlabs.clone(),
    };

    let Some(key) = key else {
        tracing::warn!(provider = ?voice.tts_provider, "no TTS key, narration will be silent");
        return None;
    };

    match TextToSpeech::new(
        voice.tts_provider,
        key,
        voice.tts_model.clone(),
        voice.tts_voice.clone(),
        voice.tts_speed,
    ) {
        Ok(tts) => Some(Arc::new(tts)),
        Err(e) => {
            tracing::warn!(error = %e, "TTS unavailable");
            None
        }
    }
}

fn build_listener(config: &Config) -> Option<Arc<dyn CommandListener>> {
    let voice = &config.voice;
    let key = match voice.stt_provider {
        SttProvider::Whisper => config.api_keys.openai.clone(),
        SttProvider::Deepgram => config.api_keys.deepgram.clone(),
    };

    let Some(key) = key else {
        tracing::warn!(provider = ?voice.stt_provider, "no STT key, voice commands disabled");
        return None;
    };

    match SpeechToText::new(
        voice.stt_provider,
        key,
        voice.stt_model.clone(),
        voice.language.clone(),
    ) {
        Ok(stt) => Some(Arc::new(MicListener::new(
            Arc::new(stt),
            voice.listen_timeout,
            voice.phrase_time_limit,
        ))),
        Err(e) => {
            tracing::warn!(error = %e, "STT unavailable");
            None
        }
    }
}

/// Capture once and print the description
async fn cmd_describe(config: &Config, mode: Mode, target: &str, speak: bool) -> anyhow::Result<()> {
    let analyzer = build_analyzer(config)?;
    let frame = camera::from_config(&config.camera).capture().await?;
    println!("Captured {} bytes ({})", frame.data().len(), frame.mime_type());

    let text = analyzer.analyze(&frame, mode, target).await;
    println!("\n[{mode}] {text}");

    if speak && !third_eye::vision::is_error_text(&text) {
        let tts = build_synthesizer(config).ok_or_else(|| anyhow::anyhow!("TTS not configured"))?;
        let narrator = Narrator::new(tts, config.voice.artifact_dir.clone());
        if let Some(artifact) = narrator.synthesize(&text).await {
            LocalSpeaker.play(&artifact).await?;
        }
    }

    Ok(())
}

/// Listen once and show the resulting state change
async fn cmd_listen(config: &Config) -> anyhow::Result<()> {
    let listener =
        build_listener(config).ok_or_else(|| anyhow::anyhow!("speech recognition not configured"))?;

    println!("Listening... speak now!");
    let recognition = listener.listen().await;
    let utterance = recognition.as_utterance();
    println!("Heard:   {utterance}");

    let command = interpret(&utterance);
    let mut state = ModeState::new(config.guardian_contact.clone());
    let status = state.apply(&command);

    println!("Command: {command:?}");
    println!("Status:  {}", status.message);
    println!("Mode:    {}", state.mode);
    if let Some(target) = state.visible_target() {
        println!("Target:  {target}");
    }

    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut mic = Microphone::new()?;
    mic.start()?;
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = mic.take_buffer();
        let energy = calculate_energy(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!("[{:2}s] RMS: {energy:.4} | Peak: {peak:.4} | [{meter}]", i + 1);
    }

    mic.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: arecord -l (to list devices)");
    println!("  3. Try: pavucontrol (to check levels)");

    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let sample_rate = 24000_u32;
    let frequency = 440.0_f32;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..sample_rate * 2)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3
        })
        .collect();

    println!("Playing {} samples at {sample_rate} Hz...", samples.len());

    tokio::task::spawn_blocking(move || AudioPlayback::new()?.play_blocking(&samples)).await??;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl list sinks short");
    println!("  2. Try: pavucontrol (to check output levels)");

    Ok(())
}

/// Test TTS output
async fn test_tts(config: &Config, text: &str, mute: bool) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let tts = build_synthesizer(config).ok_or_else(|| anyhow::anyhow!("TTS not configured"))?;
    let narrator = Narrator::new(tts, config.voice.artifact_dir.clone());

    println!("Synthesizing speech...");
    let artifact = narrator
        .synthesize(text)
        .await
        .ok_or_else(|| anyhow::anyhow!("synthesis failed, see log"))?;
    println!("Wrote {}", artifact.path().display());

    if !mute {
        println!("Playing...");
        LocalSpeaker.play(&artifact).await?;
    }

    Ok(())
}

/// Capture one frame to disk
async fn test_camera(config: &Config, output: &Path) -> anyhow::Result<()> {
    println!("Capturing one frame...");

    let frame = camera::from_config(&config.camera).capture().await?;
    tokio::fs::write(output, frame.data()).await?;

    println!(
        "Saved {} bytes ({}) to {}",
        frame.data().len(),
        frame.mime_type(),
        output.display()
    );

    Ok(())
}
