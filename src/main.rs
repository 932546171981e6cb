use chrono::Local;
use color_eyre::{eyre::eyre, Result};
use rppal::spi::{Bus, SlaveSelect};
use std::path::PathBuf;
use std::time::Duration;
use stickreader::hal::rpi::{GpioButtons, Mcp3008, MCP3008_DEFAULT_CLOCK_HZ};
use stickreader::stick::StickReader;
use stickreader::StickConfig;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

// Movement below this is only logged at debug level
const REPORT_THRESHOLD: f32 = 0.05;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(StickConfig::default_path);
    let config = StickConfig::load_or_default(&config_path)
        .map_err(|e| eyre!("Failed to load stick config: {}", e))?;
    info!("Using stick config: {:?}", config);

    let adc = Mcp3008::open(Bus::Spi0, SlaveSelect::Ss0, MCP3008_DEFAULT_CLOCK_HZ)
        .map_err(|e| eyre!("Failed to open ADC: {}", e))?;
    let buttons = GpioButtons::new().map_err(|e| eyre!("Failed to open GPIO: {}", e))?;

    let stick: StickReader<_, _, f32> = config
        .begin_reader(adc, buttons)
        .map_err(|e| eyre!("Failed to start stick reader: {}", e))?;

    run_monitor(stick, &config).await
}

async fn run_monitor(
    mut stick: StickReader<Mcp3008, GpioButtons, f32>,
    config: &StickConfig,
) -> Result<()> {
    info!(
        "Polling stick every {} ms (latch: {})",
        config.poll_interval_ms, config.latch
    );

    let mut interval = tokio::time::interval(Duration::from_millis(config.poll_interval_ms.max(1)));
    let mut last_x = 0.0_f32;
    let mut last_y = 0.0_f32;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => {
                info!("Interrupted, stopping stick monitor");
                return Ok(());
            }
        }

        let reading = stick.read();
        let moved = (reading.x - last_x).abs() > REPORT_THRESHOLD
            || (reading.y - last_y).abs() > REPORT_THRESHOLD;

        if moved {
            info!(
                "Stick x={:+.3} y={:+.3} linear={:.3} angle={:.1}° at {}",
                reading.x,
                reading.y,
                reading.linear,
                reading.angle,
                reading.timestamp.format("%H:%M:%S.%3f")
            );
            last_x = reading.x;
            last_y = reading.y;
        } else {
            debug!("Stick x={:+.4} y={:+.4}", reading.x, reading.y);
        }

        if stick.has_button() {
            match stick.pressed(config.latch) {
                Ok(true) => info!("Button pressed at {}", Local::now().format("%H:%M:%S.%3f")),
                Ok(false) => {}
                Err(e) => warn!("Failed to read button: {}", e),
            }
        }
    }
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();
}
