mod app;
mod config;

use anyhow::Result;
use kiln_engine::device::GpuInit;
use kiln_engine::logging::{init_logging, LoggingConfig};
use kiln_engine::time::TimerConfig;
use kiln_engine::window::{Runtime, RuntimeConfig};
use kiln_scene::EditorSession;
use winit::dpi::LogicalSize;

use crate::app::StudioApp;
use crate::config::{config_path, StudioConfig};

fn main() -> Result<()> {
    let path = config_path(std::env::args_os().nth(1));
    let config = StudioConfig::load(&path)?;

    init_logging(LoggingConfig {
        env_filter: config.logging.filter.clone(),
        ..LoggingConfig::default()
    });
    log::info!("kiln studio starting (config: {})", path.display());

    let runtime = RuntimeConfig {
        title: config.window.title.clone(),
        initial_size: LogicalSize::new(config.window.width, config.window.height),
        timer: TimerConfig {
            fixed_time_step: config.editor.locked_fps,
            ..TimerConfig::default()
        },
    };

    let session = EditorSession {
        selection: None,
        locked_fps: config.editor.locked_fps,
        show_stats: config.editor.show_stats,
    };

    Runtime::run(runtime, GpuInit::default(), StudioApp::new(&config.scene, session))
}
