// src/main.rs
mod gui;

use graph_scope::{ChannelSpec, GeneratorConfig, GeneratorParams, GraphConfig};

// Two demo channels: plain noise and a bounded random walk.
fn demo_config() -> GraphConfig {
    GraphConfig {
        channels: vec![
            ChannelSpec {
                key: 1,
                name: "noise".to_owned(),
            },
            ChannelSpec {
                key: 2,
                name: "walk".to_owned(),
            },
        ],
        generators: vec![
            GeneratorConfig {
                key: 1,
                params: GeneratorParams {
                    interval: 0.1,
                    richness: 3,
                    ..GeneratorParams::default()
                },
                seed: None,
            },
            GeneratorConfig {
                key: 2,
                params: GeneratorParams {
                    interval: 0.05,
                    continuity: true,
                    step_min: -10.0,
                    step_max: 10.0,
                    ..GeneratorParams::default()
                },
                seed: None,
            },
        ],
        ..GraphConfig::default()
    }
}

fn load_config() -> GraphConfig {
    let Some(path) = std::env::args().nth(1) else {
        log::info!("no config given, running the demo setup");
        return demo_config();
    };
    match GraphConfig::load(&path) {
        Ok(config) => {
            log::info!("loaded config from {path}");
            config
        }
        Err(e) => {
            log::warn!("{e:#}; falling back to the demo setup");
            demo_config()
        }
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let config = load_config();
    let viewport = eframe::egui::ViewportBuilder::default()
        .with_inner_size([1200.0, 760.0])
        .with_min_inner_size([800.0, 500.0])
        .with_title("graph-scope");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "graph-scope",
        options,
        Box::new(move |_cc| Box::new(gui::GraphApp::new(&config))),
    )
}
