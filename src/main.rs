// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod app;
mod cli;
mod config;
mod layer_panel;
mod legend;
mod map_view;
mod tiles;

use clap::Parser;
use config::AppConfig;
use log::{info, warn};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Args::parse();
    info!("Starting QuakeMap...");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    if let Ok(path) = AppConfig::get_config_path() {
        info!("Config file: {}", path.display());
    }

    args.apply(&mut config);
    let access_token = args.access_token(&config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_title("QuakeMap"),
        ..Default::default()
    };

    eframe::run_native(
        "QuakeMap",
        options,
        Box::new(move |cc| {
            info!("Creating application...");
            Ok(Box::new(app::QuakeMapApp::new(&config, access_token, &cc.egui_ctx)))
        }),
    )
}
