/*
 *  main.rs
 *
 *  pibox-lcd - worth the squeeze
 *	(c) 2020-26 Stuart Hunter
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, bail};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use pibox_lcd::config::{self, Cli, Command};
use pibox_lcd::display::{self, DisplayDriver, PixelWrite, Rgb};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Execute one drawing command against an open panel
fn run_command(driver: &mut dyn DisplayDriver, command: &Command) -> anyhow::Result<()> {
    match command {
        Command::Fill { r, g, b } => driver.fill_screen(Rgb::new(*r, *g, *b))?,
        Command::Pixel { x, y, r, g, b } => {
            if driver.plot(*x, *y, Rgb::new(*r, *g, *b))? == PixelWrite::Skipped {
                warn!("pixel ({}, {}) is off screen, nothing drawn", x, y);
            }
        }
        Command::Rect { x, y, width, height, r, g, b } => {
            driver.fill_rect(*x, *y, *width, *height, Rgb::new(*r, *g, *b))?
        }
        Command::Image { path } => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            driver.show_image(&mut BufReader::new(file))?;
        }
        Command::Gif { path } => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            let frames = driver.show_gif(&mut BufReader::new(file))?;
            info!("played {} frames from {}", frames, path.display());
        }
        Command::Rotate { degrees } => driver.set_rotation_deg(*degrees)?,
        Command::Invert { on } => driver.set_invert(*on)?,
        Command::Power { on } => driver.set_backlight(*on)?,
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli).context("loading configuration")?;

    if cli.dump_config {
        print!("{}", config::dump(&cfg)?);
        return Ok(());
    }

    let level = cfg.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
    info!("pibox-lcd {} (built {})", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let Some(command) = cli.command.as_ref() else {
        bail!("no command given, see --help");
    };

    let panel_cfg = cfg.panel.clone().unwrap_or_default();
    let mut panel = display::open(&panel_cfg).context("opening panel")?;
    let result = run_command(&mut *panel, command);
    panel.close();
    result
}
