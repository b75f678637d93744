//! PSX Viewer
//!
//! Opens a window, renders the demo scene through the software GPU at
//! PS1 resolution and scales it up. Keyboard stands in for the pad:
//! - Arrows: turn and tilt the camera
//! - Q/E: dolly in and out, Z/C: raise and lower
//! - T: switch animation track, Enter: pause/resume
//!
//! An optional first argument names a RON config file.

use macroquad::prelude::*;
use psx_viewer::audio::{CdAudio, LoggingDrive};
use psx_viewer::config::{load_config, ViewerConfig};
use psx_viewer::gpu::SoftGpu;
use psx_viewer::scene::{Buttons, PadSource, Scene, Viewer};
use psx_viewer::VERSION;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "psx-viewer.ron";

/// Config named on the command line, or the default file when present
fn config_path() -> Option<PathBuf> {
    std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from(DEFAULT_CONFIG)).filter(|p| p.exists()))
}

fn window_conf() -> Conf {
    // Logging is not up yet; failures are reported again from main
    let config = config_path()
        .and_then(|p| load_config(p).ok())
        .unwrap_or_default();
    let scale = config.window_scale.max(1) as i32;
    Conf {
        window_title: format!("PSX Viewer v{}", VERSION),
        window_width: config.screen.width as i32 * scale,
        window_height: config.screen.height as i32 * scale,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

/// Keyboard mapped onto the digital pad
struct KeyboardPad;

impl PadSource for KeyboardPad {
    fn poll(&mut self) -> Buttons {
        const MAP: [(KeyCode, Buttons); 10] = [
            (KeyCode::Up, Buttons::UP),
            (KeyCode::Down, Buttons::DOWN),
            (KeyCode::Left, Buttons::LEFT),
            (KeyCode::Right, Buttons::RIGHT),
            (KeyCode::Q, Buttons::L1),
            (KeyCode::E, Buttons::R1),
            (KeyCode::Z, Buttons::L2),
            (KeyCode::C, Buttons::R2),
            (KeyCode::T, Buttons::TRIANGLE),
            (KeyCode::Enter, Buttons::START),
        ];
        MAP.iter()
            .filter(|(key, _)| is_key_down(*key))
            .fold(Buttons::empty(), |acc, (_, b)| acc | *b)
    }
}

fn load_or_default() -> ViewerConfig {
    let Some(path) = config_path() else {
        info!("no config file, using defaults");
        return ViewerConfig::default();
    };
    match load_config(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "config rejected, using defaults");
            ViewerConfig::default()
        }
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!(version = VERSION, "PSX Viewer");
    let config = load_or_default();

    let mut gpu = SoftGpu::new(config.screen.width as usize, config.screen.height as usize);
    let scene = match Scene::from_config(&config, &mut gpu.vram) {
        Ok(scene) => scene,
        Err(e) => {
            warn!(error = %e, "configured assets failed to load, using built-in scene");
            match Scene::demo(config.anim_period, &mut gpu.vram) {
                Ok(scene) => scene,
                Err(e) => {
                    error!(error = %e, "built-in scene failed to load");
                    return;
                }
            }
        }
    };

    let mut cd = CdAudio::new(LoggingDrive, config.cd_volume);
    if let Some(track) = config.cd_track {
        if let Err(e) = cd.play_track(track) {
            warn!(error = %e, "cd audio not started");
        }
    }

    let mut viewer = Viewer::new(config, scene);
    let mut pad = KeyboardPad;

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        let stats = viewer.frame(pad.poll(), &mut gpu);

        clear_background(BLACK);
        let fb = &gpu.framebuffer;
        let texture = Texture2D::from_rgba8(fb.width as u16, fb.height as u16, &fb.pixels);
        texture.set_filter(FilterMode::Nearest);

        // Largest integer scale that fits, centred
        let scale = (screen_width() / fb.width as f32)
            .min(screen_height() / fb.height as f32)
            .floor()
            .max(1.0);
        let (draw_w, draw_h) = (fb.width as f32 * scale, fb.height as f32 * scale);
        let (draw_x, draw_y) = ((screen_width() - draw_w) / 2.0, (screen_height() - draw_h) / 2.0);
        draw_texture_ex(
            &texture,
            draw_x,
            draw_y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(Vec2::new(draw_w, draw_h)),
                ..Default::default()
            },
        );

        let text_size = 8.0 * scale;
        let line = |row: f32| draw_y + text_size * (row + 1.5);
        if let Some(anim) = viewer.anim_status() {
            let label = if anim.playing { "" } else { " (paused)" };
            draw_text(&format!("Animation: {}{}", anim.track.to_uppercase(), label), draw_x + text_size, line(0.0), text_size, WHITE);
            draw_text(&format!("Frame: {}/{}", anim.frame, anim.frame_count), draw_x + text_size, line(1.0), text_size, WHITE);
        }
        draw_text(
            &format!(
                "Prims: {}  Back: {}  Depth: {}{}",
                stats.emitted,
                stats.culled_back,
                stats.culled_depth,
                if stats.truncated { "  TRUNCATED" } else { "" }
            ),
            draw_x + text_size,
            line(2.0),
            text_size,
            Color::from_rgba(200, 200, 200, 255),
        );

        next_frame().await;
    }

    cd.stop();
    info!(frames = viewer.frame_count(), "exit");
}
