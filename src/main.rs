//! CATWALK: a rooftop-running city platformer
//!
//! A cat loose in a procedurally generated city: run, triple-jump and
//! wall-kick across rooftops, ride the tram, collect the fish. All the
//! interesting machinery lives in `game` (fixed-step physics, camera,
//! animation, particles) and `world` (city generation); this file is only
//! the shell around it: window setup, input polling, a blocky primitive
//! renderer and the text HUD.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod game;
mod input;
mod world;

use macroquad::prelude::*;

use game::runtime::Game;
use game::settings::GameSettings;
use input::{Action, InputState};

fn window_conf() -> Conf {
    Conf {
        window_title: format!("CATWALK v{}", VERSION),
        window_width: 1280,
        window_height: 720,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

/// HUD text, updated only through the score/lives observer queues.
struct Hud {
    score_line: String,
    lives_line: String,
}

impl Hud {
    fn synced_to(game: &Game) -> Self {
        Self {
            score_line: format!("FISH {}/{}", game.score(), game.total_collectibles()),
            lives_line: format!("LIVES {}", game.lives()),
        }
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let settings = load_settings();
    let mut game = match Game::new(settings) {
        Ok(game) => game,
        Err(e) => {
            eprintln!("failed to start: {}", e);
            return;
        }
    };
    let mut input = InputState::new();
    let mut hud = Hud::synced_to(&game);

    game.set_running(true);

    loop {
        // Pause toggle and reset are shell concerns
        if input.action_pressed(Action::Pause) {
            let running = !game.is_running();
            game.set_running(running);
            input.reset_pointer();
        }
        if input.action_pressed(Action::Reset) {
            game.reset();
            hud = Hud::synced_to(&game);
        }

        set_cursor_grab(game.is_running());
        show_mouse(!game.is_running());

        game.update_controls(input.control_flags());
        game.apply_pointer_delta(input.pointer_delta());
        game.frame(get_frame_time());

        // Observer surface: the only game state that leaves the core
        for event in game.events.score.drain() {
            hud.score_line = format!("FISH {}/{}", event.score, event.total);
        }
        for event in game.events.lives.drain() {
            hud.lives_line = format!("LIVES {}", event.remaining);
        }

        draw_scene(&game);
        draw_hud(&game, &hud);

        next_frame().await;
    }
}

fn load_settings() -> GameSettings {
    #[cfg(not(target_arch = "wasm32"))]
    {
        match GameSettings::load("assets/settings.ron") {
            Ok(Some(settings)) => return settings,
            Ok(None) => {}
            Err(e) => eprintln!("settings ignored: {}", e),
        }
    }
    GameSettings::default()
}

// =============================================================================
// Rendering (decorative only; the simulation never reads any of this)
// =============================================================================

fn rotate_y(v: Vec3, angle: f32) -> Vec3 {
    vec3(
        v.x * angle.cos() + v.z * angle.sin(),
        v.y,
        -v.x * angle.sin() + v.z * angle.cos(),
    )
}

fn draw_scene(game: &Game) {
    clear_background(Color::new(0.45, 0.62, 0.78, 1.0));

    set_camera(&Camera3D {
        position: game.camera.position,
        target: game.camera.look_at,
        up: Vec3::Y,
        ..Default::default()
    });

    // Static city: ground slab, buildings, street props
    for (i, b) in game.static_colliders().iter().enumerate() {
        let size = b.size();
        let color = if i == 0 {
            Color::new(0.32, 0.32, 0.34, 1.0) // Ground
        } else if size.y > 2.0 {
            // Buildings get a per-index tint so the skyline reads
            let t = (i * 37 % 10) as f32 / 10.0;
            Color::new(0.5 + t * 0.2, 0.45 + t * 0.15, 0.42 + t * 0.1, 1.0)
        } else {
            Color::new(0.55, 0.42, 0.28, 1.0) // Crates and curbs
        };
        draw_cube(b.center(), size, None, color);
    }

    let tram = game.tram_box();
    draw_cube(tram.center(), tram.size(), None, Color::new(0.75, 0.2, 0.18, 1.0));

    for (i, c) in game.collectibles().iter().enumerate() {
        if !c.active {
            continue;
        }
        let bob = (game.sim_time() * 2.0 + i as f32).sin() * 0.1;
        let pos = vec3(c.position.x, c.base_height + bob, c.position.z);
        draw_sphere(pos, 0.18, None, GOLD);
    }

    draw_cat(game);

    for p in game.particles.iter_active() {
        draw_cube(p.position, Vec3::splat(p.scale), None, p.color);
    }

    set_default_camera();
}

/// The cat, assembled from cubes placed by the animator's rig.
fn draw_cat(game: &Game) {
    let player = &game.player;
    let rig = &game.animator.rig;

    let forward = vec3(player.facing.sin(), 0.0, player.facing.cos());
    let right = vec3(player.facing.cos(), 0.0, -player.facing.sin());
    let base = player.position;

    let fur = Color::new(0.16, 0.15, 0.18, 1.0);
    let fur_light = Color::new(0.24, 0.22, 0.26, 1.0);

    let stretch = rig.body_stretch;
    let body_center = base + Vec3::Y * (0.32 * stretch) + rig.body.offset;
    draw_cube(body_center, vec3(0.5, 0.42 * stretch, 0.62), None, fur);

    let head = base + forward * 0.38 + Vec3::Y * (0.58 * stretch) + rig.head.offset;
    draw_cube(head, Vec3::splat(0.3), None, fur_light);

    for (ear, side) in [(&rig.left_ear, -1.0), (&rig.right_ear, 1.0)] {
        let pos = head + right * (side * 0.1 + ear.angle * 0.05) + Vec3::Y * 0.2;
        draw_cube(pos, vec3(0.08, 0.12, 0.05), None, fur);
    }

    let legs = [
        (&rig.front_left_leg, 0.22, -0.16),
        (&rig.front_right_leg, 0.22, 0.16),
        (&rig.back_left_leg, -0.22, -0.16),
        (&rig.back_right_leg, -0.22, 0.16),
    ];
    for (leg, fore, side) in legs {
        let swing = forward * (leg.angle * 0.14);
        let pos = base + forward * fore + right * side + Vec3::Y * 0.1 + swing;
        draw_cube(pos, vec3(0.1, 0.2, 0.1), None, fur);
    }

    // Tail: a chain of cubes trailing behind, swaying per segment
    let mut tail_pos = base - forward * 0.34 + Vec3::Y * 0.38;
    for segment in &rig.tail {
        tail_pos += rotate_y(vec3(segment.angle * 0.3, 0.12, -1.0), player.facing).normalize() * 0.13;
        draw_cube(tail_pos, Vec3::splat(0.09), None, fur_light);
    }
}

fn draw_hud(game: &Game, hud: &Hud) {
    draw_text(&hud.score_line, 24.0, 40.0, 34.0, WHITE);
    draw_text(&hud.lives_line, 24.0, 74.0, 34.0, WHITE);

    if game.lives() == 0 {
        let text = "OUT OF LIVES - press R";
        let center = screen_width() * 0.5 - measure_text(text, None, 44, 1.0).width * 0.5;
        draw_text(text, center, screen_height() * 0.5, 44.0, ORANGE);
    } else if !game.is_running() {
        let text = "PAUSED - press ESC";
        let center = screen_width() * 0.5 - measure_text(text, None, 44, 1.0).width * 0.5;
        draw_text(text, center, screen_height() * 0.5, 44.0, WHITE);
    }

    draw_text(
        "WASD move  SPACE jump  SHIFT sprint  mouse look",
        24.0,
        screen_height() - 20.0,
        22.0,
        Color::new(1.0, 1.0, 1.0, 0.6),
    );
}
