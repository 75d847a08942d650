use segregate_app::{AnsiRenderer, Renderer};
use segregate_core::{RelocationStrategy, SegregationConfig, WorldState};

#[test]
fn headless_run_renders_converged_frame() {
    let config = SegregationConfig {
        rows: 6,
        cols: 10,
        similar: 0,
        strategy: RelocationStrategy::UniformRandom,
        rng_seed: Some(0xABCD),
        ..SegregationConfig::default()
    };
    let mut world = WorldState::new(config).expect("world");
    let mut renderer = AnsiRenderer::new(Vec::new());

    renderer.draw(&world).expect("initial frame");
    // A zero threshold satisfies everyone on the first scan.
    world.step();
    assert!(world.is_converged());
    renderer.draw(&world).expect("final frame");

    let frames = String::from_utf8(renderer.into_inner()).expect("utf8 frames");
    assert!(frames.contains("Round 0"));
    assert!(frames.contains("Round 1"));
    assert!(frames.contains("Satisfied 100%"));
    assert!(frames.contains("Alg 1: Pick a random available site"));
}

#[test]
fn frame_paints_both_agent_colors() {
    let config = SegregationConfig {
        rows: 4,
        cols: 8,
        empty: 20,
        red: 50,
        rng_seed: Some(7),
        ..SegregationConfig::default()
    };
    let world = WorldState::new(config).expect("world");

    let mut renderer = AnsiRenderer::new(Vec::new());
    renderer.draw(&world).expect("draw");
    let frame = String::from_utf8(renderer.into_inner()).expect("utf8 frame");

    // Crossterm emits SGR foreground-color sequences for the agents and a
    // reset at the end of every row.
    assert!(frame.contains("\u{1b}[38;5;"), "agent colors present");
    assert!(frame.contains("\u{1b}[0m"), "row reset present");
    assert!(frame.contains('X'));
}
