use inkboard_engine::cache::CachedGeometry;
use inkboard_engine::{
    ActionKind, Command, ConfigUpdate, DrawCommand, DrawingEngine, PointerDevice, PointerInput, RecordingSurface,
};

fn pen(x: f64, y: f64) -> PointerInput {
    PointerInput::new(x, y, PointerDevice::Pen, 0.5)
}

fn mouse(x: f64, y: f64) -> PointerInput {
    PointerInput::new(x, y, PointerDevice::Mouse, 0.5)
}

/// Engine whose active pen draws 2px lines at half pressure.
fn thin_pen_engine() -> DrawingEngine {
    let mut engine = DrawingEngine::default();
    engine
        .apply_update(ConfigUpdate::PenWidth { slot: 0, value: 1.0 })
        .unwrap();
    engine
}

#[test]
fn incremental_frames_match_a_full_redraw() {
    let mut engine = thin_pen_engine();
    let mut main = RecordingSurface::new();
    let mut guide = RecordingSurface::new();

    engine.pointer_down(&pen(0.0, 0.0));
    engine.frame(&mut main, &mut guide);
    engine.pointer_move(&pen(10.0, 0.0));
    engine.frame(&mut main, &mut guide);
    engine.pointer_move(&pen(10.0, 10.0));
    engine.frame(&mut main, &mut guide);
    engine.pointer_up(None);
    engine.frame(&mut main, &mut guide);

    let ActionKind::Line { points } = &engine.history().actions()[0].kind else {
        panic!("expected a line");
    };
    assert_eq!(points.len(), 3);
    assert!(points.iter().all(|point| point.render_width == 2.0));

    let incremental = main.visible().to_vec();
    engine.execute(Command::Redraw).unwrap();
    let mut fresh = RecordingSurface::new();
    engine.frame(&mut fresh, &mut guide);
    assert_eq!(fresh.visible(), incremental.as_slice());
    assert_eq!(fresh.count(&DrawCommand::Clear), 1);
}

#[test]
fn perfect_line_outline_survives_undo_and_redo() {
    let mut engine = DrawingEngine::default();
    let mut main = RecordingSurface::new();
    let mut guide = RecordingSurface::new();
    engine.execute(Command::TogglePerfectFreehand).unwrap();
    engine.pointer_down(&mouse(0.0, 0.0));
    for step in 1..8 {
        engine.pointer_move(&mouse(step as f64 * 6.0, (step as f64).sin() * 4.0));
    }
    engine.pointer_up(None);
    engine.frame(&mut main, &mut guide);
    let before = engine.cache().get(0).cloned();
    assert!(matches!(before, Some(CachedGeometry::PerfectOutline { .. })));

    engine.execute(Command::Undo).unwrap();
    engine.frame(&mut main, &mut guide);
    assert!(!engine.cache().contains(0));

    engine.execute(Command::Redo).unwrap();
    engine.frame(&mut main, &mut guide);
    assert_eq!(engine.cache().get(0).cloned(), before);
}

#[test]
fn multi_line_text_is_one_action() {
    let mut engine = DrawingEngine::default();
    let mut main = RecordingSurface::new();
    let mut guide = RecordingSurface::new();
    engine.execute(Command::ToggleTextWriting).unwrap();
    engine.pointer_down(&mouse(40.0, 40.0));
    engine.pointer_up(Some(&mouse(40.0, 40.0)));
    engine.text_changed("a\nb");
    engine.text_blur();
    assert_eq!(engine.history().len(), 1);

    engine.frame(&mut main, &mut guide);
    let lines: Vec<(String, f64)> = main
        .visible()
        .iter()
        .filter_map(|command| match command {
            DrawCommand::FillText(text, _, y) => Some((text.clone(), *y)),
            _ => None,
        })
        .collect();
    // Cut pass then paint pass, each covering both lines.
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0].0, "a");
    assert_eq!(lines[1].0, "b");
    assert!(lines[1].1 > lines[0].1);
    assert_eq!(lines[2..], lines[..2]);
}

#[test]
fn erasing_hides_crossed_strokes_until_undo() {
    let mut engine = DrawingEngine::default();
    let mut main = RecordingSurface::new();
    let mut guide = RecordingSurface::new();
    for x in [0.0, 100.0] {
        engine.pointer_down(&mouse(x, 0.0));
        engine.pointer_move(&mouse(x, 50.0));
        engine.pointer_up(Some(&mouse(x, 100.0)));
    }

    engine.execute(Command::HoldStrokeDelete).unwrap();
    engine.pointer_down(&mouse(-20.0, 50.0));
    engine.pointer_move(&mouse(20.0, 50.0));
    engine.pointer_up(Some(&mouse(30.0, 50.0)));
    engine.execute(Command::ReleaseStrokeDelete).unwrap();

    let history = engine.history();
    assert_eq!(history.len(), 3);
    assert!(matches!(&history.actions()[2].kind, ActionKind::Delete { hidden } if hidden == &vec![0]));
    assert!(!history.actions()[0].visible);
    engine.frame(&mut main, &mut guide);

    engine.execute(Command::Undo).unwrap();
    assert!(engine.history().actions()[0].visible);
}
