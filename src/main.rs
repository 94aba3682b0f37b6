// SpiralPump - spiral pipe layout calculator with an LED animation preview

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use notify::{Config, Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::{Frame, Terminal};
use serde::Serialize;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

mod animation;
mod config;
mod params;
mod pipe;
mod quantities;
mod raster;
mod renderer;
mod scheduler;
mod spiral;
mod surface;
mod types;

use animation::{Animator, LedBuffer};
use config::{Args, SpiralConfig};
use params::{ParamField, Parameters, RecomputedOutputs};
use raster::ImageSurface;
use renderer::OverlayPlacement;
use scheduler::{FpsScheduler, FrameScheduler};
use surface::CanvasSurface;
use types::{ModeExitReason, Point2D, Rgb};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Virtual drawing surface size used for the terminal canvas
const TUI_SURFACE_SIZE: f64 = 200.0;

/// Slider steps per arrow key press (shift multiplies by 10)
const ARROW_STEPS: f64 = 10.0;

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    terminal.hide_cursor()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    terminal.show_cursor()?;
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    Ok(())
}

fn is_quit_key(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Pure black does not show on a dark terminal, draw it gray instead
fn terminal_color(color: Rgb) -> Color {
    if color.is_black() {
        Color::Rgb(90, 90, 90)
    } else {
        Color::Rgb(color.r, color.g, color.b)
    }
}

/// Paint a recorded surface into a ratatui canvas (device y points down, canvas y points up)
fn draw_surface(f: &mut Frame, area: Rect, surface: &CanvasSurface, title: &str) {
    let height = TUI_SURFACE_SIZE;
    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .marker(Marker::Braille)
        .x_bounds([0.0, TUI_SURFACE_SIZE])
        .y_bounds([0.0, TUI_SURFACE_SIZE])
        .paint(|ctx| {
            for line in &surface.lines {
                ctx.draw(&CanvasLine {
                    x1: line.from.0,
                    y1: height - line.from.1,
                    x2: line.to.0,
                    y2: height - line.to.1,
                    color: terminal_color(line.color),
                });
            }
            for shape in &surface.fills {
                let color = terminal_color(shape.color);
                for w in shape.outline.windows(2) {
                    ctx.draw(&CanvasLine {
                        x1: w[0].0,
                        y1: height - w[0].1,
                        x2: w[1].0,
                        y2: height - w[1].1,
                        color,
                    });
                }
            }
        });
    f.render_widget(canvas, area);
}

/// Everything the pipe view shows for one parameter set
struct PipeView {
    params: Parameters,
    outputs: RecomputedOutputs,
    surface: CanvasSurface,
    overlay: OverlayPlacement,
    show_points: bool,
}

impl PipeView {
    fn new(params: Parameters, show_points: bool) -> Self {
        let outputs = params.recompute();
        let mut view = PipeView {
            params,
            outputs,
            surface: CanvasSurface::new(TUI_SURFACE_SIZE, TUI_SURFACE_SIZE),
            overlay: OverlayPlacement { top: 0.0, height: 0.0 },
            show_points,
        };
        view.redraw();
        view
    }

    /// Replace the outputs wholesale and redraw
    fn update(&mut self, outputs: RecomputedOutputs) {
        self.outputs = outputs;
        self.redraw();
    }

    fn redraw(&mut self) {
        self.overlay = renderer::render_pipe_scene(
            &mut self.surface,
            self.params.radius,
            &self.outputs.points,
            &self.outputs.geometry,
            self.show_points,
        );
    }
}

fn run_pipe_mode(config: &SpiralConfig, config_change_tx: broadcast::Sender<()>) -> Result<ModeExitReason> {
    let mut terminal = setup_terminal()?;

    // Subscribe to config changes
    let mut config_change_rx = config_change_tx.subscribe();
    let mut current_config = config.clone();

    let mut view = PipeView::new(current_config.params(), current_config.show_points);
    let mut selected = ParamField::Radius;
    let mut entry = String::new();
    let mut status = String::from("Ready");

    loop {
        // Check for keyboard input
        if event::poll(Duration::from_millis(30))? {
            if let Event::Key(key) = event::read()? {
                if is_quit_key(&key) {
                    restore_terminal(&mut terminal)?;
                    return Ok(ModeExitReason::UserQuit);
                }

                let steps = if key.modifiers.contains(KeyModifiers::SHIFT) { ARROW_STEPS * 10.0 } else { ARROW_STEPS };
                match key.code {
                    KeyCode::Up | KeyCode::BackTab => {
                        selected = selected.prev();
                        entry.clear();
                    }
                    KeyCode::Down | KeyCode::Tab => {
                        selected = selected.next();
                        entry.clear();
                    }
                    KeyCode::Left => {
                        let outputs = view.params.nudge(selected, -steps);
                        view.update(outputs);
                    }
                    KeyCode::Right => {
                        let outputs = view.params.nudge(selected, steps);
                        view.update(outputs);
                    }
                    KeyCode::Char(c) if c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E') => {
                        entry.push(c);
                    }
                    KeyCode::Backspace => {
                        entry.pop();
                    }
                    KeyCode::Enter => {
                        match view.params.set_from_input(selected, &entry) {
                            Some(outputs) => {
                                view.update(outputs);
                                status = format!("{} set to {}", selected.spec().label, view.params.get(selected));
                            }
                            None => {
                                status = format!("Ignored invalid input '{}'", entry);
                            }
                        }
                        entry.clear();
                    }
                    KeyCode::Esc => entry.clear(),
                    KeyCode::Char('p') | KeyCode::Char('P') => {
                        view.show_points = !view.show_points;
                        view.redraw();
                    }
                    KeyCode::Char('s') | KeyCode::Char('S') => {
                        current_config.apply_params(&view.params);
                        current_config.show_points = view.show_points;
                        status = match current_config.save() {
                            Ok(()) => "Saved to config".to_string(),
                            Err(e) => format!("Save failed: {}", e),
                        };
                    }
                    _ => {}
                }
            }
        }

        // Check for config changes
        if let Ok(()) = config_change_rx.try_recv() {
            if let Ok(new_config) = SpiralConfig::load() {
                // Check if mode changed
                if new_config.mode != "pipe" {
                    restore_terminal(&mut terminal)?;
                    return Ok(ModeExitReason::ModeChanged);
                }

                if new_config.params() != view.params || new_config.show_points != view.show_points {
                    view = PipeView::new(new_config.params(), new_config.show_points);
                    status = "Reloaded config".to_string();
                }
                current_config = new_config;
            }
        }

        terminal.draw(|f| draw_pipe_ui(f, &view, selected, &entry, &status))?;
    }
}

fn draw_pipe_ui(f: &mut Frame, view: &PipeView, selected: ParamField, entry: &str, status: &str) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Header
            Constraint::Min(10),    // Main content
            Constraint::Length(3),  // Footer
        ])
        .split(f.size());

    let header = Paragraph::new(Line::from(vec![
        Span::styled("🌀 Spiral Pump", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(" | "),
        Span::styled("Pipe layout", Style::default().fg(Color::Yellow)),
        Span::raw("    "),
        Span::styled(
            "Up/Down select, Left/Right adjust, type + Enter to set, p points, s save, q quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(rows[1]);

    draw_surface(f, columns[0], &view.surface, "Pipe");

    let mut lines = vec![Line::from("")];
    for field in ParamField::ALL {
        let spec = field.spec();
        let is_selected = field == selected;
        let value = if is_selected && !entry.is_empty() {
            format!("{}_", entry)
        } else {
            format!("{:.3}", view.params.get(field))
        };
        let style = if is_selected {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {}: ", spec.label), style),
            Span::styled(value, style.add_modifier(Modifier::BOLD)),
        ]));
        lines.push(Line::from(Span::styled(
            format!("   range {} - {}, step {}", spec.min, spec.max, spec.step),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.push(Line::from(""));
    for (label, value) in view.outputs.display.rows() {
        lines.push(Line::from(vec![
            Span::raw(format!(" {}: ", label)),
            Span::styled(value.to_string(), Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(" People overlay: top {:.1}, height {:.1}", view.overlay.top, view.overlay.height),
        Style::default().fg(Color::DarkGray),
    )));

    let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Controls"));
    f.render_widget(panel, columns[1]);

    let footer = Paragraph::new(format!(
        "Samples: {} | Ribs: {} | Contour steps: {} | {}",
        view.outputs.point_count,
        view.outputs.geometry.ribs.len(),
        view.outputs.geometry.contour.len(),
        status
    ))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, rows[2]);
}

/// Geometry and animation state for the LED view
struct LedView {
    points: Vec<Point2D>,
    radius: f64,
    leds: LedBuffer,
    animator: Animator,
}

impl LedView {
    fn new(config: &SpiralConfig) -> Self {
        let led_params = config.led_params();
        LedView {
            points: spiral::sample(led_params.radius, led_params.coils, led_params.chord),
            radius: led_params.radius,
            leds: LedBuffer::new(config.total_leds),
            animator: Animator::new(config.animation(), config.coil_boundaries.clone(), config.water_fill_leds),
        }
    }
}

fn run_leds_mode(config: &SpiralConfig, config_change_tx: broadcast::Sender<()>) -> Result<ModeExitReason> {
    animation::validate_coils(&config.coil_boundaries, config.total_leds)?;

    let mut terminal = setup_terminal()?;

    let mut config_change_rx = config_change_tx.subscribe();
    let mut current_config = config.clone();

    let shutdown = Arc::new(AtomicBool::new(false));
    let mut scheduler = FpsScheduler::new(current_config.fps, shutdown.clone());
    let mut view = LedView::new(&current_config);
    let mut surface = CanvasSurface::new(TUI_SURFACE_SIZE, TUI_SURFACE_SIZE);
    let mut exit_reason = ModeExitReason::UserQuit;

    while scheduler.next_frame() {
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                if is_quit_key(&key) {
                    scheduler.stop();
                } else if let KeyCode::Char('a') | KeyCode::Char('A') = key.code {
                    let next = view.animator.mode.next();
                    view.animator.set_mode(next);
                    view.leds = LedBuffer::new(view.leds.len());
                }
            }
        }
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        // Check for config changes
        if let Ok(()) = config_change_rx.try_recv() {
            if let Ok(new_config) = SpiralConfig::load() {
                if new_config.mode != "leds" {
                    exit_reason = ModeExitReason::ModeChanged;
                    break;
                }
                if animation::validate_coils(&new_config.coil_boundaries, new_config.total_leds).is_ok() {
                    // Geometry is rebuilt wholesale; the running animation keeps its counters
                    let state = view.animator.state;
                    view = LedView::new(&new_config);
                    view.animator.state = state;
                }
                scheduler.set_fps(new_config.fps);
                current_config = new_config;
            }
        }

        view.animator.tick(&mut view.leds);
        renderer::render_led_scene(&mut surface, view.radius, &view.points, &view.leds);

        let status = format!(
            "Animation: {} | counter {} | cycle {} | LEDs: {} lit / {} | Points: {} | FPS: {:.0} | Frames: {}",
            view.animator.mode.name(),
            view.animator.state.counter,
            view.animator.state.cycle,
            view.leds.lit_count(),
            view.leds.len(),
            view.points.len(),
            current_config.fps,
            scheduler.frames()
        );
        terminal.draw(|f| {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(10), Constraint::Length(3)])
                .split(f.size());

            let header = Paragraph::new(Line::from(vec![
                Span::styled("💡 Spiral LEDs", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::raw(" | "),
                Span::styled(format!("Coils: {:?}", view.animator.coils()), Style::default().fg(Color::Yellow)),
                Span::raw("    "),
                Span::styled("a switch animation, q quit", Style::default().fg(Color::DarkGray)),
            ]))
            .block(Block::default().borders(Borders::ALL));
            f.render_widget(header, rows[0]);

            draw_surface(f, rows[1], &surface, "LED strip");

            let footer = Paragraph::new(status.clone()).block(Block::default().borders(Borders::ALL));
            f.render_widget(footer, rows[2]);
        })?;
    }

    restore_terminal(&mut terminal)?;
    Ok(exit_reason)
}

/// LED animation without a terminal UI, until Ctrl+C or the frame limit
fn run_headless(config: &SpiralConfig, frame_limit: Option<u64>, quiet: bool) -> Result<()> {
    animation::validate_coils(&config.coil_boundaries, config.total_leds)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_flag = shutdown.clone();
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::Relaxed))?;

    let mut view = LedView::new(config);
    let mut scheduler = FpsScheduler::new(config.fps, shutdown).with_frame_limit(frame_limit);
    let report_every = config.fps.round().max(1.0) as u64;

    if !quiet {
        println!(
            "Running {} on {} LEDs at {:.1} FPS ({} spiral points). Press Ctrl+C to stop.",
            view.animator.mode.name(),
            view.leds.len(),
            config.fps,
            view.points.len()
        );
    }

    let mut frame = 0u64;
    let frames = scheduler::run_animation_loop(&mut scheduler, &mut view.animator, &mut view.leds, |animator, leds| {
        frame += 1;
        if !quiet && frame % report_every == 0 {
            println!(
                "frame {:>8} | counter {:>3} | cycle {:>8} | lit {:>4}",
                frame,
                animator.state.counter,
                animator.state.cycle,
                leds.lit_count()
            );
        }
    });

    if !quiet {
        println!("Stopped after {} frames.", frames);
    }
    Ok(())
}

#[derive(Serialize)]
struct Report<'a> {
    parameters: &'a Parameters,
    results: &'a RecomputedOutputs,
    overlay: OverlayPlacement,
}

fn print_report(config: &SpiralConfig) -> Result<()> {
    let params = config.params();
    let outputs = params.recompute();
    let viewport = renderer::Viewport::fit(config.snapshot_width as f64, config.snapshot_height as f64, params.radius);
    let report = Report {
        parameters: &params,
        results: &outputs,
        overlay: OverlayPlacement::for_wheel(params.radius, &viewport),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn write_snapshot(config: &SpiralConfig, path: &Path, quiet: bool) -> Result<()> {
    let params = config.params();
    let outputs = params.recompute();

    let mut surface = ImageSurface::create_png(path, config.snapshot_width, config.snapshot_height, Rgb::new(255, 255, 255));
    let overlay = renderer::render_pipe_scene(
        &mut surface,
        params.radius,
        &outputs.points,
        &outputs.geometry,
        config.show_points,
    );
    surface
        .present()
        .with_context(|| format!("Failed to write snapshot {}", path.display()))?;

    if !quiet {
        println!("Snapshot written to {}", path.display());
        for (label, value) in outputs.display.rows() {
            println!("  {}: {}", label, value);
        }
        println!("  People overlay: top {:.1}px, height {:.1}px", overlay.top, overlay.height);
    }
    Ok(())
}

/// Watch the directory holding the config file so editors that save by
/// renaming a temp file are seen too. Only events for the config file itself
/// are forwarded. The returned watcher must stay alive for events to flow.
fn watch_config_file(config_path: &Path, config_change_tx: broadcast::Sender<()>) -> Result<RecommendedWatcher> {
    let watched_dir = config_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let file_name = config_path.file_name().map(|name| name.to_os_string());

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<NotifyEvent>| {
            let Ok(event) = res else {
                return;
            };
            if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                return;
            }
            let touches_config = event
                .paths
                .iter()
                .any(|p| p.file_name().map(|name| name.to_os_string()) == file_name);
            if touches_config {
                // No receiver while switching modes is fine; the next mode reloads anyway
                let _ = config_change_tx.send(());
            }
        },
        Config::default(),
    )
    .context("Failed to create config file watcher")?;

    watcher
        .watch(&watched_dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", watched_dir.display()))?;

    Ok(watcher)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set global config path immediately (before any config loads)
    SpiralConfig::set_config_path(args.cfg.clone());

    // Get config file path (custom or default)
    let cfg_arg = args.cfg.as_deref();
    let config_path = SpiralConfig::config_path(cfg_arg)?;
    let config_file_exists = config_path.exists();

    // Load existing config or create default, then merge with command line args
    let mut config = if config_file_exists {
        match SpiralConfig::load_with_path(cfg_arg) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("\n❌ Failed to load config file: {}", e);
                eprintln!("Config file: {}", config_path.display());
                eprintln!("\nPlease fix the config file or delete it to regenerate with defaults.");
                return Err(e);
            }
        }
    } else {
        let mut default_config = SpiralConfig::default();
        default_config.config_path = Some(config_path.clone());
        default_config
    };

    let args_provided = config.merge_with_args(&args);

    // One-shot outputs do not touch the config file
    if args.json {
        return print_report(&config);
    }
    if let Some(ref path) = args.snapshot {
        return write_snapshot(&config, path, args.quiet);
    }

    // Save config ONLY if it does not exist yet or command-line args were provided
    if !config_file_exists || args_provided {
        config.save()?;
    }

    if !args.quiet {
        println!("Using config file: {}", config_path.display());
    }

    if args.headless {
        return run_headless(&config, args.frames, args.quiet);
    }

    // Broadcast channel for config change notifications
    let (config_change_tx, _config_change_rx) = broadcast::channel(100);
    let _watcher = match watch_config_file(&config_path, config_change_tx.clone()) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            eprintln!("⚠️  Live config reload disabled: {:#}", e);
            None
        }
    };

    // Main mode switching loop - allows dynamic mode changes without restart
    loop {
        // Reload config to get latest mode setting
        let current_config = SpiralConfig::load().unwrap_or_else(|_| config.clone());

        let result = match current_config.mode.as_str() {
            "leds" => run_leds_mode(&current_config, config_change_tx.clone()),
            _ => run_pipe_mode(&current_config, config_change_tx.clone()),
        };

        match result {
            Ok(ModeExitReason::UserQuit) => break,
            Ok(ModeExitReason::ModeChanged) => {
                if !args.quiet {
                    println!("🔄 Mode changed, switching...");
                }
            }
            Err(e) => {
                eprintln!("\n❌ Mode '{}' failed: {}", current_config.mode, e);
                return Err(e);
            }
        }
    }

    Ok(())
}
