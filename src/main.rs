use access_map::app::App;
use access_map::config::Cli;
use access_map::data::model::Year;
use access_map::data::Dataset;
use access_map::map::Layer;
use access_map::{format, ui};
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, &cli.log_file)?;

    let options = cli.view_options();
    let data = Dataset::load(&cli.data_dir, options.year, options.rwi_cutoff)
        .with_context(|| format!("loading data from {}", cli.data_dir.display()))?;

    if cli.report {
        print_report(&data, options.year);
        return Ok(());
    }

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let size = terminal.size()?;
    let mut app = App::new(data, &options, size.width, size.height);
    let result = run(&mut terminal, &mut app);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(e) = &result {
        error!(error = %e, "event loop failed");
    }
    result
}

/// Log to a file: the terminal belongs to the map while it runs.
/// `RUST_LOG` overrides the level chosen by `-v`.
fn setup_logging(verbosity: u8, path: &Path) -> Result<()> {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let fmt_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(false);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();
    info!(level = %level, "logging initialised");
    Ok(())
}

/// Country rollup table on stdout
fn print_report(data: &Dataset, year: Year) {
    println!(
        "{:<5} {:<32} {:>9} {:>9} {:>12} {:>9}",
        "ISO", "Country", "Districts", "Access", "Without", "Low RWI"
    );
    for c in &data.countries {
        println!(
            "{:<5} {:<32} {:>9} {:>9} {:>12} {:>9}",
            c.country_id,
            c.name.chars().take(32).collect::<String>(),
            c.districts,
            format::pct(c.pct_access(year)),
            format::people(c.no_access(year)),
            format::pct(c.low_rwi.pct_access(year)),
        );
    }
    println!(
        "{:<5} {:<32} {:>9} {:>9} {:>12} {:>9}",
        "",
        format!("World ({})", year.get()),
        data.countries.iter().map(|c| c.districts).sum::<usize>(),
        format::pct(data.world.pct_access(year)),
        format::people(data.world.no_access(year)),
        format::pct(data.world_low_rwi.pct_access(year)),
    );
}

/// Handle mouse events for hover, selection, panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Always track the cursor for the tooltip
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click selects, click and drag pans
        MouseEventKind::Down(MouseButton::Left) => app.mouse_down(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.mouse_up(mouse.column, mouse.row),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                    // Pan with hjkl or arrow keys
                    KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                    KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                    KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                    KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                    // Zoom
                    KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                    KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                    // Layers
                    KeyCode::Char(c @ '1'..='3') => {
                        if let Some(layer) = c.to_digit(10).and_then(|n| Layer::from_number(n as u8)) {
                            app.set_layer(layer);
                        }
                    }
                    KeyCode::Tab => app.next_layer(),

                    // Year slider
                    KeyCode::Char('<') | KeyCode::Char(',') => app.set_year(app.year().prev()),
                    KeyCode::Char('>') | KeyCode::Char('.') => app.set_year(app.year().next()),

                    // Highlight slider and wealth cutoff
                    KeyCode::Char('[') => app.adjust_threshold(-5.0),
                    KeyCode::Char(']') => app.adjust_threshold(5.0),
                    KeyCode::Char('(') => app.set_rwi_cutoff(app.data.rwi_cutoff - 0.1),
                    KeyCode::Char(')') => app.set_rwi_cutoff(app.data.rwi_cutoff + 0.1),

                    // Toggles
                    KeyCode::Char('p') | KeyCode::Char('P') => app.toggle_projects(),
                    KeyCode::Char('L') => app.toggle_labels(),
                    KeyCode::Char('o') | KeyCode::Char('O') => app.toggle_outlines(),

                    // Back to the global view
                    KeyCode::Backspace | KeyCode::Char('r') | KeyCode::Char('0') => {
                        app.clear_selection()
                    }

                    _ => {}
                },
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
