use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    queue,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal,
};
use std::fmt::Write as _;
use std::io::{self, BufWriter, Write};
use std::time::{Duration, Instant};

use cogwave::demo::{phase_styles, DemoScene, WORLD_DEPTH, WORLD_WIDTH};
use cogwave::{
    AsciiLuminancePalette, CellBuffer, CognitiveColorRamp, EmitterManager, FrameInput,
    Heightfield, OrbitRig, PhaseBlend, Rasterizer, SurfaceLighting,
};

mod terminal_setup;
use terminal_setup::{cleanup_terminal, enter_terminal, install_panic_hook};

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Parser)]
#[command(name = "cogwave", version, about = "Cognitive waveform terminal renderer")]
struct Cli {
    #[arg(long, default_value_t = 7, help = "Scene seed")]
    seed: u64,
    #[arg(long, default_value_t = 56, value_name = "N", help = "Heightfield grid resolution")]
    grid: usize,
    #[arg(long, default_value_t = 30, help = "Frame rate cap")]
    fps: u32,
    #[arg(long, help = "Disable transient emitter effects")]
    no_effects: bool,
    #[arg(long, help = "Render characters only, no color codes")]
    ascii_only: bool,
    #[arg(long, help = "Disable the per-phase palette blend")]
    flat: bool,
    #[arg(long, value_name = "SECONDS", help = "Exit after this many seconds")]
    duration: Option<f32>,
}

struct App {
    scene: DemoScene,
    field: Heightfield,
    emitters: EmitterManager,
    rig: OrbitRig,
    rasterizer: Rasterizer,
    lighting: SurfaceLighting,
    palette: AsciiLuminancePalette,
    ramp: CognitiveColorRamp,
    status_buf: String,
    fps_estimate: f32,
}

fn blit(cells: &CellBuffer, color: bool, stdout: &mut impl Write) -> io::Result<()> {
    let mut last_fg: Option<u8> = None;
    let mut last_bg: Option<Option<u8>> = None;
    let mut last_bold = false;

    for row in 0..cells.height() {
        queue!(stdout, cursor::MoveTo(0, row as u16))?;
        for cell in cells.row(row) {
            if cell.bold != last_bold {
                let attr = if cell.bold {
                    Attribute::Bold
                } else {
                    Attribute::NormalIntensity
                };
                queue!(stdout, SetAttribute(attr))?;
                last_bold = cell.bold;
            }
            if color {
                if last_fg != Some(cell.fg) {
                    queue!(stdout, SetForegroundColor(Color::AnsiValue(cell.fg)))?;
                    last_fg = Some(cell.fg);
                }
                if last_bg != Some(cell.bg) {
                    match cell.bg {
                        Some(bg) => queue!(stdout, SetBackgroundColor(Color::AnsiValue(bg)))?,
                        None => queue!(stdout, SetBackgroundColor(Color::Reset))?,
                    }
                    last_bg = Some(cell.bg);
                }
            }
            queue!(stdout, Print(cell.ch))?;
        }
    }
    queue!(stdout, SetAttribute(Attribute::NormalIntensity))?;
    Ok(())
}

fn truncate_and_pad(text: &mut String, width: usize) {
    let mut seen = 0usize;
    let mut cut = None;
    for (idx, _) in text.char_indices() {
        if seen == width {
            cut = Some(idx);
            break;
        }
        seen += 1;
    }
    if let Some(idx) = cut {
        text.truncate(idx);
    } else {
        for _ in seen..width {
            text.push(' ');
        }
    }
}

fn draw_status(app: &mut App, cols: u16, rows: u16, stdout: &mut impl Write) -> io::Result<()> {
    let status = &mut app.status_buf;
    status.clear();
    write!(
        status,
        "FPS:{:>5.1}  Entities:{}  Effects:{}  Grid:{}x{}  t:{:>6.1}s  Q/Esc:Quit",
        app.fps_estimate,
        app.scene.entities.len(),
        app.emitters.len(),
        app.field.grid_width(),
        app.field.grid_depth(),
        app.scene.time(),
    )
    .map_err(|_| io::Error::other("failed to format status row"))?;
    truncate_and_pad(status, cols as usize);

    queue!(
        stdout,
        cursor::MoveTo(0, rows.saturating_sub(1)),
        SetBackgroundColor(Color::AnsiValue(16)),
        SetForegroundColor(Color::AnsiValue(250)),
        Print(status.as_str())
    )
}

/// Drain pending input; true means quit.
fn process_input() -> AppResult<bool> {
    while event::poll(Duration::ZERO)? {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(true)
                }
                _ => {}
            }
        }
    }
    Ok(false)
}

fn run(app: &mut App, cli: &Cli, stdout: &mut BufWriter<io::Stdout>) -> AppResult<()> {
    let frame_target = Duration::from_secs_f32(1.0 / cli.fps.max(1) as f32);
    let styles = phase_styles();
    let mut last_frame = Instant::now();

    loop {
        let frame_start = Instant::now();
        if process_input()? {
            break;
        }
        if let Some(limit) = cli.duration {
            if app.scene.time() >= limit {
                break;
            }
        }

        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f32().clamp(1e-6, 0.25);
        last_frame = now;

        app.scene.advance(dt, &mut app.emitters);
        app.emitters.update(dt);
        app.field.update(
            &app.scene.density,
            &app.scene.entities,
            &app.scene.connections,
            dt,
        );
        let camera = app.rig.advance(dt);

        let (cols, rows) = terminal::size()?;
        let cols = cols.max(2);
        let rows = rows.max(2);
        // Bottom row is the status line.
        app.rasterizer.resize(cols as usize, rows as usize - 1);

        let blend = (!cli.flat).then_some(PhaseBlend {
            styles: &styles,
            influence_radius: 4.5,
        });
        let cells = app.rasterizer.render(&FrameInput {
            field: &app.field,
            camera: &camera,
            lighting: &app.lighting,
            palette: &app.palette,
            ramp: &app.ramp,
            emitters: &app.emitters,
            entities: &app.scene.entities,
            blend,
        });
        blit(cells, !cli.ascii_only, stdout)?;
        draw_status(app, cols, rows, stdout)?;
        queue!(stdout, ResetColor)?;
        stdout.flush()?;

        let instant_fps = 1.0 / dt;
        app.fps_estimate = if app.fps_estimate <= 0.01 {
            instant_fps
        } else {
            0.9 * app.fps_estimate + 0.1 * instant_fps
        };

        let spent = frame_start.elapsed();
        if spent < frame_target {
            std::thread::sleep(frame_target - spent);
        }
    }

    Ok(())
}

fn main() -> AppResult<()> {
    install_panic_hook();
    let cli = Cli::parse();

    let grid = cli.grid.clamp(8, 256);
    let field = Heightfield::new(grid, grid, WORLD_WIDTH, WORLD_DEPTH);
    let rig = OrbitRig::new(field.center(), 16.0, 11.0);

    let mut app = App {
        scene: DemoScene::new(cli.seed, !cli.no_effects),
        field,
        emitters: EmitterManager::new(),
        rig,
        rasterizer: Rasterizer::new(80, 40),
        lighting: SurfaceLighting::default(),
        palette: AsciiLuminancePalette::default(),
        ramp: CognitiveColorRamp::new("base", vec![238, 240, 243, 246, 250, 254, 231]),
        status_buf: String::with_capacity(256),
        fps_estimate: 0.0,
    };

    let mut stdout = BufWriter::with_capacity(1024 * 1024, io::stdout());
    enter_terminal(&mut stdout)?;
    let run_result = run(&mut app, &cli, &mut stdout);
    let cleanup_result = cleanup_terminal(&mut stdout);
    run_result?;
    cleanup_result
}
