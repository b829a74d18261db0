//! softcast: render RON scene files to PNG

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use softcast::error::RenderResult;
use softcast::export::save_png;
use softcast::scene::{demo_scene, load_scene, save_scene};

#[derive(Parser)]
#[command(name = "softcast", version, about = "Anti-aliased software ray caster")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a scene file to PNG
    Render {
        /// Input .ron scene file
        scene: PathBuf,
        /// Output .png path (default: scene's output_file, else the scene path with .png)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Write the built-in demo scene, then render it
    Demo {
        /// Output .ron scene file
        scene: PathBuf,
        /// Output .png path (default: the scene path with .png)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn output_path(scene_path: &Path, scene_output: Option<&Path>, cli_output: Option<PathBuf>) -> PathBuf {
    if let Some(p) = cli_output {
        return p;
    }
    match scene_output {
        Some(p) => scene_base_dir(scene_path).join(p),
        None => scene_path.with_extension("png"),
    }
}

fn scene_base_dir(scene_path: &Path) -> PathBuf {
    scene_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

fn render(scene_path: &Path, output: Option<PathBuf>) -> RenderResult<()> {
    let scene = load_scene(scene_path)?;
    let out = output_path(scene_path, scene.output_file.as_deref(), output);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!(
        "rendering {} at {}x{}",
        scene_path.display(),
        scene.image_size.0,
        scene.image_size.1
    ));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = scene.render(&scene_base_dir(scene_path));
    spinner.finish_and_clear();
    let image = result?;

    save_png(&image, &out)?;
    info!(
        "saved {} ({} samples, {} subdivisions, depth {})",
        out.display(),
        image.stats.samples,
        image.stats.subdivisions,
        image.stats.max_depth
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Render { scene, output } => render(&scene, output),
        Command::Demo { scene, output } => save_scene(&demo_scene(), &scene).and_then(|()| {
            println!("Saved demo scene to {}", scene.display());
            render(&scene, output)
        }),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
