//! Renders scene described in JSON format into a PNG image
use std::{
    env,
    fs::File,
    io::{BufReader, BufWriter},
};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};
use vecraster::*;

type Error = Box<dyn std::error::Error>;

#[derive(Debug)]
struct Args {
    input_file: String,
    output_file: String,
    size: OutputSize,
    options: RenderOptions,
}

impl Args {
    fn parse() -> Result<Args, Error> {
        let mut result = Args {
            input_file: String::new(),
            output_file: String::new(),
            size: OutputSize::default(),
            options: RenderOptions::default(),
        };
        let mut positional = 0;
        let mut args = env::args();
        let cmd = args.next().unwrap_or_else(|| "scene2png".to_string());
        while let Some(arg) = args.next() {
            match arg.as_ref() {
                "--help" => {
                    positional = 0;
                    break;
                }
                "-w" => {
                    let width = args.next().ok_or("-w requires argument")?;
                    result.size = OutputSize::Width(width.parse()?);
                }
                "-h" => {
                    let height = args.next().ok_or("-h requires argument")?;
                    result.size = OutputSize::Height(height.parse()?);
                }
                "-s" => {
                    let scale = args.next().ok_or("-s requires argument")?;
                    result.size = OutputSize::Scale(scale.parse()?);
                }
                "-f" => {
                    let flatness = args.next().ok_or("-f requires argument")?;
                    result.options.flatness = flatness.parse()?;
                }
                "-bg" => {
                    let bg: RGBA = args
                        .next()
                        .ok_or("-bg requires color #rrggbb(aa) argument")?
                        .parse()?;
                    result.options.background.replace(bg);
                }
                _ => {
                    positional += 1;
                    match positional {
                        1 => result.input_file = arg,
                        2 => result.output_file = arg,
                        _ => return Err("unexpected positional argument".into()),
                    }
                }
            }
        }
        if positional < 1 {
            eprintln!("Renders scene described in JSON format into a PNG image");
            eprintln!("\nUSAGE:");
            eprintln!(
                "    {} [-w <width> | -h <height> | -s <scale>] [-f <flatness>] [-bg <color>] <scene.json> [<out.png>]",
                cmd
            );
            eprintln!("\nARGS:");
            eprintln!("    -w <width>         width in pixels, height keeps aspect ratio");
            eprintln!("    -h <height>        height in pixels, width keeps aspect ratio");
            eprintln!("    -s <scale>         uniform scale of the scene size");
            eprintln!(
                "    -f <flatness>      flatness used by rasterizer (default: {})",
                DEFAULT_FLATNESS
            );
            eprintln!("    -bg <color>        background color");
            eprintln!("    <scene.json>       file containing the scene");
            eprintln!("    <out.png>          output image (default: <scene.json>.png)");
            std::process::exit(1);
        }
        if result.output_file.is_empty() {
            result.output_file = format!("{}.png", result.input_file);
        }
        Ok(result)
    }
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse()?;

    let scene = tracing::debug_span!("[parse]").in_scope(|| -> Result<Scene, Error> {
        let file = BufReader::new(File::open(&args.input_file)?);
        Ok(Scene::from_reader(file)?)
    })?;
    tracing::debug!("[scene:size] {}x{}", scene.width, scene.height);

    let image = rasterize_with(&scene, args.size, &args.options)?;

    let save = tracing::debug_span!("[save]", file = %args.output_file);
    let _guard = save.enter();
    let image_file = BufWriter::new(File::create(&args.output_file)?);
    image.write_png(image_file)?;

    Ok(())
}
