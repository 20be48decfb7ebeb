use hyperspectra::image_plot::ImagePlot;
use hyperspectra::integrate::IntegrationMethod;
use hyperspectra::io::open_from_npz;
use hyperspectra::render::{render, save_png};
use hyperspectra::settings::{AppSettings, APP_INFO, PREFS_KEY};
use preferences::Preferences;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

const USAGE: &str = "usage: hyperspectra <data.npz> [output.png] \
    [--method simple|baseline|peak|peak-baseline] [--low L] [--high H]";

struct Arguments {
    input: PathBuf,
    output: Option<PathBuf>,
    method: Option<IntegrationMethod>,
    low: Option<f64>,
    high: Option<f64>,
}

fn parse_number(flag: &str, value: Option<&String>) -> Result<f64, String> {
    value
        .and_then(|v| v.parse::<f64>().ok())
        .ok_or_else(|| format!("{flag} expects a number\n{USAGE}"))
}

fn parse_args(args: &[String]) -> Result<Arguments, String> {
    let mut positional = vec![];
    let mut method = None;
    let mut low = None;
    let mut high = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--method" => {
                let flag = iter.next().map(|s| s.as_str()).unwrap_or_default();
                method = Some(
                    IntegrationMethod::from_flag(flag)
                        .ok_or_else(|| format!("unknown method '{flag}'\n{USAGE}"))?,
                );
            }
            "--low" => low = Some(parse_number("--low", iter.next())?),
            "--high" => high = Some(parse_number("--high", iter.next())?),
            other if other.starts_with("--") => {
                return Err(format!("unknown option '{other}'\n{USAGE}"));
            }
            other => positional.push(PathBuf::from(other)),
        }
    }

    let mut positional = positional.into_iter();
    let input = positional.next().ok_or_else(|| USAGE.to_string())?;
    let output = positional.next();
    if positional.next().is_some() {
        return Err(USAGE.to_string());
    }
    Ok(Arguments {
        input,
        output,
        method,
        low,
        high,
    })
}

fn load_settings() -> AppSettings {
    match AppSettings::load(&APP_INFO, PREFS_KEY) {
        Ok(settings) => settings,
        Err(err) => {
            log::info!("no stored settings ({err}), using defaults");
            let settings = AppSettings::new();
            // save default settings
            if let Err(err) = settings.save(&APP_INFO, PREFS_KEY) {
                log::error!("error in saving settings: {err:?}");
            }
            settings
        }
    }
}

fn default_output(input: &Path) -> PathBuf {
    input.with_file_name("image.png")
}

fn run(arguments: Arguments, settings: &mut AppSettings) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let data = open_from_npz(&arguments.input)?;
    log::debug!("reading took {:?}", start.elapsed());

    let mut plot = ImagePlot::new(settings.color, settings.integration);
    plot.restore_context(&settings.context);
    plot.set_data(Some(Arc::new(data)));
    if let Some(method) = arguments.method {
        plot.set_integration_method(method);
    }
    let integration = *plot.integration();
    if arguments.low.is_some() || arguments.high.is_some() {
        let window = plot.window();
        plot.set_limits(
            arguments.low.unwrap_or(window.low),
            arguments.high.unwrap_or(window.high),
        );
    }

    let start = Instant::now();
    let frame = plot.show_data()?;
    log::debug!("image computed in {:?}", start.elapsed());
    for warning in plot.warnings() {
        log::warn!("{warning}");
    }
    let Some(frame) = frame else {
        return Err("nothing to draw".into());
    };

    let output = arguments
        .output
        .unwrap_or_else(|| default_output(&arguments.input));
    let picture = render(&frame.composed.image, frame.levels, &frame.color_table);
    save_png(&picture, &output)?;
    log::info!(
        "{} x {} pixels, levels {} .. {}",
        frame.composed.x_axis.count,
        frame.composed.y_axis.count,
        frame.levels.low,
        frame.levels.high
    );

    // one-off limits given on the command line are not stored
    settings.integration.method = plot.integration().method;
    settings.integration.low_limit = integration.low_limit;
    settings.integration.high_limit = integration.high_limit;
    settings.color = plot.settings().color;
    settings.context = plot.context_settings().clone();
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        settings.output_dir = dir.to_path_buf();
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let arguments = match parse_args(&args) {
        Ok(arguments) => arguments,
        Err(msg) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
    };

    let mut settings = load_settings();
    let result = run(arguments, &mut settings);
    if let Err(err) = settings.save(&APP_INFO, PREFS_KEY) {
        log::error!("error in saving settings: {err:?}");
    }
    if let Err(err) = result {
        log::error!("{err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let parsed = parse_args(&args(&[
            "scan.npz",
            "--method",
            "peak-baseline",
            "out.png",
            "--low",
            "1000",
        ]))
        .unwrap();
        assert_eq!(parsed.input, PathBuf::from("scan.npz"));
        assert_eq!(parsed.output, Some(PathBuf::from("out.png")));
        assert_eq!(parsed.method, Some(IntegrationMethod::PeakBaseline));
        assert_eq!(parsed.low, Some(1000.0));
        assert_eq!(parsed.high, None);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["a.npz", "--method", "area"])).is_err());
        assert!(parse_args(&args(&["a.npz", "--low"])).is_err());
        assert!(parse_args(&args(&["a.npz", "b.png", "c.png"])).is_err());
        assert!(parse_args(&args(&["a.npz", "--verbose"])).is_err());
    }

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output(Path::new("/data/scan.npz")),
            PathBuf::from("/data/image.png")
        );
    }
}
