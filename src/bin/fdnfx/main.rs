//! fdnfx - play or render the effect engines
//!
//! ```text
//! fdnfx play <effect> [NAME=VALUE ...]
//! fdnfx ir <effect> <out.wav> [seconds] [NAME=VALUE ...]
//! ```
//!
//! While `play` runs, type `NAME VALUE` and press enter to change a
//! parameter, `reset` to clear the tail, or `quit`.

mod app;
mod impulse;

use app::Player;
use color_eyre::eyre::{bail, eyre, Result as EyreResult, WrapErr};
use fdnfx::EffectKind;

const USAGE: &str = "usage:
  fdnfx play <effect> [NAME=VALUE ...]
  fdnfx ir <effect> <out.wav> [seconds] [NAME=VALUE ...]

effects: cathedral, raindrop, shift";

fn main() -> EyreResult<()> {
    color_eyre::install()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    match command.as_str() {
        "play" => {
            let kind = effect_arg(&args)?;
            let settings = parse_settings(kind, &args[2..])?;
            Player::new(kind).settings(settings).bpm(120.0).run()
        }
        "ir" => {
            let kind = effect_arg(&args)?;
            let path = args.get(2).ok_or_else(|| eyre!("missing output path\n\n{}", USAGE))?;
            let mut rest = &args[3..];
            let mut seconds = None;
            if let Some(first) = rest.first() {
                if let Ok(value) = first.parse::<f32>() {
                    seconds = Some(value);
                    rest = &rest[1..];
                }
            }
            let settings = parse_settings(kind, rest)?;
            impulse::render_to_wav(kind, &settings, path, seconds)
        }
        "-h" | "--help" | "help" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => bail!("unknown command `{}`\n\n{}", other, USAGE),
    }
}

fn effect_arg(args: &[String]) -> EyreResult<EffectKind> {
    let name = args.get(1).ok_or_else(|| eyre!("missing effect name\n\n{}", USAGE))?;
    name.parse::<EffectKind>()
        .wrap_err_with(|| format!("`{}` is not an effect", name))
}

/// Parse `NAME=VALUE` pairs into parameter ids for `kind`.
fn parse_settings(kind: EffectKind, args: &[String]) -> EyreResult<Vec<(u8, i32)>> {
    let descriptor = kind.descriptor();
    args.iter()
        .map(|arg| {
            let (name, value) = arg
                .split_once('=')
                .ok_or_else(|| eyre!("expected NAME=VALUE, got `{}`", arg))?;
            let id = descriptor
                .find(name)
                .ok_or_else(|| eyre!("{} has no parameter {}", kind, name))?;
            let value = value
                .parse::<i32>()
                .wrap_err_with(|| format!("bad value for {}", name))?;
            Ok((id, value))
        })
        .collect()
}
