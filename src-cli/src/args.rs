use std::path::PathBuf;

pub const USAGE: &str = "\
Usage: encore compare <generated> <reference> [options]
       encore decode <file>
       encore config [--reset]

Inputs ending in .json are read as previously decoded note sets.

Compare options:
  --out <dir>                 write report.json and decoded notes into <dir>
  --timing-tolerance <secs>   onset tolerance in seconds (default 0.1)
  --pitch-tolerance <n>       pitch tolerance in semitones (default 0)
  --require-notes             fail when either input decodes to no notes
  --json                      print the full report as JSON";

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Compare(CompareArgs),
    Decode { path: PathBuf },
    Config { reset: bool },
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct CompareArgs {
    pub generated: PathBuf,
    pub reference: PathBuf,
    pub out_dir: Option<PathBuf>,
    pub timing_tolerance: Option<f64>,
    pub pitch_tolerance: Option<u8>,
    pub require_notes: bool,
    pub json: bool,
}

/// Parses arguments after the program name.
pub fn parse_args(args: &[String]) -> Result<Command, String> {
    let (name, rest) = args.split_first().ok_or_else(|| "missing command".to_string())?;
    match name.as_str() {
        "compare" => parse_compare(rest).map(Command::Compare),
        "decode" => match rest {
            [path] => Ok(Command::Decode {
                path: PathBuf::from(path),
            }),
            _ => Err("decode takes exactly one file".to_string()),
        },
        "config" => match rest {
            [] => Ok(Command::Config { reset: false }),
            [flag] if flag == "--reset" => Ok(Command::Config { reset: true }),
            _ => Err("config takes only --reset".to_string()),
        },
        other => Err(format!("unknown command '{other}'")),
    }
}

fn parse_compare(args: &[String]) -> Result<CompareArgs, String> {
    let mut positional: Vec<PathBuf> = Vec::new();
    let mut parsed = CompareArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--out" => parsed.out_dir = Some(PathBuf::from(value(&mut iter, arg)?)),
            "--timing-tolerance" => {
                let raw = value(&mut iter, arg)?;
                let secs: f64 = raw
                    .parse()
                    .map_err(|_| format!("invalid --timing-tolerance '{raw}'"))?;
                parsed.timing_tolerance = Some(secs);
            }
            "--pitch-tolerance" => {
                let raw = value(&mut iter, arg)?;
                let semitones: u8 = raw
                    .parse()
                    .map_err(|_| format!("invalid --pitch-tolerance '{raw}'"))?;
                parsed.pitch_tolerance = Some(semitones);
            }
            "--require-notes" => parsed.require_notes = true,
            "--json" => parsed.json = true,
            flag if flag.starts_with("--") => return Err(format!("unknown option '{flag}'")),
            path => positional.push(PathBuf::from(path)),
        }
    }

    let [generated, reference]: [PathBuf; 2] = positional
        .try_into()
        .map_err(|_| "compare takes a generated and a reference file".to_string())?;
    parsed.generated = generated;
    parsed.reference = reference;
    Ok(parsed)
}

fn value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<&'a str, String> {
    iter.next()
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} needs a value"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn compare_with_options() {
        let command = parse_args(&args(&[
            "compare",
            "take.mid",
            "--timing-tolerance",
            "0.05",
            "score.mid",
            "--pitch-tolerance",
            "1",
            "--out",
            "report",
            "--json",
        ]))
        .unwrap();

        assert_eq!(
            command,
            Command::Compare(CompareArgs {
                generated: PathBuf::from("take.mid"),
                reference: PathBuf::from("score.mid"),
                out_dir: Some(PathBuf::from("report")),
                timing_tolerance: Some(0.05),
                pitch_tolerance: Some(1),
                require_notes: false,
                json: true,
            })
        );
    }

    #[test]
    fn compare_needs_two_files() {
        assert!(parse_args(&args(&["compare", "take.mid"])).is_err());
        assert!(parse_args(&args(&["compare", "a", "b", "c"])).is_err());
    }

    #[test]
    fn rejects_bad_values_and_unknown_input() {
        assert!(parse_args(&args(&["compare", "a", "b", "--pitch-tolerance", "-1"])).is_err());
        assert!(parse_args(&args(&["compare", "a", "b", "--out"])).is_err());
        assert!(parse_args(&args(&["compare", "a", "b", "--fast"])).is_err());
        assert!(parse_args(&args(&["play"])).is_err());
        assert!(parse_args(&[]).is_err());
    }

    #[test]
    fn decode_and_config() {
        assert_eq!(
            parse_args(&args(&["decode", "x.mid"])).unwrap(),
            Command::Decode {
                path: PathBuf::from("x.mid")
            }
        );
        assert_eq!(
            parse_args(&args(&["config", "--reset"])).unwrap(),
            Command::Config { reset: true }
        );
    }
}
