use std::{
    env, fs,
    io::{self, Read},
    process,
};

use mailtext_core::{convert_html_bytes, ConvertOptions};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: mailtext [--charset NAME] [--fallback] [FILE|-]";

struct Args {
    charset: Option<String>,
    fallback: bool,
    input: Option<String>,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}\n{}", msg, USAGE);
            process::exit(2);
        }
    };

    let mut opts = ConvertOptions::load().unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        ConvertOptions::default()
    });
    if args.fallback {
        opts.force_fallback = true;
    }

    let bytes = match read_input(args.input.as_deref()) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to read input: {}", e);
            process::exit(1);
        }
    };
    let text = convert_html_bytes(&bytes, args.charset.as_deref(), &opts);
    println!("{}", text);
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args {
        charset: None,
        fallback: false,
        input: None,
    };
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--charset" => {
                let name = raw.next().ok_or("--charset needs a value")?;
                args.charset = Some(name);
            }
            "--fallback" => args.fallback = true,
            "-h" | "--help" => {
                println!("{}", USAGE);
                process::exit(0);
            }
            flag if flag.starts_with("--") => return Err(format!("unknown flag {}", flag)),
            _ if args.input.is_some() => return Err("more than one input".to_string()),
            _ => args.input = Some(arg),
        }
    }
    Ok(args)
}

fn read_input(path: Option<&str>) -> io::Result<Vec<u8>> {
    match path {
        None | Some("-") => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
        Some(path) => fs::read(path),
    }
}
