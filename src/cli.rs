use crate::{Options, ParseOutcome, StreamingParser, recover_all, recover_fast, recovery_stats};
use std::env;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};

fn print_help(program: &str) {
    eprintln!(
        "Usage: {prog} [OPTIONS] [INPUT]\n\
         \n\
         Feeds INPUT (or stdin) chunk-wise through the streaming parser and\n\
         prints one JSON text per completed or recovered value.\n\
         \n\
         Options:\n\
           -o, --output FILE     Write output to FILE (default stdout)\n\
               --chunk-size BYTES  Ingest chunk size (default 4096)\n\
               --exhaustive      Use the full recovery ladder on every chunk\n\
               --no-salvage      Disable flat key-value salvage fallback\n\
               --stats           Print recovery strategy and delimiter stats to stderr\n\
               --pretty          Pretty-print emitted values\n\
           -h, --help            Show this help\n",
        prog = program
    );
}

struct CliMode {
    input: Option<String>,
    output: Option<String>,
    chunk_size: usize,
    stats: bool,
    pretty: bool,
}

fn parse_args() -> (Options, CliMode) {
    let mut args: Vec<String> = env::args().collect();
    let program = args
        .first()
        .cloned()
        .unwrap_or_else(|| "uistream".to_string());
    args.remove(0);

    let mut opts = Options::default();
    let mut input: Option<String> = None;
    let mut output: Option<String> = None;
    let mut chunk_size: usize = 4096;
    let mut stats = false;
    let mut pretty = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help(&program);
                std::process::exit(0);
            }
            "-o" | "--output" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Missing FILE for --output");
                    std::process::exit(2);
                }
                output = Some(args[i].clone());
            }
            "--chunk-size" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Missing BYTES for --chunk-size");
                    std::process::exit(2);
                }
                chunk_size = args[i].parse().unwrap_or(4096);
            }
            "--exhaustive" => {
                opts.exhaustive_recovery = true;
            }
            "--no-salvage" => {
                opts.salvage_fallback = false;
            }
            "--stats" => {
                stats = true;
            }
            "--pretty" => {
                pretty = true;
            }
            s if s.starts_with('-') => {
                eprintln!("Unknown option: {}", s);
                std::process::exit(2);
            }
            path => {
                input = Some(path.to_string());
            }
        }
        i += 1;
    }

    let mode = CliMode {
        input,
        output,
        chunk_size: chunk_size.max(1),
        stats,
        pretty,
    };
    (opts, mode)
}

fn emit(value: &serde_json::Value, pretty: bool, out: &mut dyn Write) -> io::Result<()> {
    let s = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    out.write_all(s.as_bytes())?;
    out.write_all(b"\n")
}

fn report_recovery(opts: &Options, buffer: &str, strategy: &str) {
    // Re-run the same ordering on the current buffer to get the recovered
    // text for the delimiter diff. Diagnostic only, off the hot path.
    let res = if opts.exhaustive_recovery {
        recover_all(buffer, opts)
    } else {
        recover_fast(buffer, opts)
    };
    if let Some(recovered) = res.recovered {
        let st = recovery_stats(buffer, &recovered);
        eprintln!(
            "recovered via {}: +{} braces, +{} brackets, +{} quotes, -{} commas",
            strategy, st.braces_added, st.brackets_added, st.quotes_added, st.commas_removed
        );
    } else {
        eprintln!("recovered via {}", strategy);
    }
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (opts, mode) = parse_args();

    let mut out_writer: Box<dyn Write> = if let Some(ref o) = mode.output {
        Box::new(BufWriter::new(File::create(o)?))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    let mut reader: Box<dyn Read> = match mode.input {
        Some(ref path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin()),
    };

    let mut parser = StreamingParser::new(opts.clone());
    let mut buf = vec![0u8; mode.chunk_size];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        let chunk = std::str::from_utf8(&buf[..n]).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "input is not valid UTF-8")
        })?;
        match parser.ingest(chunk) {
            ParseOutcome::Complete { value } => emit(&value, mode.pretty, &mut out_writer)?,
            ParseOutcome::Recovered { strategy, .. } => {
                if mode.stats {
                    report_recovery(&opts, parser.buffer(), strategy);
                }
            }
            ParseOutcome::Pending => {}
        }
    }
    if let Some(value) = parser.finish()? {
        emit(&value, mode.pretty, &mut out_writer)?;
    }
    out_writer.flush()?;
    Ok(())
}
