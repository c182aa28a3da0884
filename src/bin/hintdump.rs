use anyhow::Context;
use clap::{ArgAction, Parser};
use hintbox::{
    ByteCursor, DecodeError, DecodeOptions, FourCC, HintBox, Registry, RtpHintSampleEntry,
    SampleDescription, SampleEntry, decode_box, decode_sample_entry, hint_registry,
    registry, sample_entry_registry,
    util::{hex_dump, read_slice},
};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};

#[derive(Parser, Debug)]
#[command(version, about = "Dump RTP hint-track sample descriptions")]
struct Args {
    /// File holding an `stsd` box or a single sample entry
    path: Option<String>,

    /// Byte offset of the box inside the file
    #[arg(long, default_value_t = 0)]
    offset: u64,

    /// Accept boxes whose children over- or under-run the declared size
    #[arg(long, action = ArgAction::SetTrue)]
    lenient: bool,

    /// Emit JSON instead of a human-readable tree
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Print the registered box types and exit
    #[arg(long, action = ArgAction::SetTrue)]
    list_registry: bool,

    /// Log decoder activity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Decoded {
    Description(SampleDescription),
    Entry(SampleEntry),
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .init();

    registry::init();

    if args.list_registry {
        print_registry("sample entries", sample_entry_registry());
        print_registry("hint track additional data", hint_registry());
        return Ok(());
    }

    let path = args.path.as_deref().context("no input file given")?;
    let opts = if args.lenient { DecodeOptions::lenient() } else { DecodeOptions::default() };

    let mut f = BufReader::new(File::open(path).with_context(|| format!("opening {path}"))?);
    f.seek(SeekFrom::Start(args.offset))?;
    let mut peek = [0u8; 8];
    f.read_exact(&mut peek).context("input too short for a box header")?;
    f.seek(SeekFrom::Start(args.offset))?;

    let result = {
        let mut cur = ByteCursor::with_offset(&mut f, args.offset);
        if FourCC([peek[4], peek[5], peek[6], peek[7]]) == FourCC::STSD {
            decode_box::<SampleDescription>(&mut cur, &opts).map(|(d, n)| (Decoded::Description(d), n))
        } else {
            decode_sample_entry(&mut cur, &opts).map(|(e, n)| (Decoded::Entry(e), n))
        }
    };

    let (decoded, consumed) = match result {
        Ok(v) => v,
        Err(e) => {
            report_failure(path, args.offset, &e)?;
            return Err(e.into());
        }
    };
    log::debug!("consumed {} bytes from offset {}", consumed, args.offset);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&decoded)?);
        return Ok(());
    }

    match &decoded {
        Decoded::Description(d) => {
            println!(
                "{:>10} stsd (ver={}, flags=0x{:06x}, entries={})",
                d.size,
                d.version,
                d.flags,
                d.entries.len()
            );
            for e in &d.entries {
                print_entry(e, 1);
            }
        }
        Decoded::Entry(e) => print_entry(e, 0),
    }
    Ok(())
}

fn print_registry<T>(title: &str, reg: &Registry<T>) {
    println!("{title}:");
    for tag in reg.tags() {
        println!("  {:<6} {}", format!("'{tag}'"), reg.label(&tag).unwrap_or(""));
    }
}

// ---------- Human-readable tree ----------

fn print_entry(e: &SampleEntry, depth: usize) {
    match e {
        SampleEntry::RtpHint(rtp) => print_rtp(rtp, depth),
    }
}

fn print_rtp(rtp: &RtpHintSampleEntry, depth: usize) {
    let indent = "  ".repeat(depth);
    println!(
        "{indent}{:>10} {} (data_ref={}, version={}, compatible={}, max_packet_size={})",
        rtp.size,
        FourCC::RTP,
        rtp.header.data_reference_index,
        rtp.hint_track_version,
        rtp.highest_compatible_version,
        rtp.max_packet_size
    );
    for b in &rtp.additional_boxes {
        print_hint_box(b, depth + 1);
    }
}

fn print_hint_box(b: &HintBox, depth: usize) {
    let indent = "  ".repeat(depth);
    let (value, trailing) = match b {
        HintBox::TimeScale(t) => (t.timescale.map(|v| format!("timescale={v}")), &t.trailing),
        HintBox::TimeOffset(t) => (t.offset.map(|v| format!("offset={v}")), &t.trailing),
        HintBox::SequenceOffset(s) => (s.offset.map(|v| format!("offset={v}")), &s.trailing),
    };
    let label = hint_registry().label(&b.tag()).unwrap_or("?");
    println!(
        "{indent}{:>10} {} [{label}] {}",
        b.size(),
        b.tag(),
        value.unwrap_or_else(|| "(empty)".to_string())
    );
    if !trailing.is_empty() {
        println!("{indent}        -> trailing {}", hex::encode(trailing));
    }
}

// ---------- Failure report ----------

fn report_failure(path: &str, start: u64, err: &DecodeError) -> anyhow::Result<()> {
    eprintln!("decode failed: {err}");
    let at = err.offset().unwrap_or(start);
    let from = at.saturating_sub(16).max(start);
    let mut f = File::open(path)?;
    let bytes = read_slice(&mut f, from, 32)?;
    eprint!("{}", hex_dump(&bytes, from, err.offset()));
    Ok(())
}
