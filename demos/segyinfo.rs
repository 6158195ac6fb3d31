use clap::{self, Parser};
use segyio;

#[derive(clap::Parser)]
struct Cmd {
    /// SEG-Y file to read
    file: String,
    /// Print the textual header(s)
    #[arg(short, long)]
    text: bool,
    /// Print the binary header as JSON
    #[arg(short = 'j', long)]
    json: bool,
    /// Print the headers of the first N traces
    #[arg(short = 'n', long, default_value_t = 0)]
    traces: u64,
    /// Scan the whole file for the amplitude range
    #[arg(short, long)]
    amplitude: bool,
}

fn main() {
    let _ = env_logger::builder().try_init();
    let cmd = Cmd::parse();
    let mut store = segyio::SegyFile::open(&cmd.file).expect("Cannot open file");
    println!(
        "{}: {:?} {}, {} traces of {} samples",
        cmd.file,
        store.byte_order(),
        store.sample_format(),
        store.trace_count(),
        store.samples_per_trace()
    );
    if cmd.text {
        for header in store.text_headers() {
            println!("{header}");
        }
    }
    if cmd.json {
        let json = serde_json::to_string_pretty(store.binary_header()).expect("encode error");
        println!("{json}");
    }
    if cmd.traces > 0 {
        for header in store
            .read_trace_headers(0, cmd.traces)
            .expect("read error")
        {
            println!("{header:?}");
        }
    }
    if cmd.amplitude {
        match store.amplitude_range(None).expect("read error") {
            Some((min, max)) => println!("amplitude range: [{min}, {max}]"),
            None => println!("amplitude range: file holds no traces"),
        }
    }
}
