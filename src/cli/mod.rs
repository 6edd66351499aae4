use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "dynarray-check")]
#[command(version, about = "Conformance runner for DynamicArray against std Vec", long_about = None)]
pub struct Cli {
    /// Number of random operations in the differential run
    #[arg(long, default_value_t = 10_000)]
    pub ops: usize,

    /// Seed for the differential run (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Run only the scenario with this name
    #[arg(long, value_name = "NAME")]
    pub scenario: Option<String>,

    /// Set verbose level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log filter implied by `-v`; `RUST_LOG` takes precedence when set.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
