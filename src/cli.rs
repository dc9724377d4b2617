use std::{path::PathBuf, sync::LazyLock};

use clap::{Args, Parser, Subcommand};

use crate::{syscall_object::DecodeConfig, utilities::parse_hex};

pub static INSIGHT_ARGS: LazyLock<InsightArgs> = LazyLock::new(InsightArgs::parse);

#[derive(Parser, Debug)]
#[command(
    about = "decode syscall arguments down to the memory and files behind them",
    version,
    subcommand_required = true
)]
pub struct InsightArgs {
    /// write the report to a file instead of stderr (disables colors)
    #[arg(short = 'o', long = "output", global = true)]
    pub output: Option<PathBuf>,

    /// dump at most this many bytes of each buffer
    #[arg(long = "buffer-limit", global = true)]
    pub buffer_limit: Option<u64>,

    /// read at most this many bytes of each string
    #[arg(long = "string-limit", default_value_t = 256, global = true)]
    pub string_limit: usize,

    /// never append the memory mapping table
    #[arg(long = "no-memory-map", global = true)]
    pub no_memory_map: bool,

    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Mode {
    /// decode one syscall of a running process from its register values
    Decode(DecodeArgs),
    /// decode every syscall a command or process makes
    Trace(TraceArgs),
}

#[derive(Args, Debug, PartialEq)]
pub struct DecodeArgs {
    /// process the syscall was made by
    #[arg(short = 'p', long)]
    pub pid: i32,

    /// syscall number
    #[arg(long)]
    pub nr: u64,

    #[arg(long, value_parser = parse_hex)]
    pub rdi: Option<u64>,
    #[arg(long, value_parser = parse_hex)]
    pub rsi: Option<u64>,
    #[arg(long, value_parser = parse_hex)]
    pub rdx: Option<u64>,
    #[arg(long, value_parser = parse_hex)]
    pub r10: Option<u64>,
    #[arg(long, value_parser = parse_hex)]
    pub r8: Option<u64>,
    #[arg(long, value_parser = parse_hex)]
    pub r9: Option<u64>,

    /// address space root, the pid is used when omitted
    #[arg(long, value_parser = parse_hex)]
    pub cr3: Option<u64>,
}

impl DecodeArgs {
    /// Registers in argument order, as the binder expects them.
    pub fn registers(&self) -> [Option<String>; 6] {
        [self.rdi, self.rsi, self.rdx, self.r10, self.r8, self.r9]
            .map(|register| register.map(|value| format!("{value:x}")))
    }
}

#[derive(Args, Debug, PartialEq)]
pub struct TraceArgs {
    /// attach to an already running process
    #[arg(short = 'p', long = "attach", conflicts_with = "command")]
    pub pid: Option<i32>,

    /// command to run and trace
    #[arg(last = true, required_unless_present = "pid")]
    pub command: Vec<String>,
}

impl InsightArgs {
    pub fn decode_config(&self) -> DecodeConfig {
        DecodeConfig {
            buffer_limit: self.buffer_limit,
            string_limit: self.string_limit,
            memory_map: !self.no_memory_map,
            page_size: *crate::utilities::PAGE_SIZE,
        }
    }
}
