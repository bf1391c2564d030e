use anyhow::{Error, Result};
use clap::Parser;
use pollscope::{
    context::Context, processors::poll_stats::PollStatsReporter,
    processors::spin_report::SpinUsageReporter, trace::reader::TraceReader, CancelToken,
    EventProcessor, EventSource,
};

use pollscope::cli::*;

pub fn run<C: EventProcessor>(command: C, opts: &CLI, ctx: Context) -> Result<()> {
    let cancel = CancelToken::new();
    signal_hook::flag::register(signal_hook::consts::SIGINT, cancel.flag())?;

    TraceReader::new(opts.trace_dir()).process_events(command, &ctx, &cancel)?;

    Ok(())
}

fn main() -> Result<(), Error> {
    env_logger::init();

    let opts = CLI::parse();
    let ctx = Context::from(&opts);

    match &opts.command {
        PollscopeSubCommand::Polls { .. } => {
            let processor = PollStatsReporter::from(&ctx);

            run(processor, &opts, ctx)
        }
        PollscopeSubCommand::Spin { .. } => {
            let processor = SpinUsageReporter::from(&ctx);

            run(processor, &opts, ctx)
        }
    }
}
