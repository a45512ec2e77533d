mod args;
mod error;
mod serve;

use clap::Parser as _;

fn main() {
    human_panic::setup_panic!();
    let result = run();
    proc_exit::exit(result);
}

fn run() -> proc_exit::ExitResult {
    let args = args::Args::parse();

    args.color.write_global();
    let colored_stderr = !matches!(
        anstream::AutoStream::choice(&std::io::stderr()),
        anstream::ColorChoice::Never
    );
    args::init_logging(&args.verbose, colored_stderr);

    args.to_config()
        .and_then(|config| serve::run(&config))
        .map_err(|err| proc_exit::Code::FAILURE.with_message(format!("{err:#}")))
}
