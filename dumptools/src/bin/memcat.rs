use dumptools::ConcatCommand;

fn main() {
    if let Err(err) = argh::from_env::<ConcatCommand>().init() {
        eprintln!("\n\x1b[31m error: {err} \x1b[0m");
        std::process::exit(1)
    }
}
