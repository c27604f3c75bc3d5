use std::io;

use confq::format::FormatRegistry;

fn main() {
    confq::logging::init();

    let registry = FormatRegistry::builtin();
    let stdin = confq::stdin::piped();

    confq::cli::must_run(&registry, stdin, io::stdout().lock(), io::stderr());
}
