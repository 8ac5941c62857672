#![forbid(unsafe_code)]

#[cfg(unix)]
fn main() {
    ttyctx::cli::init_logging();
    if let Err(error) = ttyctx::cli::run_from_env() {
        eprintln!("ttyctx: {error}");
        std::process::exit(1);
    }
}

#[cfg(not(unix))]
fn main() {
    eprintln!("ttyctx: a Unix terminal is required");
    std::process::exit(1);
}
