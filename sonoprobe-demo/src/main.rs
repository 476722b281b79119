mod level;
mod profiling;
mod walk;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Walk demo by default, `--stress [sources]` for the timing run
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--stress" {
        let sources = match args.get(2) {
            Some(count) => count.parse()?,
            None => 64,
        };
        walk::run_stress(sources)
    } else {
        walk::run_walk()
    }
}
