use smooth_filter_bench::config::{Config, Invocation};
use std::env;
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = match Config::from_args(env::args_os()) {
        Invocation::Run(config) => config,
        Invocation::Usage(text) => {
            println!("{}", text.trim_end());
            return;
        }
    };

    match smooth_filter_bench::run(&config) {
        Ok(report) => print!("{}", report),
        Err(ref e) => {
            eprintln!("error: {}", e);

            for e in e.iter().skip(1) {
                eprintln!("caused by: {}", e);
            }

            if let Some(backtrace) = e.backtrace() {
                eprintln!("backtrace: {:?}", backtrace);
            }

            process::exit(1);
        }
    }
}
