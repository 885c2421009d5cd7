//! train_metrics demos
//!
//! ```bash
//! # One worker: a synthetic epoch reported through log_every
//! cargo run --release -- single
//!
//! # Four thread workers over a LocalGroup, synchronised at the end
//! cargo run --release -- multi-worker
//! ```

mod multi_worker;
mod single;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        let result = match args[1].as_str() {
            "single" => single::run(),
            "multi-worker" => multi_worker::run(),
            _ => {
                println!("Unknown demo: {}", args[1]);
                println!();
                print_usage();
                return;
            }
        };
        if let Err(err) = result {
            eprintln!("demo failed: {err}");
            std::process::exit(1);
        }
    } else {
        print_usage();
    }
}

fn print_usage() {
    println!("Usage: cargo run --release -- <demo>");
    println!();
    println!("  single          Synthetic epoch on one worker");
    println!("                  Loss tensors on the NdArray backend, top-1/top-5 accuracy");
    println!();
    println!("  multi-worker    4 thread workers sharing a LocalGroup");
    println!("                  Progress printed by rank 0, global averages after sync");
    println!();
}
