//! Profiling binary for session execution
//!
//! Runs auto-judged sessions in a tight loop for profiling with
//! cargo-flamegraph. Unlike the Criterion benchmarks, this has minimal
//! overhead and produces cleaner flamegraphs.
//!
//! Usage:
//!   cargo flamegraph --bin profile
//!   PROFILE_ITERATIONS=5000 cargo flamegraph --bin profile

use classroom_gacha::{
    backend::MemoryBackend,
    game::{ClassSession, RandomJudge, SessionLogger, TurnLoop, VerbosityLevel},
    journal::Journal,
    loader::{demo_students, ClassData},
    Result,
};

fn main() -> Result<()> {
    let data = ClassData::new(demo_students(4));

    let iterations: u64 = std::env::var("PROFILE_ITERATIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);
    let turns: u32 = std::env::var("PROFILE_TURNS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(100);

    println!("Profiling session execution...");
    println!("Running {iterations} sessions of {turns} turns with seed 42");
    println!();

    let seed = 42u64;
    for i in 0..iterations {
        let backend = MemoryBackend::from_data(data.clone(), seed + i);
        let mut session = ClassSession::new(backend, seed + i)?
            .with_logger(SessionLogger::with_verbosity(VerbosityLevel::Silent))
            .with_journal(Journal::disabled());
        let mut judge = RandomJudge::with_seed(seed + i + 1);

        TurnLoop::new(&mut session).with_max_turns(turns).run(&mut judge)?;

        if (i + 1) % 100 == 0 {
            println!("Completed {} sessions", i + 1);
        }
    }

    println!();
    println!("Profiling complete! {iterations} sessions executed.");
    Ok(())
}
