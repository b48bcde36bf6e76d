use market_data::{tape_line, TapeCursor};
use simulation::harness::{ExchangeSim, SimConfig};

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = match args.next() {
        Some(arg) => arg.parse()?,
        None => 42,
    };
    let rounds: usize = match args.next() {
        Some(arg) => arg.parse()?,
        None => 50,
    };

    let config = SimConfig {
        seed,
        rounds,
        ..SimConfig::default()
    };
    tracing::info!(
        members = config.members,
        instruments = config.instruments,
        rounds,
        seed,
        "starting exchange simulation"
    );

    let mut sim = ExchangeSim::new(config);
    let mut cursor = TapeCursor::new();

    println!(" count ticker   price   change change%  seller->buyer");
    for _ in 0..rounds {
        sim.step();
        let head = sim.replicas()[0].snapshot();
        let poll = cursor.poll(head);
        if poll.missed > 0 {
            tracing::warn!(missed = poll.missed, "tape cursor fell behind the trade ring");
        }
        for record in &poll.records {
            println!("{}", tape_line(head, record));
        }
    }

    let report = sim.report()?;
    println!();
    for quote in &report.quotes {
        println!("{quote}");
    }
    println!();
    for summary in &report.summaries {
        println!("{summary}");
    }
    println!();
    println!("{}", serde_json::to_string_pretty(&report)?);

    tracing::info!(
        trades = report.trades,
        converged = report.converged,
        ordered = report.transactions_ordered,
        "simulation finished"
    );
    Ok(())
}
