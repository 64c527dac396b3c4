use std::time::Duration;

use clap::Parser;

use supcon_rs::automaton::ComponentAutomaton;
use supcon_rs::bdd_oracle::{BddOracle, OracleConfig};
use supcon_rs::encoder::FixpointEncoder;
use supcon_rs::product::SynchronizedProduct;
use supcon_rs::query::QueryDriver;
use supcon_rs::synthesis::synthesize;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Abort once the BDD manager holds more nodes than this.
    #[clap(long, value_name = "INT")]
    max_nodes: Option<usize>,

    /// Abort once the oracle has been running for this long.
    #[clap(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Print the witness of every satisfiable cardinality pair.
    #[clap(long)]
    enumerate: bool,

    /// Log level.
    #[clap(long, value_name = "LEVEL", default_value = "warn")]
    log_level: simplelog::LevelFilter,
}

const CONTROLLABLE: [(&str, &str); 6] = [
    ("q0", "q6"),
    ("q0", "q9"),
    ("q1", "q3"),
    ("q3", "q4"),
    ("q6", "q7"),
    ("q7", "q3"),
];

const UNCONTROLLABLE: [(&str, &str); 8] = [
    ("q0", "q1"),
    ("q1", "q2"),
    ("q2", "q1"),
    ("q3", "q0"),
    ("q4", "q5"),
    ("q6", "q8"),
    ("q9", "q10"),
    ("q10", "q9"),
];

/// One plant, every edge with its own event.
fn plant() -> Result<SynchronizedProduct, supcon_rs::error::Error> {
    let mut g = ComponentAutomaton::new("G", "q0");
    for (source, target) in CONTROLLABLE {
        g.add_transition(source, target, true, &format!("{}{}", source, target))?;
    }
    for (source, target) in UNCONTROLLABLE {
        g.add_transition(source, target, false, &format!("{}{}", source, target))?;
    }
    g.mark_state("q3")?;
    g.mark_state("q4")?;
    g.set_unsafe("q5")?;
    g.set_unsafe("q8")?;
    println!("{}", g);
    Ok(SynchronizedProduct::new(vec![g]))
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        args.log_level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    println!("args = {:?}", args);

    let time_total = std::time::Instant::now();

    let product = plant()?;

    let mut oracle = BddOracle::new(OracleConfig {
        max_nodes: args.max_nodes,
        timeout: args.timeout_ms.map(Duration::from_millis),
        ..OracleConfig::default()
    });
    let encoding = FixpointEncoder::new(&product).encode(&mut oracle)?;
    let mut driver = QueryDriver::new(&mut oracle, &product, &encoding);

    let outcomes = driver.enumerate_by_cardinality(&[])?;
    for outcome in &outcomes {
        println!("{} for x={} c={}", outcome.verdict, outcome.retained, outcome.coreachable);
        if args.enumerate {
            if let Some(assignment) = outcome.verdict.assignment() {
                print!("{}", assignment);
            }
        }
    }
    let sat = outcomes.iter().filter(|o| o.verdict.is_sat()).count();
    println!("{} of {} cardinality pairs are satisfiable", sat, outcomes.len());
    println!("solutions: {}", driver.count_models()?);

    let supervisor = synthesize(&product);
    let names: Vec<&str> = supervisor
        .retained()
        .iter()
        .flat_map(|s| product.state_names(s))
        .collect();
    println!("explicit supervisor: {:?}", names);
    println!(
        "accepted by the equations: {}",
        driver.verify(&supervisor.to_assignment(&product))?
    );

    let time_total = time_total.elapsed();
    println!("\nAll done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
