use std::time::Duration;

use clap::Parser;

use supcon_rs::automaton::ComponentAutomaton;
use supcon_rs::bdd_oracle::{BddOracle, OracleConfig};
use supcon_rs::encoder::FixpointEncoder;
use supcon_rs::oracle::Oracle;
use supcon_rs::product::SynchronizedProduct;
use supcon_rs::query::{QueryDriver, Verdict};
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

    /// Also enumerate exact cardinalities of retained and co-reachable atoms.
    #[clap(long)]
    enumerate: bool,

    /// Log level.
    #[clap(long, value_name = "LEVEL", default_value = "info")]
    log_level: simplelog::LevelFilter,
}

/// Two machines synchronized on `alpha`, `beta` and `theta`.
fn plant() -> Result<SynchronizedProduct, supcon_rs::error::Error> {
    let mut k1 = ComponentAutomaton::new("K1", "q0");
    k1.add_transition("q0", "q1", true, "alpha")?;
    k1.add_transition("q1", "q2", false, "beta")?;
    k1.add_transition("q1", "q2", false, "theta")?;
    k1.add_transition("q2", "q0", true, "alpha")?;
    k1.add_transition("q1", "q3", true, "a")?;
    k1.add_transition("q3", "q4", false, "b")?;
    k1.add_transition("q4", "q3", false, "c")?;
    k1.add_transition("q4", "q5", false, "beta")?;
    k1.add_transition("q5", "q0", true, "alpha")?;
    k1.mark_state("q2")?;
    k1.mark_state("q5")?;

    let mut k2 = ComponentAutomaton::new("K2", "p0");
    k2.add_transition("p0", "p1", true, "alpha")?;
    k2.add_transition("p1", "p2", false, "beta")?;
    k2.add_transition("p1", "p2", false, "theta")?;
    k2.add_transition("p2", "p0", true, "alpha")?;
    k2.add_transition("p1", "p3", true, "f")?;
    k2.add_transition("p3", "p4", false, "g")?;
    k2.add_transition("p4", "p3", false, "h")?;
    k2.add_transition("p4", "p5", false, "theta")?;
    k2.add_transition("p5", "p0", true, "alpha")?;
    k2.mark_state("p2")?;
    k2.mark_state("p5")?;

    println!("{}", k1);
    println!("{}", k2);
    Ok(SynchronizedProduct::new(vec![k1, k2]))
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
    println!(
        "product: {} global states, actions {:?}",
        product.size(),
        product.global_alphabet()
    );

    let mut oracle = BddOracle::new(OracleConfig {
        max_nodes: args.max_nodes,
        timeout: args.timeout_ms.map(Duration::from_millis),
        ..OracleConfig::default()
    });
    let encoding = FixpointEncoder::new(&product).encode(&mut oracle)?;
    println!("asserted {} equations", encoding.num_constraints());

    let mut driver = QueryDriver::new(&mut oracle, &product, &encoding);

    let initial = product.initial();
    match driver.is_controllable_from(&initial)? {
        Verdict::Satisfiable(assignment) => {
            println!("initial state {} can be retained:", initial);
            print!("{}", assignment);
        }
        Verdict::Unsatisfiable => println!("initial state {} must be excluded", initial),
    }

    match driver.excludes(&initial)? {
        Verdict::Satisfiable(assignment) => {
            println!("a solution excluding {} retains {} local states", initial, assignment.retained_count());
        }
        Verdict::Unsatisfiable => println!("every solution retains {}", initial),
    }

    if args.enumerate {
        let x0 = driver.retained(&initial)?;
        for outcome in driver.enumerate_by_cardinality(&[x0])? {
            if let Some(assignment) = outcome.verdict.assignment() {
                println!("SAT for x={} c={}", outcome.retained, outcome.coreachable);
                print!("{}", assignment);
            }
        }
    }

    let supervisor = synthesize(&product);
    println!(
        "explicit supervisor retains {} of {} global states ({} rounds)",
        supervisor.len(),
        product.size(),
        supervisor.iterations()
    );
    for state in supervisor.retained() {
        println!("  {} = {:?}", state, product.state_names(state));
    }
    let accepted = driver.verify(&supervisor.to_assignment(&product))?;
    println!("projection accepted by the equations: {}", accepted);

    let bdd = driver.oracle().bdd();
    let (hits, misses) = bdd.cache_stats();
    println!("bdd: {} nodes, cache hits {} misses {}", bdd.num_nodes(), hits, misses);
    println!("oracle: {} atoms", driver.oracle().num_atoms());
    println!("depth after queries: {}", driver.oracle().depth());

    let time_total = time_total.elapsed();
    println!("\nAll done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
