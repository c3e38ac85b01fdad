use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use pack_resolver::{PackCount, PackSizes};

#[derive(Parser)]
#[command(name = "pack-resolver")]
#[command(about = "Optimal pack combinations for an order", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the packs to ship for an order
    Calculate {
        /// Number of items ordered
        order: u32,
        /// Available pack sizes, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        packs: Vec<u32>,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the configuration signature of a set of pack sizes
    Signature {
        #[arg(short, long, value_delimiter = ',', required = true)]
        packs: Vec<u32>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateOutput {
    order_quantity: u32,
    total_items: u64,
    total_packs: u64,
    packs: Vec<PackCount>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Calculate { order, packs, json } => {
            let plan = pack_resolver::resolve(order, &packs)?;
            if json {
                let output = CalculateOutput {
                    order_quantity: order,
                    total_items: plan.total_items(),
                    total_packs: plan.total_packs(),
                    packs: plan.packs(),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("order quantity: {}", order);
                for pack in plan.iter() {
                    println!("{:>8} x {}", pack.size, pack.quantity);
                }
                println!("total items:    {}", plan.total_items());
                println!("total packs:    {}", plan.total_packs());
                println!("excess items:   {}", plan.excess_over(order));
            }
        }
        Commands::Signature { packs } => {
            let sizes = PackSizes::new(packs)?;
            println!("{}", pack_resolver::signature(&sizes));
        }
    }
    Ok(())
}
