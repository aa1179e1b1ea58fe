mod cli;

use clap::Parser;

use sitestack::aws::AwsProvider;
use sitestack::deploy::{apply, Providers};
use sitestack::{Exports, Result, StackConfig, StaticWebsite};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sitestack=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = StackConfig::load(&cli.dir, &cli.stack)?;
    let default_provider = AwsProvider::new(&config.region).await;
    let site = StaticWebsite::build(&config, &default_provider).await?;

    match cli.command {
        Commands::Preview => {
            println!("Stack {} ({})", config.stack, config.target_domain);
            for planned in site.plan.order()? {
                println!("  {:<45} {} [{}]", planned.logical_id, planned.resource.type_string(), planned.binding);
                let properties = serde_json::to_string_pretty(&planned.resource.properties()?)?;
                for line in properties.lines() {
                    println!("      {line}");
                }
            }
            println!("Waves:");
            for (i, wave) in site.plan.waves()?.iter().enumerate() {
                println!("  {}: {}", i + 1, wave.join(", "));
            }
            println!("Outputs:");
            for (name, value) in site.plan.outputs() {
                println!("  {name}: {value}");
            }
        }
        Commands::Manifest { out } => {
            let manifest = serde_json::to_string_pretty(&site.plan.to_manifest()?)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, manifest)?;
                    tracing::info!(path = ?path, "wrote manifest");
                }
                None => println!("{manifest}"),
            }
        }
        Commands::Up { json } => {
            let mut providers = Providers::new();
            for (name, binding) in site.plan.bindings() {
                providers.insert(name, AwsProvider::new(&binding.region).await);
            }
            let state = apply(&site.plan, &providers).await?;
            let exports = Exports::resolve(&site.plan, &state)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&exports.to_json())?);
            } else {
                print!("{exports}");
            }
        }
    }
    Ok(())
}
