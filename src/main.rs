use bank_etl::adapters::source::page_source_from_config;
use bank_etl::domain::model::format_decimal;
use bank_etl::utils::error::ErrorSeverity;
use bank_etl::utils::{logger, validation::Validate};
use bank_etl::{CliArgs, EtlEngine, FileProgressLog, RunConfig, RunReport};
use clap::Parser;

const PREVIEW_ROWS: usize = 5;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting bank-etl");

    let config = match args.resolve_config().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };
    tracing::debug!("Run config: {:?}", config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        print_plan(&config)?;
        return Ok(());
    }

    let source = page_source_from_config(&config.source);
    let log = FileProgressLog::new(config.logging.log_file.clone());
    let engine = EtlEngine::new(source, log, config);

    match engine.run().await {
        Ok(report) => {
            print_report(&report);
            tracing::info!("✅ ETL process completed successfully!");
            println!(
                "✅ {} bank(s) saved to {} and table {}",
                report.dataset.len(),
                engine.config().load.output_csv.display(),
                engine.config().load.table_name
            );
        }
        Err(e) => {
            tracing::error!(
                "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn print_plan(config: &RunConfig) -> anyhow::Result<()> {
    println!("{}", config.plan_summary());
    println!("\nEffective configuration:\n{}", config.to_toml_string()?);
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("Extracted data:");
    for record in report.extracted.records.iter().take(PREVIEW_ROWS) {
        println!(
            "  {:<40} {}",
            record.name,
            format_decimal(record.market_cap_usd_millions)
        );
    }
    if report.extracted.skipped > 0 {
        println!("  ({} malformed row(s) skipped)", report.extracted.skipped);
    }

    println!("\nTransformed data:");
    println!("  {}", report.dataset.columns().join(" | "));
    for record in report.dataset.records.iter().take(PREVIEW_ROWS) {
        let amounts: Vec<String> = record
            .converted
            .iter()
            .map(|(_, amount)| format_decimal(*amount))
            .collect();
        println!(
            "  {} | {} | {}",
            record.name,
            format_decimal(record.usd_billion),
            amounts.join(" | ")
        );
    }

    for result in &report.queries {
        println!("\nQuery result:\n{}", result.statement);
        print!("{}", result);
    }
}
