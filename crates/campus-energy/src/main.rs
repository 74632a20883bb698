mod bootstrap;

use anyhow::Result;
use energy_core::settings::Settings;
use energy_data::analysis::run_pipeline;
use energy_data::dataset::LoadOutcome;
use energy_export::export::export_all;

fn main() -> Result<()> {
    let settings = Settings::load()?;
    let config = settings.to_pipeline_config()?;

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Campus Energy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Data: {}, output: {}, extension: .{}",
        config.data_dir.display(),
        config.output_dir.display(),
        config.extension
    );

    let report = match run_pipeline(&config) {
        Ok(report) => report,
        Err(LoadOutcome::NoUsableRows { files_found, failed }) => {
            tracing::warn!(
                "None of the {} files contributed rows ({} failed to load); nothing to report",
                files_found,
                failed.len()
            );
            return Ok(());
        }
        // No input was already reported by the loader.
        Err(_) => return Ok(()),
    };

    tracing::info!("Merged all building data successfully.");

    if config.export {
        let files = export_all(&report, &config.output_dir)?;
        tracing::debug!("Wrote {}", files.summary.display());
    }

    println!("{}", report.building_reports().join("\n"));

    Ok(())
}
