/*!
 * DriveHub - Demo Entry Point
 *
 * Builds a simulated host from a JSON manifest, constructs the device
 * registry and prints the drive table followed by the resolution of each
 * path given on the command line.
 *
 * Usage: drivehub <manifest.json> [path...]
 */

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::{info, warn};

use drivehub::{
    init_tracing, HostManifest, RegistryBuilder, RegistryConfig, Resolver, SimulatedHost,
    TokioExecutor,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let Some(manifest_path) = args.next() else {
        bail!("usage: drivehub <manifest.json> [path...]");
    };
    let paths: Vec<String> = args.collect();

    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("reading manifest {}", manifest_path))?;
    let manifest = HostManifest::from_json(&json)
        .with_context(|| format!("parsing manifest {}", manifest_path))?;
    let host = SimulatedHost::from_manifest(&manifest).context("building simulated host")?;

    let mut builder = RegistryBuilder::new(Arc::new(host))
        .with_config(RegistryConfig::from_env())
        .with_present_devices(
            manifest
                .present_devices
                .iter()
                .map(|d| (d.source, d.descriptor.clone())),
        );
    if let Some(executor) = TokioExecutor::current() {
        builder = builder.with_executor(executor);
    }

    let (registry, report) = builder.build();
    for warning in report.warnings() {
        warn!(%warning, "Startup warning");
    }

    println!(
        "{:<3} {:<40} {:<14} {:<20} {:<10} {}",
        "#", "ROOT", "TYPE", "NAME", "CONNECTED", "STABLE ID"
    );
    for (i, drive) in registry.drives().iter().enumerate() {
        println!(
            "{:<3} {:<40} {:<14} {:<20} {:<10} {}",
            i,
            drive.root_name(),
            drive.drive_type().to_string(),
            drive.friendly_name(),
            drive.is_connected(),
            drive.stable_id().unwrap_or_else(|| "-".into()),
        );
    }

    let resolver = Resolver::new(registry.clone());
    for path in &paths {
        match resolver.resolve_path(path) {
            Ok(resolved) => {
                let kind = if resolver.try_parse_folder(path).is_some() {
                    "folder"
                } else if resolver.try_parse_file(path).is_some() {
                    "file"
                } else {
                    "missing"
                };
                println!(
                    "{} -> {} ({})",
                    path,
                    resolved.drive.canonical_path(resolved.sub_path()),
                    kind
                );
            }
            Err(e) => println!("{} -> error: {}", path, e),
        }
    }

    registry.shutdown();
    info!("DriveHub demo finished");
    Ok(())
}
