mod dump;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cluster_tracking::{
    Body, ClusterInfo, ClusterTracker, Domain, NeighborGrid, Observer, TrackerConfig,
    group_size_histogram,
};
use dump::{DumpFrame, DumpReader};
use itertools::Itertools;
use log::{debug, info};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// Track clusters of bonded atoms through the snapshots of a .dump file
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Dump file
    dump_file: PathBuf,

    /// Bond cutoff distance
    #[arg(short, long)]
    cutoff: f64,

    /// Observables "<name 1>,<name 2>,...", ex. "num_bodies,positions"
    #[arg(short, long, default_value = "num_bodies")]
    observables: String,

    /// Minimum number of atoms in a cluster
    #[arg(short, long, default_value_t = 2)]
    min_size: usize,

    /// Process only every n-th snapshot
    #[arg(short, long, default_value_t = 1)]
    every: usize,
}

fn to_bodies(frame: &DumpFrame, domain: &Domain<3>) -> Vec<Body<3>> {
    frame
        .coords
        .iter()
        .enumerate()
        .map(|(i, xyz)| Body::new(i, domain.wrap(&(*xyz).into())))
        .collect()
}

fn format_row(id: u64, info: &ClusterInfo<3>) -> String {
    let death = info
        .death_frame()
        .map_or("-".to_string(), |d| d.to_string());
    let lifetime = info.lifetime().map_or("-".to_string(), |l| l.to_string());
    let gained: usize = info.monomer_gain_data().iter().map(|e| e.count).sum();
    let lost: usize = info.monomer_loss_data().iter().map(|e| e.count).sum();
    [
        id.to_string(),
        info.birth_frame().to_string(),
        death,
        lifetime,
        info.data().len().to_string(),
        gained.to_string(),
        lost.to_string(),
    ]
    .into_iter()
    .map(|s| format!("{s:>10}"))
    .join("\t")
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let observer = Observer::from_names(cli.observables.split(','))?;
    let mut tracker = ClusterTracker::<3>::new(TrackerConfig {
        min_cluster_size: cli.min_size,
        observer,
    })?;
    let file = File::open(&cli.dump_file).context(format!(
        "Failed to read .dump file: {}",
        cli.dump_file.to_string_lossy()
    ))?;

    let mut grid_slot: Option<NeighborGrid<3>> = None;
    let mut atom_ids: Option<Vec<u64>> = None;
    for frame in DumpReader::new(BufReader::new(file)).step_by(cli.every.max(1)) {
        let frame = frame?;
        let ids = atom_ids.get_or_insert_with(|| frame.ids.clone());
        if *ids != frame.ids {
            bail!("Atom ids of timestep {} differ from the first snapshot", frame.step);
        }
        let domain = Domain::new(frame.lim, frame.periodic)?;
        let mut grid = match grid_slot.take() {
            Some(grid) if *grid.domain() == domain => grid,
            _ => NeighborGrid::new(domain.clone(), cli.cutoff)?,
        };
        let bodies = to_bodies(&frame, &domain);
        let summary = tracker
            .track_frame(&mut grid, frame.step, bodies, |_, _| true)
            .context(format!("Failed to process timestep {}", frame.step))?;
        grid_slot = Some(grid);
        info!(
            "timestep {}: {} clusters, monomer fraction {:.4}",
            summary.frame, summary.clusters, summary.monomer_fraction
        );
        if let Some(current) = tracker.current_frame() {
            let groups = current
                .clusters()
                .iter()
                .map(|c| c.body_ids().to_vec())
                .collect::<Vec<_>>();
            let (sizes, largest) = group_size_histogram(&groups);
            debug!("timestep {}: sizes {sizes:?}, largest {largest}", frame.step);
        }
    }

    let table = tracker
        .infos()
        .iter()
        .map(|(id, info)| format_row(id.0, info))
        .join("\n");
    println!("# id birth death lifetime observations gained lost\n{table}");
    Ok(())
}
