use anyhow::{Context, Result, anyhow, bail};
use std::io::BufRead;

const HEADER_TIMESTEP: &str = "ITEM: TIMESTEP";
const HEADER_NUM_OF_ATOMS: &str = "ITEM: NUMBER OF ATOMS";
const HEADER_BOX_BOUNDS: &str = "ITEM: BOX BOUNDS";
const HEADER_ATOMS: &str = "ITEM: ATOMS";

/// One snapshot of a LAMMPS text dump, atoms sorted by id.
#[derive(Debug, Clone, PartialEq)]
pub struct DumpFrame {
    pub step: u64,
    pub lim: [[f64; 2]; 3],
    pub periodic: [bool; 3],
    pub ids: Vec<u64>,
    pub coords: Vec<[f64; 3]>,
}

/// Streams snapshots out of a dump one at a time.
pub struct DumpReader<B: BufRead> {
    lines: std::io::Lines<B>,
}

impl<B: BufRead> DumpReader<B> {
    pub fn new(input: B) -> Self {
        Self {
            lines: input.lines(),
        }
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        self.lines.next().transpose().context("Reading dump line")
    }

    fn expect_line(&mut self, what: &str) -> Result<String> {
        self.next_line()?
            .ok_or_else(|| anyhow!("Unexpected end of dump, expected {what}"))
    }

    fn expect_header(&mut self, header: &str) -> Result<String> {
        let line = self.expect_line(header)?;
        match line.split_at_checked(header.len()) {
            Some((h, rest)) if h == header => Ok(rest.trim().to_string()),
            _ => bail!("Expected '{header}', got '{line}'"),
        }
    }

    fn read_frame(&mut self, first: String) -> Result<DumpFrame> {
        if first.trim() != HEADER_TIMESTEP {
            bail!("Expected '{HEADER_TIMESTEP}', got '{first}'");
        }
        let step = self
            .expect_line("timestep")?
            .trim()
            .parse::<u64>()
            .context("Invalid timestep")?;
        self.expect_header(HEADER_NUM_OF_ATOMS)?;
        let atoms_count = self
            .expect_line("number of atoms")?
            .trim()
            .parse::<usize>()
            .context("Invalid number of atoms")?;

        let flags = self.expect_header(HEADER_BOX_BOUNDS)?;
        let flags = flags.split_whitespace().collect::<Vec<_>>();
        let flags = match flags.as_slice() {
            [x, y, z, ..] => [*x, *y, *z],
            _ => bail!("Box bounds need three boundary flags, got {flags:?}"),
        };
        let mut lim = [[0.0; 2]; 3];
        for bounds in lim.iter_mut() {
            let line = self.expect_line("box bounds")?;
            let values = line
                .split_whitespace()
                .take(2)
                .map(str::parse::<f64>)
                .collect::<Result<Vec<_>, _>>()
                .context(format!("Invalid box bounds: '{line}'"))?;
            if values.len() != 2 {
                bail!("Invalid box bounds: '{line}'");
            }
            *bounds = [values[0], values[1]];
        }

        let keys = self.expect_header(HEADER_ATOMS)?;
        let keys = keys.split_whitespace().collect::<Vec<_>>();
        let column = |key: &str| {
            keys.iter()
                .position(|k| *k == key)
                .ok_or_else(|| anyhow!("Dump has no '{key}' column"))
        };
        let [id_j, x_j, y_j, z_j] = [column("id")?, column("x")?, column("y")?, column("z")?];

        let mut atoms = Vec::with_capacity(atoms_count);
        for _ in 0..atoms_count {
            let line = self.expect_line("atom row")?;
            let values = line
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<Result<Vec<_>, _>>()
                .context(format!("Invalid atom row: '{line}'"))?;
            if values.len() != keys.len() {
                bail!("Atom row has {} values for {} keys", values.len(), keys.len());
            }
            atoms.push((values[id_j] as u64, [values[x_j], values[y_j], values[z_j]]));
        }
        atoms.sort_by_key(|(id, _)| *id);

        Ok(DumpFrame {
            step,
            lim,
            periodic: flags.map(|f| f == "pp"),
            ids: atoms.iter().map(|(id, _)| *id).collect(),
            coords: atoms.into_iter().map(|(_, xyz)| xyz).collect(),
        })
    }
}

impl<B: BufRead> Iterator for DumpReader<B> {
    type Item = Result<DumpFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = loop {
            match self.next_line() {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => break line,
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            }
        };
        Some(self.read_frame(first))
    }
}
