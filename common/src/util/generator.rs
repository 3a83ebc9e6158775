use crate::db::core::{Cell, Layout, Net, Pin, PinRef};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct GeneratorParams {
    pub cells: usize,
    pub nets: usize,
    pub die_width: f64,
    pub die_height: f64,
    pub cell_width: f64,
    pub cell_height: f64,
    /// Coordinates are snapped to this pitch so pins land on routing tracks.
    pub pitch: f64,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            cells: 40,
            nets: 30,
            die_width: 2000.0,
            die_height: 2000.0,
            cell_width: 60.0,
            cell_height: 40.0,
            pitch: 20.0,
        }
    }
}

/// Builds a random benchmark layout. The same seed always yields the same layout.
pub fn generate_random_layout(params: &GeneratorParams, seed: u64) -> Layout {
    let mut rng = StdRng::seed_from_u64(seed);

    let cols = ((params.die_width - params.cell_width) / params.pitch).floor().max(0.0) as i64;
    let rows = ((params.die_height - params.cell_height) / params.pitch).floor().max(0.0) as i64;

    log::info!(
        "Generating benchmark: {} cells, {} nets, die {:.0}x{:.0} (seed {})",
        params.cells,
        params.nets,
        params.die_width,
        params.die_height,
        seed
    );

    let mut cells: Vec<Cell> = Vec::with_capacity(params.cells);
    let mut attempts = 0;
    while cells.len() < params.cells && attempts < params.cells * 50 {
        attempts += 1;
        let x = rng.gen_range(0..=cols) as f64 * params.pitch;
        let y = rng.gen_range(0..=rows) as f64 * params.pitch;
        let candidate = Cell {
            id: format!("inst{}", cells.len()),
            name: "NAND2_X1".to_string(),
            x,
            y,
            width: params.cell_width,
            height: params.cell_height,
            pins: vec![
                Pin {
                    name: "A".to_string(),
                    x: 0.0,
                    y: 0.0,
                },
                Pin {
                    name: "ZN".to_string(),
                    x: params.cell_width,
                    y: params.cell_height,
                },
            ],
        };
        // Keep a one-pitch channel between cells.
        let halo = candidate.bounding_box().inflate(params.pitch);
        if cells.iter().any(|c| c.bounding_box().overlaps(&halo)) {
            continue;
        }
        cells.push(candidate);
    }

    if cells.len() < params.cells {
        log::warn!(
            "Die is too crowded: placed {} of {} requested cells",
            cells.len(),
            params.cells
        );
    }

    let mut nets = Vec::with_capacity(params.nets);
    if cells.len() >= 2 {
        for i in 0..params.nets {
            let src = rng.gen_range(0..cells.len());
            let mut dst = rng.gen_range(0..cells.len() - 1);
            if dst >= src {
                dst += 1;
            }
            nets.push(Net {
                id: format!("net{}", i),
                name: format!("net{}", i),
                source: PinRef::new(cells[src].id.clone(), "ZN"),
                target: PinRef::new(cells[dst].id.clone(), "A"),
                priority: rng.gen_range(0..4),
                width: 2.0,
                layer: None,
            });
        }
    }

    Layout {
        cells,
        nets,
        blockages: Vec::new(),
    }
}
